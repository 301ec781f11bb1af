//! geoipupdate
//!
//! Brings the GeoIP database files in a directory up to date from the update
//! service, then optionally creates the legacy symlinks.

mod cli;
mod jitter;
mod links;

use anyhow::Context;
use clap::Parser;
use cli::Args;
use geoip_update::{Credential, HttpTransport, ProductId, Updater};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging; RUST_LOG takes precedence over --debug
    let default_filter = if args.debug {
        "debug,geoip_update=debug"
    } else {
        "info,geoip_update=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt().with_env_filter(filter).init();

    if let Some(max) = args.random_delay {
        jitter::wait(max).await;
    }

    let base_url = args.base_url()?;
    tracing::info!(
        "Updating geoip database at {} from {} via {}",
        args.directory.display(),
        args.source,
        args.protocol
    );

    let transport = HttpTransport::builder()
        .base_url(base_url)
        .timeout(args.timeout)
        .build()?;
    let credential = Credential::new(args.user_id.as_str(), args.license_key.as_str());
    let updater = Updater::new(transport, credential, &args.directory);

    let identity = updater
        .client_identity()
        .await
        .context("Can't get client IP")?;

    let products = ProductId::parse_list(&args.product_ids);
    let report = updater.update_all(&identity, &products).await;

    if args.links {
        links::create_legacy_links(&args.directory);
    }

    tracing::info!(
        "Done: {} updated, {} up to date, {} failed",
        report.updated(),
        report.up_to_date(),
        report.failed()
    );

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} products failed to update",
            report.failed(),
            report.entries.len()
        );
    }
    Ok(())
}
