//! Client for the GeoIP database update service.
//!
//! The service is polled with the MD5 digest of the installed database. It
//! either answers that no update is available or sends a gzip-compressed
//! replacement; the digest of each received payload is sent back until the
//! service says no further rounds remain. The final payload is published by
//! writing a staging file and renaming it over the database.
//!
//! ```ignore
//! use geoip_update::{Credential, HttpTransport, ProductId, Updater};
//!
//! # async fn demo() -> geoip_update::Result<()> {
//! let transport = HttpTransport::builder().build()?;
//! let updater = Updater::new(
//!     transport,
//!     Credential::new("999999", "000000000000"),
//!     "/usr/local/var/GeoIP",
//! );
//!
//! let identity = updater.client_identity().await?;
//! let report = updater
//!     .update_all(&identity, &ProductId::parse_list("506,533,517"))
//!     .await;
//! println!("{} updated, {} failed", report.updated(), report.failed());
//! # Ok(())
//! # }
//! ```

mod challenge;
mod digest;
mod error;
mod identity;
mod publish;
mod session;
mod transport;
mod updater;

pub use challenge::compute_challenge;
pub use digest::ContentDigest;
pub use error::{ErrorKind, Result, UpdateError};
pub use identity::{ClientIdentity, Credential, ProductId};
pub use publish::{publish, staging_path};
pub use reqwest::Url;
pub use session::{
    Completion, RoundBudget, ServerReply, SessionState, UpdateSession, GZIP_MAGIC, MAX_ROUNDS,
    NO_UPDATE_MARKER,
};
pub use transport::{
    HttpTransport, HttpTransportBuilder, RawResponse, Transport, DEFAULT_BASE_URL,
};
pub use updater::{
    ProductOutcome, ProductReport, RunReport, Updater, FILENAME_PATH, IP_ADDRESS_PATH, UPDATE_PATH,
};
