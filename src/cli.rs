use clap::{Parser, ValueEnum};
use geoip_update::Url;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the updater
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Source host for updates
    #[arg(long, env = "GEOIPUPDATE_SOURCE", default_value = "updates.maxmind.com")]
    pub source: String,

    /// Protocol for updates
    #[arg(long, env = "GEOIPUPDATE_PROTOCOL", value_enum, default_value_t = Protocol::Https)]
    pub protocol: Protocol,

    /// Directory holding the database files
    #[arg(long, env = "GEOIPUPDATE_DIRECTORY", default_value = "/usr/local/var/GeoIP")]
    pub directory: PathBuf,

    /// Account (user) id
    #[arg(long = "userid", env = "GEOIPUPDATE_USER_ID", default_value = "999999")]
    pub user_id: String,

    /// License key
    #[arg(
        long = "licensekey",
        env = "GEOIPUPDATE_LICENSE_KEY",
        default_value = "000000000000",
        hide_env_values = true
    )]
    pub license_key: String,

    /// Create legacy symlinks (GeoIPCity.dat, GeoIP.dat)
    #[arg(long, env = "GEOIPUPDATE_LINKS", default_value_t = true, action = clap::ArgAction::Set)]
    pub links: bool,

    /// Comma delimited product ids
    #[arg(long = "productids", env = "GEOIPUPDATE_PRODUCT_IDS", default_value = "506,533,517")]
    pub product_ids: String,

    /// Wait for a random time period up to this amount before starting (e.g. 1h30m)
    #[arg(long = "randomdelay", env = "GEOIPUPDATE_RANDOM_DELAY", value_parser = parse_duration)]
    pub random_delay: Option<Duration>,

    /// Per-request timeout
    #[arg(long, env = "GEOIPUPDATE_TIMEOUT", default_value = "300s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,
}

impl Args {
    /// `<protocol>://<source>/`
    pub fn base_url(&self) -> anyhow::Result<Url> {
        let raw = format!("{}://{}/", self.protocol, self.source);
        Url::parse(&raw).map_err(|e| anyhow::anyhow!("invalid update source {}: {}", raw, e))
    }
}

/// Transport protocol for the update service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => f.write_str("http"),
            Protocol::Https => f.write_str("https"),
        }
    }
}

/// Parse a duration such as `90s`, `1h30m`, `250ms` or `1.5h`.
///
/// Supported units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. A bare `0` is
/// accepted without a unit.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return Err(format!("invalid duration: {}", s));
        }
        let value: f64 = rest[..num_len]
            .parse()
            .map_err(|_| format!("invalid duration: {}", s))?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_nanos = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("missing unit in duration: {}", s)),
            unit => return Err(format!("unknown unit {:?} in duration: {}", unit, s)),
        };
        nanos += (value * unit_nanos).round();
        rest = &rest[unit_len..];
    }

    if nanos >= u64::MAX as f64 {
        return Err(format!("duration out of range: {}", s));
    }
    Ok(Duration::from_nanos(nanos as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("h").is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["geoipupdate"]).unwrap();
        assert_eq!(args.source, "updates.maxmind.com");
        assert_eq!(args.protocol, Protocol::Https);
        assert_eq!(args.directory, PathBuf::from("/usr/local/var/GeoIP"));
        assert_eq!(args.user_id, "999999");
        assert_eq!(args.product_ids, "506,533,517");
        assert!(args.links);
        assert!(args.random_delay.is_none());
        assert_eq!(args.timeout, Duration::from_secs(300));
        assert_eq!(
            args.base_url().unwrap().as_str(),
            "https://updates.maxmind.com/"
        );
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "geoipupdate",
            "--source",
            "127.0.0.1:8080",
            "--protocol",
            "http",
            "--links",
            "false",
            "--randomdelay",
            "2m",
            "--productids",
            "GeoIP2-City",
        ])
        .unwrap();
        assert!(!args.links);
        assert_eq!(args.random_delay, Some(Duration::from_secs(120)));
        assert_eq!(args.base_url().unwrap().as_str(), "http://127.0.0.1:8080/");
        assert_eq!(args.product_ids, "GeoIP2-City");
    }
}
