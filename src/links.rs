use std::path::Path;

/// `(existing database, legacy name)` pairs linked after an update run.
pub const LEGACY_LINKS: [(&str, &str); 2] = [
    ("GeoLiteCity.dat", "GeoIPCity.dat"),
    ("GeoLiteCountry.dat", "GeoIP.dat"),
];

/// Create the legacy symlinks in `directory`, returning how many were made.
///
/// Names that already exist are left alone. Failures are logged only.
#[cfg(unix)]
pub fn create_legacy_links(directory: &Path) -> usize {
    tracing::info!("Making legacy links in {}", directory.display());

    let mut created = 0;
    for (target, name) in LEGACY_LINKS {
        let target = directory.join(target);
        let link = directory.join(name);

        if link.symlink_metadata().is_ok() {
            tracing::debug!("{} already exists, leaving it", link.display());
            continue;
        }
        match std::os::unix::fs::symlink(&target, &link) {
            Ok(()) => created += 1,
            Err(e) => tracing::warn!(
                "Failed to link {} -> {}: {}",
                link.display(),
                target.display(),
                e
            ),
        }
    }
    created
}

#[cfg(not(unix))]
pub fn create_legacy_links(directory: &Path) -> usize {
    tracing::info!(
        "Skipping legacy links in {}: symlinks unsupported on this platform",
        directory.display()
    );
    0
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_links_point_at_databases() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("GeoLiteCity.dat"), b"city").unwrap();

        assert_eq!(create_legacy_links(dir.path()), 2);

        let link = dir.path().join("GeoIPCity.dat");
        assert_eq!(
            fs::read_link(&link).unwrap(),
            dir.path().join("GeoLiteCity.dat")
        );
        assert_eq!(fs::read(&link).unwrap(), b"city");

        // Second run finds both names taken.
        assert_eq!(create_legacy_links(dir.path()), 0);
    }

    #[test]
    fn test_existing_file_is_not_replaced() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("GeoIP.dat"), b"real file").unwrap();

        assert_eq!(create_legacy_links(dir.path()), 1);
        assert_eq!(fs::read(dir.path().join("GeoIP.dat")).unwrap(), b"real file");
    }
}
