//! MD5 content digests used to tell the service what is installed locally.

use md5::{Digest, Md5};
use std::fmt;
use std::path::Path;

/// 16-byte MD5 fingerprint of a database file or payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 16]);

impl ContentDigest {
    /// Digest reported when there is no local content yet.
    pub const SENTINEL: ContentDigest = ContentDigest([0u8; 16]);

    /// Fingerprint arbitrary bytes.
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&Md5::digest(data));
        Self(bytes)
    }

    /// Fingerprint the file at `path`.
    ///
    /// Returns [`ContentDigest::SENTINEL`] when the file is missing or
    /// unreadable, so a fresh install always asks for a full download.
    pub async fn of_file(path: &Path) -> Self {
        match tokio::fs::read(path).await {
            Ok(data) => Self::of_bytes(&data),
            Err(err) => {
                tracing::debug!("no usable local copy at {}: {}", path.display(), err);
                Self::SENTINEL
            }
        }
    }

    /// Whether this is the "no local content" digest.
    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lowercase hex form, as sent on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 16]> for ContentDigest {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sentinel_is_all_zero_hex() {
        assert_eq!(
            ContentDigest::SENTINEL.to_hex(),
            "00000000000000000000000000000000"
        );
        assert!(ContentDigest::SENTINEL.is_sentinel());
        assert_eq!(ContentDigest::SENTINEL.as_bytes(), &[0u8; 16]);
    }

    #[test]
    fn digest_of_known_bytes() {
        // md5("hello world")
        assert_eq!(
            ContentDigest::of_bytes(b"hello world").to_hex(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(
            ContentDigest::of_bytes(b"").to_hex(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[tokio::test]
    async fn missing_file_yields_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("GeoLiteCity.dat");

        assert_eq!(ContentDigest::of_file(&path).await, ContentDigest::SENTINEL);
        assert_eq!(ContentDigest::of_file(&path).await, ContentDigest::SENTINEL);
    }

    #[tokio::test]
    async fn existing_file_matches_byte_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("GeoIP.dat");
        std::fs::write(&path, b"hello world").unwrap();

        let digest = ContentDigest::of_file(&path).await;
        assert_eq!(digest, ContentDigest::of_bytes(b"hello world"));
        assert!(!digest.is_sentinel());
    }
}
