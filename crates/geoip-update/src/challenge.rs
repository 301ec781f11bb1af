use md5::{Digest, Md5};

use crate::digest::ContentDigest;
use crate::identity::ClientIdentity;

/// Derive the `challenge_md5` token for a session.
///
/// MD5 over the license key followed by the public address the service
/// reported for this client.
pub fn compute_challenge(license_key: &str, identity: &ClientIdentity) -> ContentDigest {
    let mut hasher = Md5::new();
    hasher.update(license_key.as_bytes());
    hasher.update(identity.public_address());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hasher.finalize());
    ContentDigest::from(bytes)
}
