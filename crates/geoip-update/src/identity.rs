use std::fmt;

/// Account credentials presented to the update service.
#[derive(Clone)]
pub struct Credential {
    account_id: String,
    license_key: String,
}

impl Credential {
    /// Create credentials from an account id and license key.
    pub fn new(account_id: impl Into<String>, license_key: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            license_key: license_key.into(),
        }
    }

    /// Account (user) id sent as `user_id`.
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Shared secret mixed into the per-session challenge.
    pub fn license_key(&self) -> &str {
        &self.license_key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account_id", &self.account_id)
            .field("license_key", &"<redacted>")
            .finish()
    }
}

/// The caller's public address as observed by the update service.
///
/// Kept as the exact bytes the service sent, since the challenge is hashed
/// over them.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    public_address: Vec<u8>,
}

impl ClientIdentity {
    pub fn new(public_address: impl Into<Vec<u8>>) -> Self {
        Self {
            public_address: public_address.into(),
        }
    }

    pub fn public_address(&self) -> &[u8] {
        &self.public_address
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.public_address))
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClientIdentity").field(&self.to_string()).finish()
    }
}

/// Identifier of one database product (`edition_id` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a comma-delimited list such as `506,533,517`.
    ///
    /// Whitespace around items is ignored and empty items are dropped.
    pub fn parse_list(list: &str) -> Vec<ProductId> {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(ProductId::new)
            .collect()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn license_key_is_redacted_in_debug() {
        let credential = Credential::new("999999", "s3cr3tkey");
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("999999"));
        assert!(!rendered.contains("s3cr3tkey"));
    }

    #[test]
    fn client_address_bytes_are_kept_verbatim() {
        let identity = ClientIdentity::new(&b"10.0.0.1\xff"[..]);
        assert_eq!(identity.public_address(), b"10.0.0.1\xff");
        assert_eq!(identity.to_string(), "10.0.0.1\u{fffd}");
    }

    #[test]
    fn product_list_parsing() {
        let ids = ProductId::parse_list(" 506, 533,,517 ,");
        let ids: Vec<&str> = ids.iter().map(ProductId::as_str).collect();
        assert_eq!(ids, vec!["506", "533", "517"]);
        assert!(ProductId::parse_list("").is_empty());
    }
}
