//! Clients are the registered consumers of authorization tokens.
//!
//! The record backing a client is owned by the storage backend, the flows
//! only need the small capability set expressed by the [`Client`] trait:
//! an identifier, a secret check and the registered redirect addresses.
//! Several redirect addresses are encoded in a single string, delimited by
//! the separator configured on the endpoint.
use std::fmt;
use std::sync::Arc;

use subtle::ConstantTimeEq;

/// A registered client of the authorization server.
pub trait Client: fmt::Debug + Send + Sync {
    /// The unique identifier of this client.
    fn id(&self) -> &str;

    /// Check a presented secret against the stored one.
    ///
    /// Implementations must not leak the stored secret through timing, so a
    /// plain string comparison is not acceptable here.
    fn matches_secret(&self, secret: &str) -> bool;

    /// The registered redirect addresses, separator-delimited.
    ///
    /// An empty string means the client has no registered redirect address
    /// and cannot take part in any grant.
    fn redirect_uri(&self) -> &str;
}

/// Shared handle to a client resolved from storage.
pub type SharedClient = Arc<dyn Client>;

/// A ready-made confidential client backed by an owned record.
#[derive(Clone)]
pub struct ClientRecord {
    id: String,
    secret: String,
    redirect_uri: String,
}

impl ClientRecord {
    /// Create a client record from its registration data.
    pub fn new(id: &str, secret: &str, redirect_uri: &str) -> ClientRecord {
        ClientRecord {
            id: id.to_string(),
            secret: secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
        }
    }
}

impl Client for ClientRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches_secret(&self, secret: &str) -> bool {
        self.secret.as_bytes().ct_eq(secret.as_bytes()).into()
    }

    fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}

impl fmt::Debug for ClientRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClientRecord")
            .field("id", &self.id)
            .field("secret", &"<confidential>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// The first entry of a separator-delimited redirect address list.
///
/// With an empty separator the whole list is treated as a single address.
pub fn first_redirect_uri<'a>(list: &'a str, separator: &str) -> &'a str {
    if separator.is_empty() {
        list
    } else {
        list.split(separator).next().unwrap_or(list)
    }
}

/// Whether `uri` appears verbatim in the separator-delimited list.
///
/// Addresses are compared literally. No normalization is performed, a
/// registration must match the request character for character.
pub fn redirect_uri_in_list(list: &str, uri: &str, separator: &str) -> bool {
    if uri.is_empty() {
        return false;
    }
    if separator.is_empty() {
        return list == uri;
    }
    list.split(separator).any(|entry| entry == uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_check() {
        let client = ClientRecord::new("c1", "s1", "https://client.example/cb");
        assert!(client.matches_secret("s1"));
        assert!(!client.matches_secret("s2"));
        assert!(!client.matches_secret(""));
        assert!(!client.matches_secret("s1 "));
    }

    #[test]
    fn empty_secret_only_matches_empty() {
        let client = ClientRecord::new("c1", "", "https://client.example/cb");
        assert!(client.matches_secret(""));
        assert!(!client.matches_secret("s1"));
    }

    #[test]
    fn debug_hides_secret() {
        let client = ClientRecord::new("c1", "hunter2", "https://client.example/cb");
        let printed = format!("{:?}", client);
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn first_uri_of_list() {
        assert_eq!(first_redirect_uri("a|b|c", "|"), "a");
        assert_eq!(first_redirect_uri("a", "|"), "a");
        assert_eq!(first_redirect_uri("a|b|c", ""), "a|b|c");
        assert_eq!(first_redirect_uri("", "|"), "");
    }

    #[test]
    fn uri_membership() {
        assert!(redirect_uri_in_list("a|b|c", "b", "|"));
        assert!(redirect_uri_in_list("a|b|c", "a", "|"));
        assert!(!redirect_uri_in_list("a|b|c", "d", "|"));
        assert!(!redirect_uri_in_list("a|b|c", "", "|"));
        assert!(redirect_uri_in_list("a|b|c", "a|b|c", ""));
        assert!(!redirect_uri_in_list("a|b|c", "a", ""));
    }
}
