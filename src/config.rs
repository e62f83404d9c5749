//! Configuration consumed by the token endpoint flows.
use serde::{Deserialize, Serialize};

use crate::access::GrantType;

/// Tunable behaviour of the token endpoint.
///
/// Every field has a default, so deployments can deserialize a partial
/// configuration from whatever format their stack uses and only override
/// what differs.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// The grant types this endpoint answers. Anything else is rejected as
    /// `unsupported_grant_type`.
    pub allowed_access_types: Vec<GrantType>,

    /// Accept token requests via `GET` in addition to `POST`.
    pub allow_get_access_request: bool,

    /// Accept `client_id`/`client_secret` form fields when no Basic
    /// authorization header is present. Discouraged by the RFC, off by
    /// default.
    pub allow_client_secret_in_params: bool,

    /// Lifetime of issued access tokens in seconds.
    pub access_expiration: i64,

    /// Lifetime of issued refresh tokens in seconds.
    pub refresh_expiration: i64,

    /// Separator of the redirect address list registered on a client. An
    /// empty separator treats the whole list as a single address.
    pub redirect_uri_separator: String,

    /// Keep the previous access record alive after a successful refresh
    /// instead of removing it.
    pub retain_token_after_refresh: bool,

    /// The `token_type` announced in responses.
    pub token_type: String,

    /// Domain attribute of the token cookies written on success.
    pub cookie_domain: String,
}

impl Config {
    /// Whether the given grant type is in the allowed set.
    pub fn allows(&self, grant: GrantType) -> bool {
        self.allowed_access_types.contains(&grant)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            allowed_access_types: vec![GrantType::AuthorizationCode, GrantType::RefreshToken],
            allow_get_access_request: false,
            allow_client_secret_in_params: false,
            access_expiration: 3600,
            refresh_expiration: 1_209_600,
            redirect_uri_separator: String::new(),
            retain_token_after_refresh: false,
            token_type: "Bearer".to_string(),
            cookie_domain: String::new(),
        }
    }
}
