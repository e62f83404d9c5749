//! Handling of access token requests, one handler per grant type.
//!
//! A token request runs in two phases with the embedding application in
//! between. [`access_request`] validates the request, authenticates the
//! client and loads the records the grant depends on, producing an
//! [`AccessRequest`]. The application inspects it, performs whatever
//! out-of-band decision the grant calls for (checking resource owner
//! credentials for `password`, approving a device, ...) and flips
//! `authorized`. [`finish_access_request`] then mints the tokens, persists
//! the new grant, invalidates its predecessors and assembles the response.
//!
//! ```text
//! request -> access_request -> AccessRequest -> (caller decides)
//!         -> finish_access_request -> BearerToken | Error
//! ```
//!
//! [`access_request`]: fn.access_request.html
//! [`AccessRequest`]: struct.AccessRequest.html
//! [`finish_access_request`]: fn.finish_access_request.html
pub mod authenticate;
mod code;
mod credentials;
pub mod error;
mod extension;
mod finish;
pub mod pkce;
mod refresh;

pub use self::error::{AccessTokenError, Error, ErrorCode};
pub use self::finish::{finish_access_request, BearerToken, TokenCookie, TokenResponse};

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::endpoint::{NormalizedParameter, QueryParameter, WebRequest};
use crate::primitives::client::SharedClient;
use crate::primitives::generator::TokenGenerator;
use crate::primitives::grant::{AccessData, AuthorizeData};
use crate::primitives::storage::Storage;
use crate::primitives::Time;

/// The grant types understood by the dispatcher.
///
/// Besides the four RFC grants and the assertion extension this covers the
/// server's own extension grants: `anonymous`, `device` and `platform`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Exchange of an authorization code, the second half of the
    /// front-channel flow.
    AuthorizationCode,

    /// Trading a refresh token for a fresh access token.
    RefreshToken,

    /// Resource owner password credentials.
    Password,

    /// The client acts on its own behalf.
    ClientCredentials,

    /// An assertion grant, e.g. a SAML or JWT bearer assertion.
    Assertion,

    /// Anonymous access bound to a caller-provided user id.
    Anonymous,

    /// Device bound access, identified by a device id.
    Device,

    /// Platform access, identified by a platform token.
    Platform,
}

impl GrantType {
    /// The wire representation carried in the `grant_type` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::RefreshToken => "refresh_token",
            GrantType::Password => "password",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::Assertion => "assertion",
            GrantType::Anonymous => "anonymous",
            GrantType::Device => "device",
            GrantType::Platform => "platform",
        }
    }

    fn from_param(value: &str) -> Option<GrantType> {
        match value {
            "authorization_code" => Some(GrantType::AuthorizationCode),
            "refresh_token" => Some(GrantType::RefreshToken),
            "password" => Some(GrantType::Password),
            "client_credentials" => Some(GrantType::ClientCredentials),
            "assertion" => Some(GrantType::Assertion),
            "anonymous" => Some(GrantType::Anonymous),
            "device" => Some(GrantType::Device),
            "platform" => Some(GrantType::Platform),
            _ => None,
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Required functionality to respond to access token requests.
///
/// Collaborators are handed out per call, so the flows never hold on to a
/// borrow across a decision point of the embedding application.
pub trait Endpoint {
    /// The endpoint configuration.
    fn config(&self) -> &Config;

    /// The storage backend holding clients and grant records.
    fn storage(&self) -> &dyn Storage;

    /// The generator minting token strings.
    fn generator(&mut self) -> &mut dyn TokenGenerator;

    /// The current instant.
    ///
    /// Every expiration check and record stamp of a flow goes through this
    /// hook, so an endpoint can pin time in tests or defer to a calibrated
    /// source in production.
    fn now(&self) -> Time;
}

/// An access token request in between its two processing phases.
///
/// Built by a grant handler, inspected and authorized by the caller,
/// consumed once by [`finish_access_request`].
///
/// [`finish_access_request`]: fn.finish_access_request.html
#[derive(Clone, Debug)]
pub struct AccessRequest {
    /// The grant this request arrived under.
    pub grant_type: GrantType,

    /// The authorization code or refresh token presented by the client,
    /// depending on the grant.
    pub code: String,

    /// The PKCE verifier submitted alongside an authorization code.
    pub code_verifier: String,

    /// The authenticated (or, for public-client grants, identified) client.
    pub client: SharedClient,

    /// The authorize record a code exchange redeemed.
    pub authorize_data: Option<AuthorizeData>,

    /// The previous access record a refresh chains onto.
    pub access_data: Option<AccessData>,

    /// Pre-built access record to issue verbatim instead of minting a new
    /// one. Supports deterministic replay of an existing grant.
    pub force_access_data: Option<AccessData>,

    /// The redirect address resolved for this request.
    pub redirect_uri: String,

    /// The requested scope.
    pub scope: String,

    /// Resource owner name, filled by the `password` and `anonymous`
    /// grants for the caller's credential check.
    pub username: String,

    /// Resource owner password. The `device` and `platform` grants pass
    /// their device id and platform token through this slot.
    pub password: String,

    /// Assertion type of the `assertion` grant.
    pub assertion_type: String,

    /// Assertion payload of the `assertion` grant.
    pub assertion: String,

    /// Whether the finalizer should mint a refresh token.
    pub generate_refresh: bool,

    /// Lifetime in seconds of the access token to issue.
    pub expires_in: i64,

    /// Lifetime in seconds of the refresh token to issue.
    pub refresh_expires_in: i64,

    /// The caller's decision. Left `false` by every handler; only the
    /// embedding application may grant it.
    pub authorized: bool,

    /// Suppress the token cookies on the response.
    pub skip_set_cookie: bool,

    /// Opaque payload persisted with the grant. Handlers seed it from the
    /// loaded records, the caller may replace it before finalization.
    pub user_data: Option<Value>,

    /// The parsed request parameters, kept for the caller's use between
    /// the two phases.
    pub params: NormalizedParameter,
}

impl AccessRequest {
    fn new(
        grant_type: GrantType, client: SharedClient, config: &Config, params: NormalizedParameter,
    ) -> AccessRequest {
        AccessRequest {
            grant_type,
            code: String::new(),
            code_verifier: String::new(),
            client,
            authorize_data: None,
            access_data: None,
            force_access_data: None,
            redirect_uri: String::new(),
            scope: String::new(),
            username: String::new(),
            password: String::new(),
            assertion_type: String::new(),
            assertion: String::new(),
            generate_refresh: true,
            expires_in: config.access_expiration,
            refresh_expires_in: config.refresh_expiration,
            authorized: false,
            skip_set_cookie: false,
            user_data: None,
            params,
        }
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Validate an incoming token request and assemble its [`AccessRequest`].
///
/// Enforces the method policy, decodes the parameters, checks the grant
/// type against the configured allow-list and defers to the handler of the
/// requested grant. Any failure maps to the protocol error the grant
/// prescribes; nothing is persisted on an error path.
///
/// [`AccessRequest`]: struct.AccessRequest.html
pub fn access_request(
    endpoint: &mut dyn Endpoint, request: &mut dyn WebRequest,
) -> Result<AccessRequest> {
    let params = decode_params(endpoint.config(), request)?;

    let grant_type = param(&params, "grant_type");
    let grant_type = GrantType::from_param(&grant_type)
        .filter(|grant| endpoint.config().allows(*grant))
        .ok_or_else(|| Error::new(ErrorCode::UnsupportedGrantType, "unknown grant type"))?;

    match grant_type {
        GrantType::AuthorizationCode => code::authorization_code(endpoint, request, params),
        GrantType::RefreshToken => refresh::refresh_token(endpoint, request, params),
        GrantType::Password => credentials::password(endpoint, request, params),
        GrantType::ClientCredentials => credentials::client_credentials(endpoint, request, params),
        GrantType::Assertion => credentials::assertion(endpoint, request, params),
        GrantType::Anonymous => extension::anonymous(endpoint, request, params),
        GrantType::Device => extension::device(endpoint, request, params),
        GrantType::Platform => extension::platform(endpoint, request, params),
    }
}

/// Apply the method policy and decode the parameter source it selects.
fn decode_params(config: &Config, request: &mut dyn WebRequest) -> Result<NormalizedParameter> {
    let method = request.method().into_owned();
    let source = match method.as_str() {
        "POST" => request.urlbody(),
        "GET" if config.allow_get_access_request => request.query(),
        _ => {
            return Err(Error::new(
                ErrorCode::InvalidRequest,
                "access request must be POST",
            ))
        }
    };

    source
        .map(|params| params.normalize())
        .map_err(|()| Error::new(ErrorCode::InvalidRequest, "request parameters could not be parsed"))
}

/// The unique value of a parameter, owned, empty when absent.
fn param(params: &NormalizedParameter, key: &str) -> String {
    params
        .unique_value(key)
        .map(|value| value.into_owned())
        .unwrap_or_default()
}
