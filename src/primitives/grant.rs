//! The records the server keeps around issued codes and tokens.
//!
//! Both record types can be stored in a database without worrying about
//! lifetimes or shared across thread boundaries. The `user_data` payload is
//! threaded through from the authorization decision to the persisted grant
//! without ever being inspected by this crate.
use chrono::Duration;
use serde_json::Value;

use super::client::SharedClient;
use super::Time;

/// Server-side record of a previously issued authorization code.
///
/// Loaded read-only while the code is exchanged for an access token and
/// deleted unconditionally once the exchange succeeds.
#[derive(Clone, Debug)]
pub struct AuthorizeData {
    /// The client the code was issued to.
    pub client: SharedClient,

    /// The authorization code itself, also the storage key of this record.
    pub code: String,

    /// Lifetime of the code in seconds, counted from `created_at`.
    pub expires_in: i64,

    /// The scope requested during authorization.
    pub scope: String,

    /// The redirect address the code was issued under.
    pub redirect_uri: String,

    /// Instant the code was created.
    pub created_at: Time,

    /// Opaque payload attached by the authorization endpoint.
    pub user_data: Option<Value>,

    /// A non-empty challenge means the code was bound with PKCE and the
    /// exchange must present a matching verifier.
    pub code_challenge: String,

    /// The transform the challenge was created with, `plain` or `S256`.
    pub code_challenge_method: String,
}

impl AuthorizeData {
    /// Instant at which the code stops being redeemable.
    pub fn expire_at(&self) -> Time {
        self.created_at + Duration::seconds(self.expires_in)
    }

    /// Whether the code is expired when checked at `now`.
    pub fn is_expired_at(&self, now: Time) -> bool {
        self.expire_at() < now
    }
}

/// Server-side record of an issued access token.
///
/// Successive refreshes form a chain through `access_data`. The link is a
/// back-reference used once by the finalizer to invalidate the predecessor,
/// it does not keep the predecessor alive in storage.
#[derive(Clone, Debug)]
pub struct AccessData {
    /// The client the token was issued to.
    pub client: SharedClient,

    /// The authorize record this grant redeemed, if it came from a code
    /// exchange.
    pub authorize_data: Option<Box<AuthorizeData>>,

    /// The predecessor in the refresh chain, if this grant was produced by
    /// a refresh.
    pub access_data: Option<Box<AccessData>>,

    /// The access token string, also the storage key of this record.
    pub access_token: String,

    /// The refresh token string, empty when no refresh token was generated.
    pub refresh_token: String,

    /// Lifetime of the access token in seconds, counted from `created_at`.
    pub expires_in: i64,

    /// Lifetime of the refresh token in seconds, counted from `created_at`.
    pub refresh_expires_in: i64,

    /// The granted scope.
    pub scope: String,

    /// The redirect address the grant was issued under.
    pub redirect_uri: String,

    /// Instant the grant was created.
    pub created_at: Time,

    /// Opaque payload carried over from the request that minted this grant.
    pub user_data: Option<Value>,
}

impl AccessData {
    /// Instant at which the access token stops being valid.
    pub fn expire_at(&self) -> Time {
        self.created_at + Duration::seconds(self.expires_in)
    }

    /// Whether the access token is expired when checked at `now`.
    pub fn is_expired_at(&self, now: Time) -> bool {
        self.expire_at() < now
    }

    /// Whether this grant carries a refresh token.
    pub fn refreshable(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}
