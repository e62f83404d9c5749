//! Finalization of an authorized access request.
//!
//! Minting, persisting and invalidating happen in a fixed order: the new
//! record is saved before any predecessor is removed, so a crash in
//! between leaves at most a spent-but-live authorization code behind,
//! never a client without any valid grant.
use log::warn;
use serde::{Deserialize, Serialize};

use super::error::{Error, ErrorCode};
use super::{param, AccessRequest, Endpoint};
use crate::primitives::grant::AccessData;

/// The json body of a successful token response.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    /// The access token issued by the authorization server.
    pub access_token: String,

    /// The type of the token issued.
    pub token_type: String,

    /// The lifetime in seconds of the access token.
    pub expires_in: i64,

    /// The refresh token, which can be used to obtain new access tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// The lifetime in seconds of the refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_expires_in: Option<i64>,

    /// The scope, which limits the permissions on the access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// A cookie mirroring one of the issued tokens.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenCookie {
    /// The cookie name, `access_token` or `refresh_token`.
    pub name: &'static str,

    /// The token string.
    pub value: String,

    /// Seconds until the cookie expires, equal to the token lifetime.
    pub max_age: i64,

    /// The configured cookie domain, possibly empty.
    pub domain: String,
}

impl TokenCookie {
    /// Render the value of a `Set-Cookie` header for this cookie.
    pub fn header_value(&self) -> String {
        let mut header = format!("{}={}; Max-Age={}; Path=/", self.name, self.value, self.max_age);
        if !self.domain.is_empty() {
            header.push_str("; Domain=");
            header.push_str(&self.domain);
        }
        header
    }
}

/// An issued bearer token: the response body and the cookies to set.
#[derive(Clone, Debug)]
pub struct BearerToken {
    /// The response body.
    pub response: TokenResponse,

    /// The token cookies, empty when the grant suppresses them.
    pub cookies: Vec<TokenCookie>,
}

impl BearerToken {
    /// Convert the token into a json string, viable for being sent over a
    /// network with `application/json` encoding.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.response).unwrap()
    }
}

/// Finalize an access request the caller has decided on.
///
/// An unauthorized request is answered with `access_denied` and leaves
/// storage untouched. For an authorized one the access record is built (or
/// adopted from `force_access_data`), tokens are minted, the record is
/// persisted and only then are the redeemed authorization code and, unless
/// configured otherwise, the refreshed predecessor removed. Failures of
/// those removals are logged and swallowed; at that point the client
/// already holds a valid grant.
pub fn finish_access_request(
    endpoint: &mut dyn Endpoint, mut request: AccessRequest,
) -> Result<BearerToken, Error> {
    // A redirect address already carried on the request wins over the raw
    // form value.
    let redirect_uri = if request.redirect_uri.is_empty() {
        param(&request.params, "redirect_uri")
    } else {
        request.redirect_uri.clone()
    };

    if !request.authorized {
        return Err(Error::new(ErrorCode::AccessDenied, "access denied"));
    }

    let now = endpoint.now();
    let access_data = match request.force_access_data.take() {
        // Reuse the caller-supplied record verbatim, tokens included.
        Some(data) => data,
        None => {
            let mut data = AccessData {
                client: request.client.clone(),
                authorize_data: request.authorize_data.take().map(Box::new),
                access_data: request.access_data.take().map(Box::new),
                access_token: String::new(),
                refresh_token: String::new(),
                expires_in: request.expires_in,
                refresh_expires_in: request.refresh_expires_in,
                scope: request.scope.clone(),
                redirect_uri,
                created_at: now,
                user_data: request.user_data.take(),
            };

            let pair = endpoint
                .generator()
                .generate(&data, request.generate_refresh)
                .map_err(|()| Error::new(ErrorCode::ServerError, "error generating token"))?;
            data.access_token = pair.access;
            data.refresh_token = pair.refresh;
            data
        }
    };

    endpoint.storage().save_access(&access_data).map_err(|err| {
        Error::new(ErrorCode::ServerError, "error saving access token").with_internal(err.to_string())
    })?;

    if let Some(authorize) = &access_data.authorize_data {
        if let Err(err) = endpoint.storage().remove_authorize(&authorize.code) {
            warn!("spent authorization code could not be removed: {}", err);
        }
    }
    if let Some(previous) = &access_data.access_data {
        if !endpoint.config().retain_token_after_refresh {
            if let Err(err) = endpoint.storage().remove_access(&previous.access_token) {
                warn!("refreshed access token could not be removed: {}", err);
            }
        }
    }

    let config = endpoint.config();
    let mut response = TokenResponse {
        access_token: access_data.access_token.clone(),
        token_type: config.token_type.clone(),
        expires_in: access_data.expires_in,
        refresh_token: None,
        refresh_expires_in: None,
        scope: match access_data.scope.is_empty() {
            true => None,
            false => Some(access_data.scope.clone()),
        },
    };

    let mut cookies = Vec::new();
    if access_data.refreshable() {
        response.refresh_token = Some(access_data.refresh_token.clone());
        response.refresh_expires_in = Some(access_data.refresh_expires_in);
        if !request.skip_set_cookie {
            cookies.push(TokenCookie {
                name: "refresh_token",
                value: access_data.refresh_token.clone(),
                max_age: access_data.refresh_expires_in,
                domain: config.cookie_domain.clone(),
            });
        }
    }
    if !request.skip_set_cookie {
        cookies.push(TokenCookie {
            name: "access_token",
            value: access_data.access_token.clone(),
            max_age: access_data.expires_in,
            domain: config.cookie_domain.clone(),
        });
    }

    Ok(BearerToken { response, cookies })
}
