//! Client authentication for the token endpoint.
//!
//! Credentials are taken from the `Authorization: Basic` header first. Form
//! fields are only consulted as a fallback when the configuration opts into
//! it. Resolution then goes through one of two paths: the common one
//! demanding the secret, and a relaxed one for grants where public clients
//! identify themselves by id alone.
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::error::{Error, ErrorCode};
use crate::config::Config;
use crate::endpoint::{QueryParameter, WebRequest};
use crate::primitives::client::SharedClient;
use crate::primitives::storage::{Storage, StorageError};

/// Credentials presented by the client.
#[derive(Clone)]
pub struct BasicAuth {
    /// The client identifier, the user half of the Basic pair.
    pub username: String,

    /// The client secret, possibly empty.
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<confidential>")
            .finish()
    }
}

/// Decode the `Authorization: Basic` header when one is present.
///
/// A present but malformed header is an error, not an absent credential.
pub fn from_basic_header(request: &mut dyn WebRequest) -> Result<Option<BasicAuth>, Error> {
    let header = match request.authheader() {
        Ok(Some(header)) => header.into_owned(),
        Ok(None) => return Ok(None),
        Err(()) => {
            return Err(Error::new(
                ErrorCode::InvalidRequest,
                "malformed authorization header",
            ))
        }
    };

    let encoded = header.strip_prefix("Basic ").ok_or_else(|| {
        Error::new(ErrorCode::InvalidRequest, "authorization header is not basic auth")
    })?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|err| {
            Error::new(ErrorCode::InvalidRequest, "invalid authorization header")
                .with_internal(err.to_string())
        })?;
    let decoded = String::from_utf8(decoded).map_err(|err| {
        Error::new(ErrorCode::InvalidRequest, "invalid authorization header")
            .with_internal(err.to_string())
    })?;

    let (username, password) = decoded.split_once(':').ok_or_else(|| {
        Error::new(ErrorCode::InvalidRequest, "invalid authorization header")
    })?;

    Ok(Some(BasicAuth {
        username: username.to_string(),
        password: password.to_string(),
    }))
}

/// Resolve the presented credentials with the configured precedence.
///
/// The Basic header wins. Without one, the `client_id`/`client_secret`
/// form fields are accepted iff `allow_client_secret_in_params` is set.
pub fn credentials(
    request: &mut dyn WebRequest, params: &dyn QueryParameter, config: &Config,
) -> Result<BasicAuth, Error> {
    if let Some(auth) = from_basic_header(request)? {
        return Ok(auth);
    }

    if config.allow_client_secret_in_params {
        if let Some(username) = params.unique_value("client_id") {
            let password = params
                .unique_value("client_secret")
                .map(|secret| secret.into_owned())
                .unwrap_or_default();
            return Ok(BasicAuth {
                username: username.into_owned(),
                password,
            });
        }
    }

    Err(Error::new(
        ErrorCode::InvalidRequest,
        "client authentication not sent",
    ))
}

/// Look up and authenticate the client behind `auth`.
///
/// The client must exist, its secret must match and it must have at least
/// one registered redirect address; each miss is an `invalid_client`.
pub fn client_with_secret(storage: &dyn Storage, auth: &BasicAuth) -> Result<SharedClient, Error> {
    let client = match storage.client(&auth.username) {
        Ok(client) => client,
        Err(StorageError::NotFound) => {
            return Err(Error::new(ErrorCode::InvalidClient, "client not found"))
        }
        Err(err) => {
            return Err(Error::new(ErrorCode::ServerError, "error loading client")
                .with_internal(err.to_string()))
        }
    };

    if !client.matches_secret(&auth.password) {
        return Err(Error::new(ErrorCode::InvalidClient, "client check failed"));
    }
    if client.redirect_uri().is_empty() {
        return Err(Error::new(
            ErrorCode::InvalidClient,
            "client has no registered redirect uri",
        ));
    }

    Ok(client)
}

/// Look up a client that is not expected to present its secret.
///
/// Used by the grants that accept public clients. The storage failure modes
/// mirror [`client_with_secret`], with `unauthorized_client` replacing the
/// authentication error.
///
/// [`client_with_secret`]: fn.client_with_secret.html
pub fn client_without_secret(storage: &dyn Storage, client_id: &str) -> Result<SharedClient, Error> {
    let client = match storage.client(client_id) {
        Ok(client) => client,
        Err(StorageError::NotFound) => {
            return Err(Error::new(ErrorCode::UnauthorizedClient, "client not found"))
        }
        Err(err) => {
            return Err(Error::new(ErrorCode::ServerError, "error loading client")
                .with_internal(err.to_string()))
        }
    };

    if client.redirect_uri().is_empty() {
        return Err(Error::new(
            ErrorCode::UnauthorizedClient,
            "client has no registered redirect uri",
        ));
    }

    Ok(client)
}

/// Client resolution for grants where public clients may omit the secret.
///
/// With a Basic header the client authenticates as usual. Without one the
/// form's `client_id` identifies the client on the relaxed path.
pub fn client_with_optional_secret(
    storage: &dyn Storage, request: &mut dyn WebRequest, params: &dyn QueryParameter,
) -> Result<SharedClient, Error> {
    match from_basic_header(request)? {
        Some(auth) => client_with_secret(storage, &auth),
        None => {
            let client_id = params.unique_value("client_id").ok_or_else(|| {
                Error::new(ErrorCode::InvalidRequest, "client authentication not sent")
            })?;
            client_without_secret(storage, &client_id)
        }
    }
}
