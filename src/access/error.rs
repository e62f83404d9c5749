//! Errors of the token endpoint.
//!
//! Codes follow [rfc6749 section 5.2] with the two additions this server
//! needs: `access_denied` for requests the authorization decision turned
//! down and `server_error` for failing collaborators.
//!
//! [rfc6749 section 5.2]: https://tools.ietf.org/html/rfc6749#section-5.2
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::vec;

/// All error codes a token request can be answered with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// The request is missing a required parameter, includes an unsupported
    /// parameter value, repeats a parameter or is otherwise malformed.
    InvalidRequest,

    /// Client authentication failed (e.g., unknown client, no client
    /// authentication included, or unsupported authentication method).
    InvalidClient,

    /// The client is not authorized to obtain an access token using this
    /// method, or the referenced grant record could not be attributed to a
    /// usable client.
    UnauthorizedClient,

    /// The provided authorization grant (authorization code, resource owner
    /// credentials) or refresh token is invalid, expired, revoked, does not
    /// match the redirection URI used in the authorization request, or was
    /// issued to another client.
    InvalidGrant,

    /// The authorization grant type is not supported by this server or not
    /// enabled in its configuration.
    UnsupportedGrantType,

    /// The authorization decision turned the request down.
    AccessDenied,

    /// An internal collaborator failed while handling the request.
    ServerError,
}

impl ErrorCode {
    fn description(self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidClient => "invalid_client",
            ErrorCode::UnauthorizedClient => "unauthorized_client",
            ErrorCode::InvalidGrant => "invalid_grant",
            ErrorCode::UnsupportedGrantType => "unsupported_grant_type",
            ErrorCode::AccessDenied => "access_denied",
            ErrorCode::ServerError => "server_error",
        }
    }
}

impl AsRef<str> for ErrorCode {
    fn as_ref(&self) -> &str {
        self.description()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// Parameters of an error response to a token request.
///
/// Besides the code and the human readable description surfaced to the
/// client, an internal detail may be retained. It is meant for the server's
/// own logs and never serialized into the response.
#[derive(Clone, Debug)]
pub struct AccessTokenError {
    error: ErrorCode,
    description: Option<Cow<'static, str>>,
    internal: Option<String>,
}

impl AccessTokenError {
    pub(crate) fn new(error: ErrorCode) -> AccessTokenError {
        AccessTokenError {
            error,
            description: None,
            internal: None,
        }
    }

    /// Get the formal kind of error.
    pub fn kind(&self) -> ErrorCode {
        self.error
    }

    /// Set the error type.
    pub fn set_type(&mut self, new_type: ErrorCode) {
        self.error = new_type;
    }

    /// Provide a short text explanation for the error.
    pub fn explain<D: Into<Cow<'static, str>>>(&mut self, description: D) {
        self.description = Some(description.into())
    }

    /// Attach the underlying cause for the server's own logs.
    ///
    /// The detail is deliberately absent from the serialized response.
    pub fn explain_internal<D: Into<String>>(&mut self, cause: D) {
        self.internal = Some(cause.into())
    }

    /// The retained internal detail, if any.
    pub fn internal(&self) -> Option<&str> {
        self.internal.as_deref()
    }

    /// Iterate over the key value pairs that describe this error.
    ///
    /// These pairs form the json body of the error response.
    pub fn iter(&self) -> <&Self as IntoIterator>::IntoIter {
        self.into_iter()
    }
}

impl Default for AccessTokenError {
    /// A generic `invalid_request` without any description.
    fn default() -> Self {
        AccessTokenError::new(ErrorCode::InvalidRequest)
    }
}

/// The error as key-value pairs.
impl IntoIterator for &'_ AccessTokenError {
    type Item = (&'static str, Cow<'static, str>);
    type IntoIter = vec::IntoIter<(&'static str, Cow<'static, str>)>;

    fn into_iter(self) -> Self::IntoIter {
        let mut entries = vec![("error", Cow::Borrowed(self.error.description()))];
        if let Some(description) = &self.description {
            entries.push(("error_description", description.clone()));
        }
        entries.into_iter()
    }
}

/// Outcome of a failed token request.
///
/// The variant decides how the response sink frames the failure, the
/// carried [`AccessTokenError`] what its body says.
///
/// [`AccessTokenError`]: struct.AccessTokenError.html
#[derive(Clone, Debug)]
pub enum Error {
    /// The request was malformed or referenced an invalid grant.
    Invalid(AccessTokenError),

    /// The client did not properly authenticate itself.
    ///
    /// The second member names the authentication scheme the client should
    /// have used, to be announced in a `WWW-Authenticate` header.
    Unauthorized(AccessTokenError, String),

    /// An internal collaborator failed.
    Server(AccessTokenError),
}

impl Error {
    /// Construct an error of the given code with a short description.
    ///
    /// The variant is derived from the code: `invalid_client` asks for
    /// authentication, `server_error` reports an internal failure, all
    /// other codes fault the request.
    pub fn new<D: Into<Cow<'static, str>>>(code: ErrorCode, description: D) -> Error {
        let mut error = AccessTokenError::new(code);
        error.explain(description);

        match code {
            ErrorCode::InvalidClient => Error::Unauthorized(error, "Basic".to_string()),
            ErrorCode::ServerError => Error::Server(error),
            _ => Error::Invalid(error),
        }
    }

    /// Attach the underlying cause for internal logging.
    pub fn with_internal<D: Into<String>>(mut self, cause: D) -> Error {
        self.description().explain_internal(cause);
        self
    }

    /// The formal error code carried by this error.
    pub fn kind(&self) -> ErrorCode {
        self.error().kind()
    }

    /// Get a handle to the description the client will receive.
    pub fn description(&mut self) -> &mut AccessTokenError {
        match self {
            Error::Invalid(description) => description,
            Error::Unauthorized(description, _) => description,
            Error::Server(description) => description,
        }
    }

    /// Inspect the description the client will receive.
    pub fn error(&self) -> &AccessTokenError {
        match self {
            Error::Invalid(description) => description,
            Error::Unauthorized(description, _) => description,
            Error::Server(description) => description,
        }
    }

    /// Convert the error into a json string, viable for being sent over a
    /// network with `application/json` encoding.
    pub fn to_json(&self) -> String {
        let entries = self
            .error()
            .iter()
            .map(|(key, value)| (key, value.into_owned()))
            .collect::<HashMap<_, _>>();
        serde_json::to_string(&entries).unwrap()
    }
}
