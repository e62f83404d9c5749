//! Polymorphic HTTP wrappers around the token grant flows.
//!
//! The flows in [`access`] are agnostic of the web library serving the
//! request. A frontend provides the two sides of the translation: a
//! [`WebRequest`] giving flat access to the request parameters and headers,
//! and a [`WebResponse`] onto which [`issue`] and [`fail`] write the
//! outcome. [`Generic`] plugs a configuration, a storage backend and a
//! token generator together into a ready-made [`Endpoint`].
//!
//! [`access`]: ../access/index.html
//! [`WebRequest`]: trait.WebRequest.html
//! [`WebResponse`]: trait.WebResponse.html
//! [`issue`]: fn.issue.html
//! [`fail`]: fn.fail.html
//! [`Generic`]: struct.Generic.html
//! [`Endpoint`]: ../access/trait.Endpoint.html
mod query;

pub use self::query::{NormalizedParameter, QueryParameter};

use std::borrow::Cow;

use chrono::Utc;
use log::debug;

use crate::access::{BearerToken, Endpoint, Error, TokenCookie};
use crate::config::Config;
use crate::primitives::generator::TokenGenerator;
use crate::primitives::storage::Storage;
use crate::primitives::Time;

/// Abstraction of the incoming request as consumed by the token endpoint.
///
/// It is assumed to originate from an HTTP request, as defined in the scope
/// of the rfc, but theoretically other transports are possible.
pub trait WebRequest {
    /// The HTTP method of the request, `POST` or `GET`.
    fn method(&self) -> Cow<str>;

    /// Retrieve a parsed version of the url query.
    ///
    /// An `Err` indicates a malformed query. An empty query should result
    /// in an empty map instead of an `Err`.
    fn query(&mut self) -> Result<Cow<dyn QueryParameter + 'static>, ()>;

    /// Retrieve the parsed `application/x-www-form-urlencoded` body.
    ///
    /// An `Err` indicates a malformed body or a different content type.
    fn urlbody(&mut self) -> Result<Cow<dyn QueryParameter + 'static>, ()>;

    /// Contents of the authorization header, or `None` if none exists.
    ///
    /// An `Err` value indicates a malformed header or request.
    fn authheader(&mut self) -> Result<Option<Cow<str>>, ()>;

    /// Value of the named request cookie, if present.
    fn cookie(&mut self, name: &str) -> Option<Cow<str>>;
}

/// Response representation onto which the outcome of a flow is written.
///
/// At most one of the body methods will be called, after the status was
/// selected and any cookies were set.
pub trait WebResponse {
    /// The error generated when trying to construct an unhandled or invalid response.
    type Error;

    /// Set the response status to 200.
    fn ok(&mut self) -> Result<(), Self::Error>;

    /// Set the response status to 400.
    fn client_error(&mut self) -> Result<(), Self::Error>;

    /// Set the response status to 401 and add a `WWW-Authenticate` header.
    fn unauthorized(&mut self, header_value: &str) -> Result<(), Self::Error>;

    /// Set the response status to 500.
    fn server_error(&mut self) -> Result<(), Self::Error>;

    /// Json response data, with media type `application/json`.
    fn body_json(&mut self, data: &str) -> Result<(), Self::Error>;

    /// Append a `Set-Cookie` for the given token cookie.
    fn set_cookie(&mut self, cookie: &TokenCookie) -> Result<(), Self::Error>;
}

/// Write a successful issuance onto the response.
///
/// Sets the status, the token cookies and the json body in that order.
pub fn issue<W: WebResponse>(response: &mut W, token: &BearerToken) -> Result<(), W::Error> {
    response.ok()?;
    for cookie in &token.cookies {
        response.set_cookie(cookie)?;
    }
    response.body_json(&token.to_json())
}

/// Write a failed token request onto the response.
///
/// Client authentication failures turn into `401` with a
/// `WWW-Authenticate` challenge, internal failures into `500`, anything
/// else into `400`. The body always carries the error code and
/// description; internal details are logged, never surfaced.
pub fn fail<W: WebResponse>(response: &mut W, error: &Error) -> Result<(), W::Error> {
    if let Some(cause) = error.error().internal() {
        debug!("token request failed with {}: {}", error.error().kind(), cause);
    }

    match error {
        Error::Invalid(_) => response.client_error()?,
        Error::Unauthorized(_, scheme) => response.unauthorized(scheme)?,
        Error::Server(_) => response.server_error()?,
    }

    response.body_json(&error.to_json())
}

/// A plug-together endpoint over any storage backend and token generator.
pub struct Generic<S, G> {
    /// The endpoint configuration.
    pub config: Config,

    /// The storage backend holding clients and grant records.
    pub storage: S,

    /// The generator minting token strings.
    pub generator: G,

    clock: Option<Box<dyn Fn() -> Time + Send + Sync>>,
}

impl<S, G> Generic<S, G> {
    /// Assemble an endpoint from its collaborators.
    pub fn new(config: Config, storage: S, generator: G) -> Generic<S, G> {
        Generic {
            config,
            storage,
            generator,
            clock: None,
        }
    }

    /// Route all time stamps and expiry checks through `clock`.
    ///
    /// Tests use this to control the endpoint's notion of now.
    pub fn set_clock<F>(&mut self, clock: F)
    where
        F: Fn() -> Time + Send + Sync + 'static,
    {
        self.clock = Some(Box::new(clock));
    }
}

impl<S: Storage + 'static, G: TokenGenerator + 'static> Endpoint for Generic<S, G> {
    fn config(&self) -> &Config {
        &self.config
    }

    fn storage(&self) -> &dyn Storage {
        &self.storage
    }

    fn generator(&mut self) -> &mut dyn TokenGenerator {
        &mut self.generator
    }

    fn now(&self) -> Time {
        match &self.clock {
            Some(clock) => clock(),
            None => Utc::now(),
        }
    }
}
