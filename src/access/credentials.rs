//! The credential presenting grants: `password`, `client_credentials` and
//! `assertion`.
//!
//! All three authenticate the client with its secret. The actual resource
//! owner credential check of the `password` grant is performed by the
//! caller between the two request phases; this module only enforces that
//! the credentials were presented.
use super::authenticate::{client_with_secret, credentials};
use super::error::{Error, ErrorCode};
use super::{param, AccessRequest, Endpoint, GrantType};
use crate::endpoint::{NormalizedParameter, WebRequest};
use crate::primitives::client::first_redirect_uri;

/// The `password` grant.
pub(super) fn password(
    endpoint: &mut dyn Endpoint, request: &mut dyn WebRequest, params: NormalizedParameter,
) -> Result<AccessRequest, Error> {
    let auth = credentials(request, &params, endpoint.config())?;
    let client = client_with_secret(endpoint.storage(), &auth)?;

    let username = param(&params, "username");
    let password = param(&params, "password");
    if username.is_empty() || password.is_empty() {
        return Err(Error::new(ErrorCode::InvalidGrant, "username and password is required"));
    }

    let redirect_uri =
        first_redirect_uri(client.redirect_uri(), &endpoint.config().redirect_uri_separator)
            .to_string();

    let mut access_request = AccessRequest::new(GrantType::Password, client, endpoint.config(), params);
    access_request.username = username;
    access_request.password = password;
    access_request.redirect_uri = redirect_uri;
    Ok(access_request)
}

/// The `client_credentials` grant.
///
/// An empty secret is rejected before the client is resolved, so the
/// failure reads `invalid_grant` rather than `invalid_client`. No refresh
/// token is generated and no cookies are written for this grant.
pub(super) fn client_credentials(
    endpoint: &mut dyn Endpoint, request: &mut dyn WebRequest, params: NormalizedParameter,
) -> Result<AccessRequest, Error> {
    let auth = credentials(request, &params, endpoint.config())?;
    if auth.password.is_empty() {
        return Err(Error::new(ErrorCode::InvalidGrant, "client secret is empty"));
    }
    let client = client_with_secret(endpoint.storage(), &auth)?;

    let redirect_uri =
        first_redirect_uri(client.redirect_uri(), &endpoint.config().redirect_uri_separator)
            .to_string();

    let mut access_request =
        AccessRequest::new(GrantType::ClientCredentials, client, endpoint.config(), params);
    access_request.generate_refresh = false;
    access_request.skip_set_cookie = true;
    access_request.redirect_uri = redirect_uri;
    Ok(access_request)
}

/// The `assertion` grant.
///
/// Interpretation of the assertion is up to the caller; per the RFC no
/// refresh token is generated.
pub(super) fn assertion(
    endpoint: &mut dyn Endpoint, request: &mut dyn WebRequest, params: NormalizedParameter,
) -> Result<AccessRequest, Error> {
    let auth = credentials(request, &params, endpoint.config())?;
    let client = client_with_secret(endpoint.storage(), &auth)?;

    let assertion_type = param(&params, "assertion_type");
    let assertion = param(&params, "assertion");
    if assertion_type.is_empty() || assertion.is_empty() {
        return Err(Error::new(
            ErrorCode::InvalidGrant,
            "assertion and assertion_type is required",
        ));
    }

    let redirect_uri =
        first_redirect_uri(client.redirect_uri(), &endpoint.config().redirect_uri_separator)
            .to_string();

    let mut access_request =
        AccessRequest::new(GrantType::Assertion, client, endpoint.config(), params);
    access_request.generate_refresh = false;
    access_request.assertion_type = assertion_type;
    access_request.assertion = assertion;
    access_request.redirect_uri = redirect_uri;
    Ok(access_request)
}
