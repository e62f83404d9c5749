//! The server's extension grants: `anonymous`, `device` and `platform`.
//!
//! These exist for first-party surfaces. They carry their identifying
//! value (user id, device id, platform token) into the [`AccessRequest`]
//! and leave the actual verification to the caller's authorization
//! decision.
//!
//! [`AccessRequest`]: ../struct.AccessRequest.html
use super::authenticate::{client_with_optional_secret, client_with_secret, credentials};
use super::error::Error;
use super::{param, AccessRequest, Endpoint, GrantType};
use crate::endpoint::{NormalizedParameter, WebRequest};
use crate::primitives::client::first_redirect_uri;

/// The `anonymous` grant. The caller receives the `user_id` form field as
/// the username to decide on.
pub(super) fn anonymous(
    endpoint: &mut dyn Endpoint, request: &mut dyn WebRequest, params: NormalizedParameter,
) -> Result<AccessRequest, Error> {
    let auth = credentials(request, &params, endpoint.config())?;
    let client = client_with_secret(endpoint.storage(), &auth)?;

    let username = param(&params, "user_id");
    let redirect_uri =
        first_redirect_uri(client.redirect_uri(), &endpoint.config().redirect_uri_separator)
            .to_string();

    let mut access_request =
        AccessRequest::new(GrantType::Anonymous, client, endpoint.config(), params);
    access_request.username = username;
    access_request.redirect_uri = redirect_uri;
    Ok(access_request)
}

/// The `device` grant. The device id travels to the authorization decision
/// through the password slot.
pub(super) fn device(
    endpoint: &mut dyn Endpoint, request: &mut dyn WebRequest, params: NormalizedParameter,
) -> Result<AccessRequest, Error> {
    let auth = credentials(request, &params, endpoint.config())?;
    let client = client_with_secret(endpoint.storage(), &auth)?;

    let device_id = param(&params, "device_id");
    let redirect_uri =
        first_redirect_uri(client.redirect_uri(), &endpoint.config().redirect_uri_separator)
            .to_string();

    let mut access_request = AccessRequest::new(GrantType::Device, client, endpoint.config(), params);
    access_request.password = device_id;
    access_request.redirect_uri = redirect_uri;
    Ok(access_request)
}

/// The `platform` grant. Clients may be public, as in the code exchange;
/// the platform token travels through the password slot.
pub(super) fn platform(
    endpoint: &mut dyn Endpoint, request: &mut dyn WebRequest, params: NormalizedParameter,
) -> Result<AccessRequest, Error> {
    let client = client_with_optional_secret(endpoint.storage(), request, &params)?;

    let platform_token = param(&params, "platform_token");
    let redirect_uri =
        first_redirect_uri(client.redirect_uri(), &endpoint.config().redirect_uri_separator)
            .to_string();

    let mut access_request =
        AccessRequest::new(GrantType::Platform, client, endpoint.config(), params);
    access_request.password = platform_token;
    access_request.redirect_uri = redirect_uri;
    Ok(access_request)
}
