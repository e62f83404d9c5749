//! Exchange of an authorization code for an access token.
use super::authenticate::client_with_optional_secret;
use super::error::{Error, ErrorCode};
use super::{param, pkce, AccessRequest, Endpoint, GrantType};
use crate::endpoint::{NormalizedParameter, WebRequest};
use crate::primitives::client::{first_redirect_uri, redirect_uri_in_list};
use crate::primitives::storage::StorageError;

/// The `authorization_code` grant.
///
/// Public clients identify themselves by `client_id` alone, confidential
/// ones authenticate with the Basic header. The presented code must belong
/// to the resolved client, be unexpired, have been issued under the same
/// redirect address the request settles on, and, when the code was bound
/// with PKCE, the verifier must check out.
pub(super) fn authorization_code(
    endpoint: &mut dyn Endpoint, request: &mut dyn WebRequest, params: NormalizedParameter,
) -> Result<AccessRequest, Error> {
    let client = client_with_optional_secret(endpoint.storage(), request, &params)?;

    let code = param(&params, "code");
    if code.is_empty() {
        return Err(Error::new(ErrorCode::InvalidGrant, "authorization code is required"));
    }

    let authorize_data = match endpoint.storage().load_authorize(&code) {
        Ok(data) => data,
        Err(StorageError::NotFound) => {
            return Err(Error::new(
                ErrorCode::UnauthorizedClient,
                "authorization data is not found",
            ))
        }
        Err(err) => {
            return Err(Error::new(ErrorCode::InvalidGrant, "error loading authorize data")
                .with_internal(err.to_string()))
        }
    };

    if authorize_data.client.redirect_uri().is_empty() {
        return Err(Error::new(
            ErrorCode::UnauthorizedClient,
            "authorization data has no redirect uri",
        ));
    }
    if authorize_data.is_expired_at(endpoint.now()) {
        return Err(Error::new(ErrorCode::InvalidGrant, "authorization data is expired"));
    }
    if authorize_data.client.id() != client.id() {
        return Err(Error::new(ErrorCode::InvalidGrant, "client code does not match"));
    }

    // Settle on the redirect address: the request's, defaulted to the first
    // registered one, and in any case a registered one matching the code.
    let separator = endpoint.config().redirect_uri_separator.clone();
    let mut redirect_uri = param(&params, "redirect_uri");
    if redirect_uri.is_empty() {
        redirect_uri = first_redirect_uri(client.redirect_uri(), &separator).to_string();
    }
    if !redirect_uri_in_list(client.redirect_uri(), &redirect_uri, &separator) {
        return Err(Error::new(
            ErrorCode::InvalidRequest,
            "error validating client redirect uri",
        ));
    }
    if redirect_uri != authorize_data.redirect_uri {
        return Err(Error::new(
            ErrorCode::InvalidRequest,
            "client redirect uri is different",
        ));
    }

    let code_verifier = param(&params, "code_verifier");
    if !authorize_data.code_challenge.is_empty() {
        pkce::verify_code_challenge(
            &authorize_data.code_challenge,
            &authorize_data.code_challenge_method,
            &code_verifier,
        )?;
    }

    let mut access_request =
        AccessRequest::new(GrantType::AuthorizationCode, client, endpoint.config(), params);
    access_request.code = code;
    access_request.code_verifier = code_verifier;
    access_request.redirect_uri = redirect_uri;
    access_request.scope = authorize_data.scope.clone();
    access_request.user_data = authorize_data.user_data.clone();
    access_request.authorize_data = Some(authorize_data);
    Ok(access_request)
}
