//! Retrieve a refreshed access token.
use super::authenticate::{client_with_secret, credentials};
use super::error::{Error, ErrorCode};
use super::{param, AccessRequest, Endpoint, GrantType};
use crate::endpoint::{NormalizedParameter, WebRequest};
use crate::primitives::scope;
use crate::primitives::storage::StorageError;

/// The `refresh_token` grant.
///
/// The refresh token is taken from the form, falling back to the
/// `refresh_token` cookie a previous issuance may have set. The loaded
/// record must belong to the authenticated client, and the requested scope
/// must not include any scope not originally granted.
pub(super) fn refresh_token(
    endpoint: &mut dyn Endpoint, request: &mut dyn WebRequest, params: NormalizedParameter,
) -> Result<AccessRequest, Error> {
    let auth = credentials(request, &params, endpoint.config())?;
    let client = client_with_secret(endpoint.storage(), &auth)?;

    let mut token = param(&params, "refresh_token");
    if token.is_empty() {
        token = request
            .cookie("refresh_token")
            .map(|value| value.into_owned())
            .unwrap_or_default();
    }
    if token.is_empty() {
        return Err(Error::new(ErrorCode::InvalidGrant, "refresh token is required"));
    }

    let access_data = match endpoint.storage().load_refresh(&token) {
        Ok(data) => data,
        Err(StorageError::NotFound) => {
            return Err(Error::new(ErrorCode::InvalidGrant, "refresh token is invalid"))
        }
        Err(err) => {
            return Err(Error::new(ErrorCode::ServerError, "error loading access data")
                .with_internal(err.to_string()))
        }
    };

    if access_data.client.redirect_uri().is_empty() {
        return Err(Error::new(ErrorCode::InvalidGrant, "access data has no redirect uri"));
    }
    if access_data.client.id() != client.id() {
        return Err(Error::new(
            ErrorCode::InvalidGrant,
            "client id must be the same from previous token",
        ));
    }

    // An omitted scope is treated as equal to the scope originally granted.
    let mut requested_scope = param(&params, "scope");
    if requested_scope.is_empty() {
        requested_scope = access_data.scope.clone();
    }
    if scope::has_extra(&access_data.scope, &requested_scope) {
        return Err(Error::new(
            ErrorCode::AccessDenied,
            "the requested scope must not include any scope not originally granted",
        ));
    }

    let mut access_request =
        AccessRequest::new(GrantType::RefreshToken, client, endpoint.config(), params);
    access_request.code = token;
    access_request.redirect_uri = access_data.redirect_uri.clone();
    access_request.user_data = access_data.user_data.clone();
    access_request.scope = requested_scope;
    access_request.access_data = Some(access_data);
    Ok(access_request)
}
