//! The first-party grants `anonymous`, `device` and `platform`, plus
//! deterministic replay through `force_access_data`.
mod support;

use grantor::access::{ErrorCode, GrantType};
use grantor::primitives::storage::Storage;

use support::*;

#[test]
fn anonymous_grant_carries_the_user_id() {
    let mut setup = Setup::new();
    let mut request = CraftedRequest::post(&[("grant_type", "anonymous"), ("user_id", "visitor-7")])
        .with_auth(basic_authorization(CLIENT_ID, CLIENT_SECRET));

    let mut access_request = setup.request(&mut request).unwrap();
    assert_eq!(access_request.grant_type, GrantType::Anonymous);
    assert_eq!(access_request.username, "visitor-7");
    assert_eq!(access_request.redirect_uri, REDIRECT_URI);

    access_request.authorized = true;
    let token = setup.finish(access_request).unwrap();
    assert!(token.response.refresh_token.is_some());
}

#[test]
fn anonymous_grant_requires_the_client_secret() {
    let mut setup = Setup::new();
    let mut request = CraftedRequest::post(&[("grant_type", "anonymous"), ("user_id", "visitor-7")])
        .with_auth(basic_authorization(CLIENT_ID, "wrong"));

    let error = setup.run_authorized(&mut request).unwrap_err();
    assert_eq!(error.kind(), ErrorCode::InvalidClient);
}

#[test]
fn device_grant_passes_the_device_id_through_the_password_slot() {
    let mut setup = Setup::new();
    let mut request = CraftedRequest::post(&[("grant_type", "device"), ("device_id", "dev-123")])
        .with_auth(basic_authorization(CLIENT_ID, CLIENT_SECRET));

    let mut access_request = setup.request(&mut request).unwrap();
    assert_eq!(access_request.grant_type, GrantType::Device);
    assert_eq!(access_request.password, "dev-123");
    assert!(access_request.username.is_empty());

    // The caller recognized the device.
    access_request.authorized = true;
    assert!(setup.finish(access_request).is_ok());
}

#[test]
fn platform_grant_authenticates_with_basic_auth() {
    let mut setup = Setup::new();
    let mut request =
        CraftedRequest::post(&[("grant_type", "platform"), ("platform_token", "plat-9")])
            .with_auth(basic_authorization(CLIENT_ID, CLIENT_SECRET));

    let access_request = setup.request(&mut request).unwrap();
    assert_eq!(access_request.grant_type, GrantType::Platform);
    assert_eq!(access_request.password, "plat-9");
}

#[test]
fn platform_grant_accepts_public_clients() {
    let mut setup = Setup::new();
    let mut request = CraftedRequest::post(&[
        ("grant_type", "platform"),
        ("platform_token", "plat-9"),
        ("client_id", CLIENT_ID),
    ]);

    let access_request = setup.request(&mut request).unwrap();
    assert_eq!(access_request.client.id(), CLIENT_ID);

    // Without a header and without a client_id there is nothing to resolve.
    let mut request =
        CraftedRequest::post(&[("grant_type", "platform"), ("platform_token", "plat-9")]);
    let error = setup.request(&mut request).unwrap_err();
    assert_eq!(error.kind(), ErrorCode::InvalidRequest);
}

#[test]
fn unknown_public_platform_client() {
    let mut setup = Setup::new();
    let mut request = CraftedRequest::post(&[
        ("grant_type", "platform"),
        ("platform_token", "plat-9"),
        ("client_id", "ghost"),
    ]);

    let error = setup.request(&mut request).unwrap_err();
    assert_eq!(error.kind(), ErrorCode::UnauthorizedClient);
}

#[test]
fn forced_access_data_is_issued_verbatim() {
    let mut setup = Setup::new();
    let mut request = CraftedRequest::post(&[("grant_type", "anonymous"), ("user_id", "visitor-7")])
        .with_auth(basic_authorization(CLIENT_ID, CLIENT_SECRET));

    let mut access_request = setup.request(&mut request).unwrap();
    access_request.authorized = true;
    access_request.force_access_data = Some(example_access("forced-at", "forced-rt", SCOPE));

    let token = setup.finish(access_request).unwrap();
    assert_eq!(token.response.access_token, "forced-at");
    assert_eq!(token.response.refresh_token.as_deref(), Some("forced-rt"));

    // The forced record was persisted as-is.
    let stored = setup.storage().load_refresh("forced-rt").unwrap();
    assert_eq!(stored.access_token, "forced-at");
    assert_eq!(stored.created_at, fixed_now());
}

#[test]
fn user_data_attached_by_the_caller_is_persisted() {
    let mut setup = Setup::new();
    let mut request = CraftedRequest::post(&[("grant_type", "device"), ("device_id", "dev-123")])
        .with_auth(basic_authorization(CLIENT_ID, CLIENT_SECRET));

    let mut access_request = setup.request(&mut request).unwrap();
    access_request.authorized = true;
    access_request.user_data = Some(serde_json::json!({"device": "dev-123"}));

    let token = setup.finish(access_request).unwrap();
    let stored = setup
        .storage()
        .load_refresh(token.response.refresh_token.as_ref().unwrap())
        .unwrap();
    assert_eq!(stored.user_data, Some(serde_json::json!({"device": "dev-123"})));
}
