#![allow(dead_code)]
//! Crafted request/response harness shared by the integration suites.
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{TimeZone, Utc};

use grantor::access::{
    access_request, finish_access_request, AccessRequest, BearerToken, Error, GrantType,
    TokenCookie,
};
use grantor::config::Config;
use grantor::endpoint::{Generic, QueryParameter, WebRequest, WebResponse};
use grantor::primitives::client::ClientRecord;
use grantor::primitives::generator::RandomGenerator;
use grantor::primitives::grant::{AccessData, AuthorizeData};
use grantor::primitives::storage::{MemStorage, Storage, StorageError};
use grantor::primitives::Time;

pub const CLIENT_ID: &str = "c1";
pub const CLIENT_SECRET: &str = "s1";
pub const REDIRECT_URI: &str = "https://x/cb";
pub const SCOPE: &str = "read,write";

// base64url(sha256("abc")), matching the verifier "abc".
pub const S256_CHALLENGE: &str = "ungWv48Bz-pBQUDeXa4iI7ADYaOWF3qctBD_YfIAFa0";

/// The instant all test endpoints consider to be now.
pub fn fixed_now() -> Time {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn basic_authorization(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

/// Open and simple implementation of `WebRequest`.
#[derive(Clone, Debug)]
pub struct CraftedRequest {
    /// The HTTP method of the request.
    pub method: &'static str,

    /// The key-value pairs in the url query component.
    pub query: Option<HashMap<String, String>>,

    /// The key-value pairs of a `x-www-form-urlencoded` body.
    pub urlbody: Option<HashMap<String, String>>,

    /// Provided authorization header.
    pub auth: Option<String>,

    /// Cookies sent along with the request.
    pub cookies: HashMap<String, String>,
}

impl Default for CraftedRequest {
    fn default() -> CraftedRequest {
        CraftedRequest {
            method: "POST",
            query: None,
            urlbody: None,
            auth: None,
            cookies: HashMap::new(),
        }
    }
}

impl CraftedRequest {
    /// A `POST` request carrying the given form body.
    pub fn post(body: &[(&str, &str)]) -> CraftedRequest {
        CraftedRequest {
            urlbody: Some(to_map(body)),
            ..CraftedRequest::default()
        }
    }

    /// A `GET` request carrying the given query.
    pub fn get(query: &[(&str, &str)]) -> CraftedRequest {
        CraftedRequest {
            method: "GET",
            query: Some(to_map(query)),
            ..CraftedRequest::default()
        }
    }

    pub fn with_auth(mut self, auth: String) -> CraftedRequest {
        self.auth = Some(auth);
        self
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> CraftedRequest {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }
}

pub fn to_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|&(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

impl WebRequest for CraftedRequest {
    fn method(&self) -> Cow<str> {
        Cow::Borrowed(self.method)
    }

    fn query(&mut self) -> Result<Cow<dyn QueryParameter + 'static>, ()> {
        self.query
            .as_ref()
            .map(|map| Cow::Borrowed(map as &dyn QueryParameter))
            .ok_or(())
    }

    fn urlbody(&mut self) -> Result<Cow<dyn QueryParameter + 'static>, ()> {
        self.urlbody
            .as_ref()
            .map(|map| Cow::Borrowed(map as &dyn QueryParameter))
            .ok_or(())
    }

    fn authheader(&mut self) -> Result<Option<Cow<str>>, ()> {
        Ok(self.auth.as_deref().map(Cow::Borrowed))
    }

    fn cookie(&mut self, name: &str) -> Option<Cow<str>> {
        self.cookies.get(name).map(|value| Cow::Borrowed(value.as_str()))
    }
}

/// An enum containing the necessary response status codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,
    BadRequest,
    Unauthorized,
    ServerError,
}

impl Default for Status {
    fn default() -> Status {
        Status::Ok
    }
}

/// Open and simple implementation of `WebResponse`.
#[derive(Debug, Default)]
pub struct CraftedResponse {
    pub status: Status,
    pub www_authenticate: Option<String>,
    pub body: Option<String>,
    pub cookies: Vec<TokenCookie>,
}

impl WebResponse for CraftedResponse {
    type Error = ();

    fn ok(&mut self) -> Result<(), ()> {
        self.status = Status::Ok;
        Ok(())
    }

    fn client_error(&mut self) -> Result<(), ()> {
        self.status = Status::BadRequest;
        Ok(())
    }

    fn unauthorized(&mut self, header_value: &str) -> Result<(), ()> {
        self.status = Status::Unauthorized;
        self.www_authenticate = Some(header_value.to_string());
        Ok(())
    }

    fn server_error(&mut self) -> Result<(), ()> {
        self.status = Status::ServerError;
        Ok(())
    }

    fn body_json(&mut self, data: &str) -> Result<(), ()> {
        self.body = Some(data.to_string());
        Ok(())
    }

    fn set_cookie(&mut self, cookie: &TokenCookie) -> Result<(), ()> {
        self.cookies.push(cookie.clone());
        Ok(())
    }
}

/// Storage wrapper with injectable failures.
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: MemStorage,
    pub fail_save: AtomicBool,
    pub fail_remove_authorize: AtomicBool,
}

impl Storage for FlakyStorage {
    fn client(&self, id: &str) -> Result<grantor::primitives::client::SharedClient, StorageError> {
        self.inner.client(id)
    }

    fn load_authorize(&self, code: &str) -> Result<AuthorizeData, StorageError> {
        self.inner.load_authorize(code)
    }

    fn remove_authorize(&self, code: &str) -> Result<(), StorageError> {
        if self.fail_remove_authorize.load(Ordering::SeqCst) {
            return Err(StorageError::Internal("injected remove failure".to_string()));
        }
        self.inner.remove_authorize(code)
    }

    fn load_refresh(&self, refresh_token: &str) -> Result<AccessData, StorageError> {
        self.inner.load_refresh(refresh_token)
    }

    fn save_access(&self, data: &AccessData) -> Result<(), StorageError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(StorageError::Internal("injected save failure".to_string()));
        }
        self.inner.save_access(data)
    }

    fn remove_access(&self, access_token: &str) -> Result<(), StorageError> {
        self.inner.remove_access(access_token)
    }
}

/// A configuration answering every grant this server knows.
pub fn all_grants_config() -> Config {
    Config {
        allowed_access_types: vec![
            GrantType::AuthorizationCode,
            GrantType::RefreshToken,
            GrantType::Password,
            GrantType::ClientCredentials,
            GrantType::Assertion,
            GrantType::Anonymous,
            GrantType::Device,
            GrantType::Platform,
        ],
        ..Config::default()
    }
}

pub fn example_client() -> ClientRecord {
    ClientRecord::new(CLIENT_ID, CLIENT_SECRET, REDIRECT_URI)
}

/// An authorize record for `code`, redeemable at `fixed_now`.
pub fn example_authorize(code: &str) -> AuthorizeData {
    AuthorizeData {
        client: Arc::new(example_client()),
        code: code.to_string(),
        expires_in: 3600,
        scope: SCOPE.to_string(),
        redirect_uri: REDIRECT_URI.to_string(),
        created_at: fixed_now(),
        user_data: None,
        code_challenge: String::new(),
        code_challenge_method: String::new(),
    }
}

/// An access record owned by the example client.
pub fn example_access(access_token: &str, refresh_token: &str, scope: &str) -> AccessData {
    AccessData {
        client: Arc::new(example_client()),
        authorize_data: None,
        access_data: None,
        access_token: access_token.to_string(),
        refresh_token: refresh_token.to_string(),
        expires_in: 3600,
        refresh_expires_in: 86400,
        scope: scope.to_string(),
        redirect_uri: REDIRECT_URI.to_string(),
        created_at: fixed_now(),
        user_data: None,
    }
}

/// Harness tying an endpoint with in-memory storage to the two-phase flow.
pub struct Setup {
    pub endpoint: Generic<MemStorage, RandomGenerator>,
}

impl Setup {
    /// An endpoint with the example client registered and all grants allowed.
    pub fn new() -> Setup {
        Setup::with_config(all_grants_config())
    }

    pub fn with_config(config: Config) -> Setup {
        let storage = MemStorage::new();
        storage.register_client(example_client());

        let mut endpoint = Generic::new(config, storage, RandomGenerator::new(16));
        endpoint.set_clock(fixed_now);
        Setup { endpoint }
    }

    pub fn storage(&self) -> &MemStorage {
        &self.endpoint.storage
    }

    /// Run the first phase.
    pub fn request(&mut self, request: &mut CraftedRequest) -> Result<AccessRequest, Error> {
        access_request(&mut self.endpoint, request)
    }

    /// Run both phases with the caller approving the request in between.
    pub fn run_authorized(&mut self, request: &mut CraftedRequest) -> Result<BearerToken, Error> {
        let mut access_request = self.request(request)?;
        access_request.authorized = true;
        finish_access_request(&mut self.endpoint, access_request)
    }

    pub fn finish(&mut self, request: AccessRequest) -> Result<BearerToken, Error> {
        finish_access_request(&mut self.endpoint, request)
    }
}
