//! The persistence contract consumed by the grant flows.
//!
//! Single-use enforcement of codes and refresh tokens is delegated to the
//! backend: loading a record does not consume it, the finalizer removes the
//! predecessor after the successor was persisted. A backend may serialize
//! concurrent redemptions of the same code with a row lock, this crate only
//! relies on the remove operations.
use std::collections::HashMap;
use std::error;
use std::fmt;
use std::sync::{Arc, RwLock};

use super::client::{Client, SharedClient};
use super::grant::{AccessData, AuthorizeData};

/// Failure of a storage operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StorageError {
    /// The requested record does not exist.
    ///
    /// Kept distinguishable from other failures so the flows can map a
    /// missing record to the protocol error the grant prescribes instead of
    /// a generic server error.
    NotFound,

    /// The backend failed. The message is retained for internal logging and
    /// never surfaced to clients.
    Internal(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StorageError::NotFound => write!(f, "record not found"),
            StorageError::Internal(message) => write!(f, "storage failure: {}", message),
        }
    }
}

impl error::Error for StorageError {}

/// The storage operations the token endpoint depends on.
pub trait Storage {
    /// Look up a client by its identifier.
    fn client(&self, id: &str) -> Result<SharedClient, StorageError>;

    /// Load the record of a previously issued authorization code.
    fn load_authorize(&self, code: &str) -> Result<AuthorizeData, StorageError>;

    /// Invalidate an authorization code after it was redeemed.
    fn remove_authorize(&self, code: &str) -> Result<(), StorageError>;

    /// Load an access record by its refresh token.
    fn load_refresh(&self, refresh_token: &str) -> Result<AccessData, StorageError>;

    /// Persist a freshly minted access record.
    fn save_access(&self, data: &AccessData) -> Result<(), StorageError>;

    /// Remove an access record by its access token.
    fn remove_access(&self, access_token: &str) -> Result<(), StorageError>;
}

impl<'s, S: Storage + ?Sized> Storage for &'s S {
    fn client(&self, id: &str) -> Result<SharedClient, StorageError> {
        (**self).client(id)
    }

    fn load_authorize(&self, code: &str) -> Result<AuthorizeData, StorageError> {
        (**self).load_authorize(code)
    }

    fn remove_authorize(&self, code: &str) -> Result<(), StorageError> {
        (**self).remove_authorize(code)
    }

    fn load_refresh(&self, refresh_token: &str) -> Result<AccessData, StorageError> {
        (**self).load_refresh(refresh_token)
    }

    fn save_access(&self, data: &AccessData) -> Result<(), StorageError> {
        (**self).save_access(data)
    }

    fn remove_access(&self, access_token: &str) -> Result<(), StorageError> {
        (**self).remove_access(access_token)
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn client(&self, id: &str) -> Result<SharedClient, StorageError> {
        (**self).client(id)
    }

    fn load_authorize(&self, code: &str) -> Result<AuthorizeData, StorageError> {
        (**self).load_authorize(code)
    }

    fn remove_authorize(&self, code: &str) -> Result<(), StorageError> {
        (**self).remove_authorize(code)
    }

    fn load_refresh(&self, refresh_token: &str) -> Result<AccessData, StorageError> {
        (**self).load_refresh(refresh_token)
    }

    fn save_access(&self, data: &AccessData) -> Result<(), StorageError> {
        (**self).save_access(data)
    }

    fn remove_access(&self, access_token: &str) -> Result<(), StorageError> {
        (**self).remove_access(access_token)
    }
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn client(&self, id: &str) -> Result<SharedClient, StorageError> {
        (**self).client(id)
    }

    fn load_authorize(&self, code: &str) -> Result<AuthorizeData, StorageError> {
        (**self).load_authorize(code)
    }

    fn remove_authorize(&self, code: &str) -> Result<(), StorageError> {
        (**self).remove_authorize(code)
    }

    fn load_refresh(&self, refresh_token: &str) -> Result<AccessData, StorageError> {
        (**self).load_refresh(refresh_token)
    }

    fn save_access(&self, data: &AccessData) -> Result<(), StorageError> {
        (**self).save_access(data)
    }

    fn remove_access(&self, access_token: &str) -> Result<(), StorageError> {
        (**self).remove_access(access_token)
    }
}

/// A very simple, in-memory storage backend.
///
/// Suitable for tests and prototyping. Access records are indexed by access
/// token with a secondary index from refresh token to access token, the
/// same layout a database backend would use.
#[derive(Default)]
pub struct MemStorage {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    clients: HashMap<String, SharedClient>,
    authorize: HashMap<String, AuthorizeData>,
    access: HashMap<String, AccessData>,
    refresh: HashMap<String, String>,
}

impl MemStorage {
    /// Create an empty storage without any clients in it.
    pub fn new() -> MemStorage {
        MemStorage::default()
    }

    /// Insert or update a client record.
    pub fn register_client<C: Client + 'static>(&self, client: C) {
        let client: SharedClient = Arc::new(client);
        if let Ok(mut inner) = self.inner.write() {
            inner.clients.insert(client.id().to_string(), client);
        }
    }

    /// Store the record of an issued authorization code.
    ///
    /// The front-channel endpoint issuing codes is outside this crate, so
    /// callers seed codes directly.
    pub fn save_authorize(&self, data: AuthorizeData) {
        if let Ok(mut inner) = self.inner.write() {
            inner.authorize.insert(data.code.clone(), data);
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<Inner>, StorageError> {
        self.inner
            .read()
            .map_err(|_| StorageError::Internal("storage lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<Inner>, StorageError> {
        self.inner
            .write()
            .map_err(|_| StorageError::Internal("storage lock poisoned".to_string()))
    }
}

impl Storage for MemStorage {
    fn client(&self, id: &str) -> Result<SharedClient, StorageError> {
        self.read()?
            .clients
            .get(id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn load_authorize(&self, code: &str) -> Result<AuthorizeData, StorageError> {
        self.read()?
            .authorize
            .get(code)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn remove_authorize(&self, code: &str) -> Result<(), StorageError> {
        self.write()?
            .authorize
            .remove(code)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    fn load_refresh(&self, refresh_token: &str) -> Result<AccessData, StorageError> {
        let inner = self.read()?;
        let access_token = inner.refresh.get(refresh_token).ok_or(StorageError::NotFound)?;
        inner
            .access
            .get(access_token)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn save_access(&self, data: &AccessData) -> Result<(), StorageError> {
        let mut inner = self.write()?;
        if data.refreshable() {
            inner
                .refresh
                .insert(data.refresh_token.clone(), data.access_token.clone());
        }
        inner.access.insert(data.access_token.clone(), data.clone());
        Ok(())
    }

    fn remove_access(&self, access_token: &str) -> Result<(), StorageError> {
        let mut inner = self.write()?;
        let removed = inner.access.remove(access_token).ok_or(StorageError::NotFound)?;
        if removed.refreshable() {
            inner.refresh.remove(&removed.refresh_token);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::client::ClientRecord;
    use chrono::Utc;

    fn example_access(access_token: &str, refresh_token: &str) -> AccessData {
        AccessData {
            client: Arc::new(ClientRecord::new("c1", "s1", "https://client.example/cb")),
            authorize_data: None,
            access_data: None,
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_in: 3600,
            refresh_expires_in: 86400,
            scope: "read".to_string(),
            redirect_uri: "https://client.example/cb".to_string(),
            created_at: Utc::now(),
            user_data: None,
        }
    }

    #[test]
    fn clients_roundtrip() {
        let storage = MemStorage::new();
        storage.register_client(ClientRecord::new("c1", "s1", "https://client.example/cb"));

        let client = storage.client("c1").unwrap();
        assert_eq!(client.id(), "c1");
        assert_eq!(storage.client("c2").unwrap_err(), StorageError::NotFound);
    }

    #[test]
    fn authorize_is_single_use() {
        let storage = MemStorage::new();
        let client = Arc::new(ClientRecord::new("c1", "s1", "https://client.example/cb"));
        storage.save_authorize(AuthorizeData {
            client,
            code: "C".to_string(),
            expires_in: 60,
            scope: String::new(),
            redirect_uri: "https://client.example/cb".to_string(),
            created_at: Utc::now(),
            user_data: None,
            code_challenge: String::new(),
            code_challenge_method: String::new(),
        });

        assert!(storage.load_authorize("C").is_ok());
        storage.remove_authorize("C").unwrap();
        assert_eq!(storage.load_authorize("C").unwrap_err(), StorageError::NotFound);
        assert_eq!(storage.remove_authorize("C").unwrap_err(), StorageError::NotFound);
    }

    #[test]
    fn refresh_index_follows_access_record() {
        let storage = MemStorage::new();
        storage.save_access(&example_access("at1", "rt1")).unwrap();

        let loaded = storage.load_refresh("rt1").unwrap();
        assert_eq!(loaded.access_token, "at1");

        storage.remove_access("at1").unwrap();
        assert_eq!(storage.load_refresh("rt1").unwrap_err(), StorageError::NotFound);
    }

    #[test]
    fn unrefreshable_record_has_no_index() {
        let storage = MemStorage::new();
        storage.save_access(&example_access("at1", "")).unwrap();
        assert_eq!(storage.load_refresh("").unwrap_err(), StorageError::NotFound);
    }
}
