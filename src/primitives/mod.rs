//! A collection of primitives shared by the grant handling flows.
//!
//! A primitive is the smallest independent unit of policy used by the token
//! endpoint. Clients, storage and token generation are all modelled as
//! traits, so a deployment can swap the in-memory reference implementations
//! for database backed or cryptographically signing ones without touching
//! the flow logic in [`access`].
//!
//! [`access`]: ../access/index.html

use chrono::DateTime;
use chrono::Utc;

pub mod client;
pub mod generator;
pub mod grant;
pub mod scope;
pub mod storage;

/// Point in time used for all record stamps and expiration checks.
///
/// All instants flowing through the crate originate from the endpoint's
/// `now` hook, never from an ambient clock call inside a flow.
pub type Time = DateTime<Utc>;

/// Commonly used primitives for endpoints and backends.
pub mod prelude {
    pub use super::client::{Client, ClientRecord, SharedClient};
    pub use super::generator::{Assertion, RandomGenerator, TokenGenerator, TokenPair};
    pub use super::grant::{AccessData, AuthorizeData};
    pub use super::storage::{MemStorage, Storage, StorageError};
}
