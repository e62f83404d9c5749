//! # grantor
//!
//! The token-endpoint core of an OAuth2 authorization server, with
//! pluggable storage and token-generation back-ends.
//!
//! ## About
//!
//! `grantor` implements the back-channel half of an authorization server:
//! receiving a `grant_type` request, authenticating the client, enforcing
//! the verification rules of the individual grant (PKCE for the code
//! exchange, scope-subset on refresh, credential presence for the password
//! grant) and, once the embedding application marks the request as
//! authorized, minting and persisting an access/refresh token pair. The
//! front channel (issuing authorization codes, rendering consent pages)
//! is deliberately not part of this crate.
//!
//! The interface is designed around traits in both directions. Towards the
//! web server a request is anything implementing [`WebRequest`] and the
//! outcome is written onto any [`WebResponse`], so the crate binds to any
//! HTTP library. Towards the back-end, [`Storage`], [`TokenGenerator`] and
//! [`Client`] describe the persistence and policy primitives; in-memory
//! reference implementations are provided for each.
//!
//! ## Handling a token request
//!
//! A request passes through two phases with the application in between:
//!
//! 1. [`access::access_request`] dispatches on the `grant_type`, resolves
//!    the client and loads the dependent records. It returns an
//!    [`access::AccessRequest`] describing what the client asks for.
//! 2. The application inspects the request (this is where resource owner
//!    credentials of the `password` grant or the device id of the `device`
//!    grant are checked) and sets its `authorized` flag.
//! 3. [`access::finish_access_request`] turns the decision into effect:
//!    tokens are generated and saved, the redeemed authorization code and
//!    the refreshed predecessor token are invalidated, and the bearer
//!    token response with its cookies is assembled.
//!
//! Grants understood by the dispatcher: `authorization_code`,
//! `refresh_token`, `password`, `client_credentials`, `assertion`, plus
//! the first-party extension grants `anonymous`, `device` and `platform`.
//! The configured allow-list decides which of them a deployment answers.
//!
//! ## Using the primitives
//!
//! All [`primitives`] can be used independently of the endpoint module.
//! Custom implementations of the traits can be used directly with the
//! flows, for example a database-backed [`Storage`] or a signing
//! [`TokenGenerator`] whose tokens can be validated without a storage
//! round trip.
//!
//! [`WebRequest`]: endpoint/trait.WebRequest.html
//! [`WebResponse`]: endpoint/trait.WebResponse.html
//! [`Storage`]: primitives/storage/trait.Storage.html
//! [`TokenGenerator`]: primitives/generator/trait.TokenGenerator.html
//! [`Client`]: primitives/client/trait.Client.html
//! [`access::access_request`]: access/fn.access_request.html
//! [`access::AccessRequest`]: access/struct.AccessRequest.html
//! [`access::finish_access_request`]: access/fn.finish_access_request.html
//! [`primitives`]: primitives/index.html
#![warn(missing_docs)]

pub mod access;
pub mod config;
pub mod endpoint;
pub mod primitives;
