//! Generators mint the access and refresh token strings for a grant.
//!
//! Two implementations exist:
//!     - `RandomGenerator` depends on the entropy of the generated token to
//!     make guessing infeasible.
//!     - `Assertion` cryptographically verifies the integrity of a token,
//!     trading revocability for the ability to validate tokens without a
//!     storage lookup.
use std::sync::atomic::{AtomicU64, Ordering};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::grant::AccessData;

/// An access/refresh token pair produced by a generator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenPair {
    /// The access token string.
    pub access: String,

    /// The refresh token string, empty when none was requested.
    pub refresh: String,
}

impl TokenPair {
    /// Construct a pair without a refresh token.
    pub fn without_refresh(access: String) -> TokenPair {
        TokenPair {
            access,
            refresh: String::new(),
        }
    }

    /// Whether this pair carries a refresh token.
    pub fn refreshable(&self) -> bool {
        !self.refresh.is_empty()
    }
}

/// Mints the token strings for an access record.
///
/// When queried without repetition the produced strings MUST be
/// indistinguishable from a random function. This permits two popular
/// choices: actual signature schemes over the record parameters and
/// (pseudo-)random generators that ignore all input.
pub trait TokenGenerator {
    /// Produce the token strings for `data`.
    ///
    /// The refresh half of the pair is left empty unless `generate_refresh`
    /// is set. An `Err` aborts the grant with a server error.
    fn generate(&mut self, data: &AccessData, generate_refresh: bool) -> Result<TokenPair, ()>;
}

impl<'a, G: TokenGenerator + ?Sized + 'a> TokenGenerator for &'a mut G {
    fn generate(&mut self, data: &AccessData, generate_refresh: bool) -> Result<TokenPair, ()> {
        (**self).generate(data, generate_refresh)
    }
}

impl<G: TokenGenerator + ?Sized> TokenGenerator for Box<G> {
    fn generate(&mut self, data: &AccessData, generate_refresh: bool) -> Result<TokenPair, ()> {
        (**self).generate(data, generate_refresh)
    }
}

/// Generates tokens from random bytes.
///
/// Bytes are drawn from the operating system generator, the record contents
/// do not influence the result.
pub struct RandomGenerator {
    len: usize,
}

impl RandomGenerator {
    /// Generates tokens with a specific byte length of entropy.
    pub fn new(length: usize) -> RandomGenerator {
        RandomGenerator { len: length }
    }

    fn random_token(&self) -> Result<String, ()> {
        let mut bytes = vec![0; self.len];
        OsRng.try_fill_bytes(bytes.as_mut_slice()).map_err(|_| ())?;
        Ok(URL_SAFE_NO_PAD.encode(&bytes))
    }
}

impl TokenGenerator for RandomGenerator {
    fn generate(&mut self, _: &AccessData, generate_refresh: bool) -> Result<TokenPair, ()> {
        let access = self.random_token()?;
        if !generate_refresh {
            return Ok(TokenPair::without_refresh(access));
        }

        Ok(TokenPair {
            access,
            refresh: self.random_token()?,
        })
    }
}

/// Generates tokens by signing the grant parameters with a private key.
///
/// Tokens produced by this generator carry a compact claim encoding of the
/// grant followed by an HMAC-SHA256 signature, so a holder of the key can
/// check a token's integrity without a storage round trip. The `user_data`
/// payload is not part of the claims, it stays server-side only.
pub struct Assertion {
    hasher: Hmac<Sha256>,
    counter: AtomicU64,
}

/// The claims recovered from a signed token.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenClaims {
    /// Usage tag, `access` or `refresh`.
    pub tag: String,

    /// Anti-collision counter, unique per signing operation.
    pub counter: u64,

    /// The client the grant was issued to.
    pub client_id: String,

    /// The granted scope.
    pub scope: String,

    /// The redirect address of the grant.
    pub redirect_uri: String,

    /// Creation instant as a unix timestamp.
    pub created_at: i64,

    /// Lifetime in seconds of the tagged token.
    pub expires_in: i64,
}

#[derive(Deserialize, Serialize)]
struct SignedToken(Vec<u8>, Vec<u8>);

impl Assertion {
    /// Construct an assertion generator from a private signing key.
    ///
    /// Never use a password alone as the key. Generate the material with a
    /// utility such as `openssl rand` and store it away securely.
    pub fn new(key: &[u8]) -> Assertion {
        Assertion {
            hasher: Hmac::<Sha256>::new_from_slice(key).expect("HMAC-SHA256 accepts any key length"),
            counter: AtomicU64::new(0),
        }
    }

    /// Construct a generator whose tokens only live for the program execution.
    pub fn ephemeral() -> Assertion {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Assertion::new(&key)
    }

    /// Verify a token signature and recover its claims.
    pub fn extract(&self, token: &str) -> Result<TokenClaims, ()> {
        let decoded = URL_SAFE_NO_PAD.decode(token).map_err(|_| ())?;
        let SignedToken(payload, signature) = rmp_serde::from_slice(&decoded).map_err(|_| ())?;

        let mut hasher = self.hasher.clone();
        hasher.update(&payload);
        hasher.verify_slice(&signature).map_err(|_| ())?;

        rmp_serde::from_slice(&payload).map_err(|_| ())
    }

    fn sign(&self, tag: &str, counter: u64, data: &AccessData) -> Result<String, ()> {
        let expires_in = match tag {
            "refresh" => data.refresh_expires_in,
            _ => data.expires_in,
        };
        let claims = TokenClaims {
            tag: tag.to_string(),
            counter,
            client_id: data.client.id().to_string(),
            scope: data.scope.clone(),
            redirect_uri: data.redirect_uri.clone(),
            created_at: data.created_at.timestamp(),
            expires_in,
        };

        let payload = rmp_serde::to_vec(&claims).map_err(|_| ())?;
        let mut hasher = self.hasher.clone();
        hasher.update(&payload);
        let signature = hasher.finalize().into_bytes().to_vec();

        let token = rmp_serde::to_vec(&SignedToken(payload, signature)).map_err(|_| ())?;
        Ok(URL_SAFE_NO_PAD.encode(&token))
    }

    fn next_counter(&self) -> u64 {
        // Each value must occur at most once, ordering between threads does
        // not matter.
        self.counter.fetch_add(2, Ordering::Relaxed)
    }
}

impl TokenGenerator for Assertion {
    fn generate(&mut self, data: &AccessData, generate_refresh: bool) -> Result<TokenPair, ()> {
        let counter = self.next_counter();
        let access = self.sign("access", counter, data)?;
        if !generate_refresh {
            return Ok(TokenPair::without_refresh(access));
        }

        Ok(TokenPair {
            access,
            refresh: self.sign("refresh", counter.wrapping_add(1), data)?,
        })
    }
}
