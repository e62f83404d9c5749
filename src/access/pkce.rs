//! Verification half of Proof Key for Code Exchange.
//!
//! > OAuth 2.0 public clients utilizing the Authorization Code Grant are
//! susceptible to the authorization code interception attack. This
//! specification describes the attack as well as a technique to mitigate
//! against the threat through the use of Proof Key for Code Exchange
//! (PKCE, pronounced "pixy").
//!
//! (from the respective [RFC 7636])
//!
//! Issuing the challenge happens on the front channel and is outside this
//! crate. Here the submitted verifier is transformed with the method the
//! challenge was stored under and compared against it.
//!
//! [RFC 7636]: https://tools.ietf.org/html/rfc7636
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::error::{Error, ErrorCode};

/// Verify a submitted code verifier against the stored challenge.
///
/// An empty method defaults to `plain`, where the transformed verifier is
/// the verifier itself. Under `S256` the verifier is hashed with SHA-256
/// and base64url-encoded without padding. Any other method is unsupported.
pub fn verify_code_challenge(challenge: &str, method: &str, verifier: &str) -> Result<(), Error> {
    let transformed = match method {
        "" | "plain" => verifier.to_string(),
        "S256" => {
            let digest = Sha256::digest(verifier.as_bytes());
            URL_SAFE_NO_PAD.encode(digest)
        }
        _ => {
            return Err(Error::new(
                ErrorCode::InvalidRequest,
                "transform algorithm not supported",
            ))
        }
    };

    if transformed.as_bytes().ct_eq(challenge.as_bytes()).into() {
        Ok(())
    } else {
        Err(Error::new(
            ErrorCode::InvalidGrant,
            "code verifier failed comparison with the stored challenge",
        ))
    }
}
