//! PKCE Generator
//!
//! RFC 7636 verifier/challenge pairs using the S256 method.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::types::PkceChallenge;

/// Minimum random bytes behind a verifier (43 encoded characters).
pub const MIN_VERIFIER_BYTES: usize = 32;

/// Maximum random bytes behind a verifier (128 encoded characters).
pub const MAX_VERIFIER_BYTES: usize = 96;

/// PKCE generator interface (for dependency injection).
pub trait PkceGenerator: Send + Sync {
    /// Generate a fresh verifier and its challenge.
    fn generate(&self) -> PkceChallenge;
}

/// `BASE64URL(SHA256(verifier))`, unpadded.
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Validate PKCE verifier format.
pub fn is_valid_verifier(verifier: &str) -> bool {
    // RFC 7636: 43-128 unreserved characters
    (43..=128).contains(&verifier.len())
        && verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
}

/// Verifiers drawn from the OS-seeded thread RNG.
#[derive(Debug, Clone)]
pub struct RandomPkceGenerator {
    verifier_bytes: usize,
}

impl RandomPkceGenerator {
    pub fn new() -> Self {
        Self {
            verifier_bytes: MIN_VERIFIER_BYTES,
        }
    }

    /// Number of random bytes per verifier, clamped to `32..=96`.
    pub fn with_bytes(bytes: usize) -> Self {
        Self {
            verifier_bytes: bytes.clamp(MIN_VERIFIER_BYTES, MAX_VERIFIER_BYTES),
        }
    }
}

impl Default for RandomPkceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PkceGenerator for RandomPkceGenerator {
    fn generate(&self) -> PkceChallenge {
        let mut bytes = vec![0u8; self.verifier_bytes];
        rand::thread_rng().fill_bytes(&mut bytes);

        let code_verifier = URL_SAFE_NO_PAD.encode(&bytes);
        let code_challenge = compute_challenge(&code_verifier);

        PkceChallenge {
            code_verifier,
            code_challenge,
        }
    }
}

/// Generator that always yields the same verifier, for tests.
#[derive(Debug, Clone)]
pub struct FixedPkceGenerator {
    verifier: String,
}

impl FixedPkceGenerator {
    pub fn new(verifier: impl Into<String>) -> Self {
        Self {
            verifier: verifier.into(),
        }
    }
}

impl PkceGenerator for FixedPkceGenerator {
    fn generate(&self) -> PkceChallenge {
        PkceChallenge {
            code_verifier: self.verifier.clone(),
            code_challenge: compute_challenge(&self.verifier),
        }
    }
}
