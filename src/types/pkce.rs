//! PKCE verifier/challenge pair.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Code challenge method sent with the authorization URL.
pub const CODE_CHALLENGE_METHOD: &str = "S256";

/// A verifier and its S256 challenge, persisted between issuing the
/// authorization URL and exchanging the code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}
