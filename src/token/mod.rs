//! Token Management
//!
//! Token persistence and the authenticator state machine.

pub mod authenticator;
pub mod storage;

pub use authenticator::{AuthState, AuthStatus, TokenAuthenticator};
pub use storage::{FileTokenStore, InMemoryTokenStore, TokenStore};
