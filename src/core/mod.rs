//! Core infrastructure: HTTP transport and PKCE generation.

pub mod pkce;
pub mod transport;

pub use pkce::{
    compute_challenge, is_valid_verifier, FixedPkceGenerator, PkceGenerator, RandomPkceGenerator,
};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport, ReqwestHttpTransport,
};
