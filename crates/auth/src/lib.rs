//! `civica-auth` — identity boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage: token
//! signature checking is behind a trait, claim validation is a pure function,
//! and the role vocabulary is a closed set.

pub mod claims;
pub mod roles;
pub mod token;

pub use claims::{validate_claims, IdentityClaim, TokenClaims, TokenValidationError};
pub use roles::{Role, UnknownRole};
pub use token::{Hs256JwtValidator, JwtValidator};
