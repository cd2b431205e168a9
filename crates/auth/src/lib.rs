//! `bodega-auth` — pure authentication boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod roles;
pub mod validator;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use roles::Role;
pub use validator::{Hs256JwtValidator, JwtValidator};
