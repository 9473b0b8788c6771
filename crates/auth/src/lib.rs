//! `storefront-auth` — accounts, credentials and session tokens.
//!
//! This crate is intentionally decoupled from HTTP and storage: it validates
//! registration input, hashes and verifies passwords, and issues/validates the
//! JWT access and refresh tokens the API layer hands out.

pub mod account;
pub mod claims;
pub mod error;
pub mod jwt;
pub mod password;

pub use account::{MAX_USERNAME_LEN, ProfileUpdate, Registration, User};
pub use claims::{JwtClaims, TokenType, validate_claims};
pub use error::AuthError;
pub use jwt::{Hs256JwtValidator, JwtValidator, TokenIssuer, TokenPair};
pub use password::{hash_password, validate_password_strength, verify_password};
