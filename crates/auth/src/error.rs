use thiserror::Error;

/// Authentication failures. Every variant except `PasswordHash` and
/// `TokenSigning` is a 401.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no active account found with the given credentials")]
    InvalidCredentials,

    #[error("token is invalid")]
    InvalidToken,

    #[error("token has expired")]
    Expired,

    #[error("token has wrong type")]
    WrongTokenType,

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("token signing failed: {0}")]
    TokenSigning(String),
}
