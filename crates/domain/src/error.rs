//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::cart::CartError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A cart operation was rejected.
    #[error("{0}")]
    Cart(#[from] CartError),

    /// Unknown username or wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Signup with a username that already exists.
    #[error("username already taken: {0}")]
    UsernameTaken(String),

    /// Request fields failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Password hashing could not run.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
