//! Accounts: signup, login, and the bootstrap admin.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use common::{NewUser, User, UserId};
use store::{StoreError, UserStore};

use crate::error::DomainError;

/// Service for registering and authenticating users.
///
/// Passwords are stored as Argon2 PHC strings. Hashing and verification run
/// on the blocking pool.
pub struct AccountService<S> {
    store: S,
}

impl<S: UserStore> AccountService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a regular (non-admin) user.
    #[tracing::instrument(skip(self, password))]
    pub async fn signup(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let username = validate_credentials(username, password)?;
        let password_hash = hash_password(password.to_string()).await?;

        let user = self
            .store
            .create_user(NewUser {
                username: username.clone(),
                password_hash,
                is_admin: false,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => DomainError::UsernameTaken(username),
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Checks a username and password pair.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let Some(user) = self.store.find_user_by_username(username.trim()).await? else {
            return Err(DomainError::InvalidCredentials);
        };

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            return Err(DomainError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Creates the configured admin account unless the username already exists.
    #[tracing::instrument(skip(self, password))]
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let username = validate_credentials(username, password)?;

        if let Some(existing) = self.store.find_user_by_username(&username).await? {
            if !existing.is_admin {
                tracing::warn!(user_id = %existing.id, "configured admin username belongs to a regular user");
            }
            return Ok(existing);
        }

        let password_hash = hash_password(password.to_string()).await?;
        let created = self
            .store
            .create_user(NewUser {
                username: username.clone(),
                password_hash,
                is_admin: true,
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "admin account created");
                Ok(user)
            }
            // Another instance seeded it first.
            Err(StoreError::Duplicate(_)) => {
                let existing = self.store.find_user_by_username(&username).await?;
                existing.ok_or(DomainError::UsernameTaken(username))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads a user by ID.
    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.store.find_user(user_id).await?)
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<String, DomainError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(DomainError::InvalidInput(
            "username and password are required".to_string(),
        ));
    }
    Ok(username.to_string())
}

async fn hash_password(password: String) -> Result<String, DomainError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::PasswordHash(e.to_string()))
    })
    .await
    .map_err(|e| DomainError::PasswordHash(e.to_string()))?
}

async fn verify_password(password: String, stored: String) -> Result<bool, DomainError> {
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&stored).map_err(|e| DomainError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| DomainError::PasswordHash(e.to_string()))?
}
