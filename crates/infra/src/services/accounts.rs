use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use storefront_auth::{
    AuthError, JwtValidator, ProfileUpdate, Registration, TokenIssuer, TokenPair, User,
    hash_password, verify_password,
};
use storefront_core::{DomainError, UserId};

use crate::repository::{USERS_USERNAME_KEY, UserRepository};
use crate::services::{ServiceError, ServiceResult};

const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Registration, login and token refresh.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    issuer: TokenIssuer,
    validator: Arc<dyn JwtValidator>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        issuer: TokenIssuer,
        validator: Arc<dyn JwtValidator>,
    ) -> Self {
        Self {
            users,
            issuer,
            validator,
        }
    }

    #[instrument(skip(self, registration), fields(username = %registration.username), err)]
    pub async fn register(&self, registration: Registration) -> ServiceResult<(User, TokenPair)> {
        registration.validate()?;

        if self
            .users
            .find_user_by_username(&registration.username)
            .await?
            .is_some()
        {
            return Err(DomainError::field("username", USERNAME_TAKEN).into());
        }

        let password_hash = hash_blocking(registration.password.clone()).await?;
        let now = Utc::now();
        let user = registration.into_user(password_hash, now);

        match self.users.insert_user(&user).await {
            Ok(()) => {}
            Err(e) if e.is_unique_violation_of(USERS_USERNAME_KEY) => {
                return Err(DomainError::field("username", USERNAME_TAKEN).into());
            }
            Err(e) => return Err(e.into()),
        }

        let tokens = self.issuer.issue_pair(&user, now)?;
        info!(user_id = %user.id, "user registered");
        Ok((user, tokens))
    }

    #[instrument(skip(self, password), err)]
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<TokenPair> {
        let Some(user) = self.users.find_user_by_username(username).await? else {
            warn!("login for unknown username");
            return Err(AuthError::InvalidCredentials.into());
        };

        if !verify_blocking(password.to_string(), user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(self.issuer.issue_pair(&user, Utc::now())?)
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<String> {
        let now = Utc::now();
        let claims = self.validator.validate(refresh_token, now)?;
        Ok(self.issuer.refresh_access(&claims, now)?)
    }

    /// The account behind a validated token. A token for a deleted account
    /// is treated as invalid.
    pub async fn current_user(&self, id: UserId) -> ServiceResult<User> {
        self.users
            .find_user(id)
            .await?
            .ok_or(ServiceError::Auth(AuthError::InvalidToken))
    }

    #[instrument(skip(self, update), fields(user_id = %id), err)]
    pub async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> ServiceResult<User> {
        let current = self.current_user(id).await?;
        let updated = update.apply(&current)?;
        self.users.update_user(&updated).await?;
        Ok(updated)
    }
}

async fn hash_blocking(password: String) -> ServiceResult<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))??;
    Ok(hash)
}

async fn verify_blocking(password: String, hash: String) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()).into())
}
