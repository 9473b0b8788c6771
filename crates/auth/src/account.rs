use chrono::{DateTime, Utc};
use serde::Deserialize;

use storefront_core::validation::{require_email, require_max_len, require_non_blank};
use storefront_core::{DomainError, DomainResult, Entity, UserId};

use crate::validate_password_strength;

pub const MAX_USERNAME_LEN: usize = 150;
const MAX_NAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;

/// A registered account.
///
/// `password_hash` is an argon2 PHC string and never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: register a new account.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Registration {
    /// Input checks that need no storage. Username uniqueness is checked by
    /// the account service.
    pub fn validate(&self) -> DomainResult<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        require_max_len("first_name", &self.first_name, MAX_NAME_LEN)?;
        require_max_len("last_name", &self.last_name, MAX_NAME_LEN)?;

        if self.password != self.password2 {
            return Err(DomainError::field("password", "Password fields didn't match."));
        }
        validate_password_strength(&self.password)
    }

    pub fn into_user(self, password_hash: String, now: DateTime<Utc>) -> User {
        User {
            id: UserId::new(),
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash,
            date_joined: now,
        }
    }
}

/// Profile changes; `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(self, current: &User) -> DomainResult<User> {
        let mut next = current.clone();
        if let Some(email) = self.email {
            validate_email(&email)?;
            next.email = email;
        }
        if let Some(first_name) = self.first_name {
            require_max_len("first_name", &first_name, MAX_NAME_LEN)?;
            next.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            require_max_len("last_name", &last_name, MAX_NAME_LEN)?;
            next.last_name = last_name;
        }
        Ok(next)
    }
}

fn validate_username(username: &str) -> DomainResult<()> {
    require_non_blank("username", username)?;
    require_max_len("username", username, MAX_USERNAME_LEN)?;
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(DomainError::field(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    require_non_blank("email", email)?;
    require_max_len("email", email, MAX_EMAIL_LEN)?;
    require_email("email", email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            username: "newuser".to_string(),
            email: "newuser@example.com".to_string(),
            password: "newpass123".to_string(),
            password2: "newpass123".to_string(),
            first_name: "New".to_string(),
            last_name: "User".to_string(),
        }
    }

    fn field_of(err: DomainError) -> String {
        match err {
            DomainError::InvalidField { field, .. } => field,
            other => panic!("expected field error, got {other:?}"),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn mismatched_passwords_name_password_field() {
        let mut r = registration();
        r.password2 = "differentpass".to_string();
        assert_eq!(field_of(r.validate().unwrap_err()), "password");
    }

    #[test]
    fn weak_password_is_rejected() {
        let mut r = registration();
        r.password = "1234".to_string();
        r.password2 = "1234".to_string();
        assert_eq!(field_of(r.validate().unwrap_err()), "password");
    }

    #[test]
    fn bad_username_and_email_are_rejected() {
        let mut r = registration();
        r.username = "has space".to_string();
        assert_eq!(field_of(r.validate().unwrap_err()), "username");

        let mut r = registration();
        r.email = "nope".to_string();
        assert_eq!(field_of(r.validate().unwrap_err()), "email");
    }

    #[test]
    fn profile_update_keeps_unset_fields() {
        let user = registration().into_user("hash".to_string(), Utc::now());
        let updated = ProfileUpdate {
            first_name: Some("Renamed".to_string()),
            ..ProfileUpdate::default()
        }
        .apply(&user)
        .unwrap();

        assert_eq!(updated.first_name, "Renamed");
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.password_hash, "hash");
    }

    #[test]
    fn profile_update_revalidates_email() {
        let user = registration().into_user("hash".to_string(), Utc::now());
        let err = ProfileUpdate {
            email: Some("broken".to_string()),
            ..ProfileUpdate::default()
        }
        .apply(&user)
        .unwrap_err();
        assert_eq!(field_of(err), "email");
    }
}
