use storefront_core::UserId;

/// Authenticated caller for a request, taken from a valid access token.
///
/// The identity middleware inserts `Option<IdentityContext>` into every
/// request; `None` means the caller is anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    user_id: UserId,
    username: String,
}

impl IdentityContext {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
