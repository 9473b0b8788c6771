//! Route guards over the resolved identity.

use axum::http::StatusCode;
use axum::response::Response;

use crate::app::errors;
use crate::context::IdentityContext;

/// Turn an optional identity into a required one; anonymous callers get 401.
pub fn require_identity(identity: Option<IdentityContext>) -> Result<IdentityContext, Response> {
    identity.ok_or_else(|| {
        errors::json_error(
            StatusCode::UNAUTHORIZED,
            "not_authenticated",
            "Authentication credentials were not provided.",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::UserId;

    #[test]
    fn anonymous_is_unauthorized() {
        let res = require_identity(None).unwrap_err();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn identity_passes_through() {
        let id = UserId::new();
        let ctx = require_identity(Some(IdentityContext::new(id, "testuser"))).unwrap();
        assert_eq!(ctx.user_id(), id);
        assert_eq!(ctx.username(), "testuser");
    }
}
