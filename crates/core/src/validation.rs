//! Field-level input checks shared by the domain crates.
//!
//! Each check reports a [`DomainError::InvalidField`] naming the offending
//! field, which the API layer renders as a 400 response.

use validator::ValidateEmail;

use crate::{DomainError, DomainResult};

pub fn require_non_blank(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::field(field, "This field may not be blank."));
    }
    Ok(())
}

pub fn require_max_len(field: &str, value: &str, max: usize) -> DomainResult<()> {
    if value.chars().count() > max {
        return Err(DomainError::field(
            field,
            format!("Ensure this field has no more than {max} characters."),
        ));
    }
    Ok(())
}

pub fn require_email(field: &str, value: &str) -> DomainResult<()> {
    if !value.validate_email() {
        return Err(DomainError::field(field, "Enter a valid email address."));
    }
    Ok(())
}
