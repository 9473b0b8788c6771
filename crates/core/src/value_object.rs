//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**. They are defined entirely by their
//! attribute values (`Money`, a review `Rating`), are immutable once built, and
//! are validated at construction so an instance is always well-formed.

/// Marker trait for value objects.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Rating(u8);
///
/// impl ValueObject for Rating {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
