//! Entities: records that keep their identity while their fields change.

/// A domain record addressed by a typed id (`Product`, `Order`, `Review`, ...).
///
/// Storage backends key their tables on [`Entity::Id`].
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}
