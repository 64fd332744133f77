//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Articles, benefits and order cards are entities: two snapshots with the
/// same id describe the same backend record even if their fields differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
