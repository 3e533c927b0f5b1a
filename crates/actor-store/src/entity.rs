//! # StoredEntity Trait
//!
//! The `StoredEntity` trait is the contract a record type implements to be kept by a
//! [`StoreActor`](crate::StoreActor). It names the key type, the payload of a conditional
//! update, and the two hooks the actor needs to evaluate and apply that update.
//!
//! # Architecture Note
//! The actor never interprets a record. It asks the entity whether an update's
//! precondition holds against the *current* stored state and, only if it does, applies it.
//! Because the actor processes requests one at a time, the check and the write happen
//! as a single step: whichever writer reaches the actor first wins, and every later
//! writer with the same expectation sees [`FrameworkError::PreconditionFailed`](crate::FrameworkError::PreconditionFailed).
//!
//! We use "Associated Types" (`type Id`, `type Update`) so an `Order` store only accepts
//! order transitions. Sending it anything else is a compile error.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any record must implement to be managed by a `StoreActor`.
///
/// # Example
///
/// ```rust
/// use actor_store::StoredEntity;
///
/// #[derive(Clone, Debug)]
/// struct Counter { id: String, value: u32 }
///
/// /// Compare-and-swap on `value`.
/// #[derive(Debug)]
/// struct Cas { expected: u32, new: u32 }
///
/// impl StoredEntity for Counter {
///     type Id = String;
///     type Update = Cas;
///
///     fn id(&self) -> &String { &self.id }
///     fn precondition_holds(&self, update: &Cas) -> bool { self.value == update.expected }
///     fn apply(&mut self, update: Cas) { self.value = update.new; }
/// }
/// ```
pub trait StoredEntity: Clone + Send + Sync + Debug + 'static {
    /// The primary key (e.g., String, Uuid, a newtype around either).
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// Payload of a conditional update.
    type Update: Send + Sync + Debug;

    /// The primary key of this record. Assigned by the writer, never by the store.
    fn id(&self) -> &Self::Id;

    /// Whether `update` may be applied to the record as currently stored.
    fn precondition_holds(&self, update: &Self::Update) -> bool;

    /// Applies an update whose precondition has already been checked.
    fn apply(&mut self, update: Self::Update);
}
