//! # Typed event identity.
//!
//! [`TypeKey`] is the process-unique identity of an event type. The whole
//! dispatch surface (registry lists, data store slots, sync groups) is keyed
//! by it. Two distinct event types never share a key; key equality implies
//! type equivalence.
//!
//! The [`Event`] trait is blanket-implemented: any `'static` type that is
//! `Send + Sync` can be emitted. Payloads travel through the runtime as
//! `Arc<dyn Any>` erased pointers and are downcast back at the callback
//! boundary (see [`Args`](crate::events::Args)).

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Marker for types that can travel through the dispatch core.
///
/// Blanket-implemented for every `'static + Send + Sync` type; user code
/// never implements this by hand.
pub trait Event: Any + Send + Sync {}

impl<T: Any + Send + Sync> Event for T {}

/// Type-erased payload as stored and dispatched by the runtime.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Stable, process-unique identity of an event type.
///
/// Wraps [`TypeId`] for identity and carries the type name purely for
/// diagnostics. Identity, ordering, and hashing use the id alone.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key for event type `T`.
    pub fn of<T: Event>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Human-readable type name, for logs and reaction identifiers.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
