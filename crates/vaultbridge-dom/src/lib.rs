//! In-memory page model for the VaultZero bridge.
//!
//! Provides the element tree, the selector subset used by the field
//! heuristics, synthetic input/change events and child-list mutation
//! records. Content-side components operate on a [`SharedDocument`].

mod document;
mod error;
mod events;
mod node;
mod selector;
mod snapshot;
mod types;

pub use document::{Document, MAX_RECORDED_EVENTS, SharedDocument};
pub use error::DomError;
pub use events::{DomEvent, EventKind, MutationRecord};
pub use node::Element;
pub use selector::{AttrOp, AttrSelector, Selector, SelectorError, SelectorList};
pub use snapshot::{DocumentSnapshot, NodeSnapshot};
pub use types::{BoundingBox, NodeId, Viewport};
