//! Events and mutation records observable by the host page.

use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// Synthetic events the bridge dispatches on page elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
}

/// A dispatched event as the page would observe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
    pub bubbles: bool,
    /// Value of the target at dispatch time.
    pub value: String,
}

/// A child-list mutation under `<body>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Parent whose child list changed.
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl MutationRecord {
    /// Nodes touched by this record.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.added.iter().chain(self.removed.iter()).copied()
    }
}
