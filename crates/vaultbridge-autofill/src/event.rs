//! User interactions delivered to a page session.

use vaultbridge_dom::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Focus(NodeId),
    /// Click on the innermost element under the pointer.
    Click(NodeId),
    Blur(NodeId),
    /// A form was submitted.
    Submit(NodeId),
    /// Key name as reported by the page, e.g. `Escape`.
    KeyDown(String),
    /// The window was resized.
    Resize,
}
