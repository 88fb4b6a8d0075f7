//! Classifier errors.

use thiserror::Error;
use vaultbridge_dom::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// A password field has no username companion.
    #[error("No username field precedes password field {0:?}")]
    NoMatchingField(NodeId),
}
