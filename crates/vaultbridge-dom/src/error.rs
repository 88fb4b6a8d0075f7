//! DOM model errors.

use thiserror::Error;

use crate::selector::SelectorError;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Invalid document URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Invalid selector: {0}")]
    Selector(#[from] SelectorError),
}
