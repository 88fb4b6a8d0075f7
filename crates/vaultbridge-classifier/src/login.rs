//! Login field detection.

use serde::Serialize;
use tracing::debug;
use vaultbridge_dom::{Document, NodeId};

use crate::error::ClassifyError;
use crate::selectors::{PASSWORD, SUBMIT_CONTROLS, USERNAME_FALLBACK, USERNAME_STRATEGIES};

/// A password field with its username companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoginFieldSet {
    pub username: NodeId,
    pub password: NodeId,
    /// Enclosing `<form>`, if any.
    pub form: Option<NodeId>,
}

impl LoginFieldSet {
    /// Subtree searched for submit controls: the form, else the document.
    pub fn container(&self, doc: &Document) -> NodeId {
        self.form.unwrap_or_else(|| doc.root())
    }

    /// Whether both fields are still part of the page.
    pub fn is_connected(&self, doc: &Document) -> bool {
        doc.is_connected(self.username) && doc.is_connected(self.password)
    }
}

/// Every password field that has a username companion, in document order.
pub fn detect_login_fields(doc: &Document) -> Vec<LoginFieldSet> {
    doc.query_selector_all(doc.root(), &PASSWORD)
        .into_iter()
        .filter_map(|password| match classify_password_field(doc, password) {
            Ok(set) => Some(set),
            Err(err) => {
                debug!("Skipping password field: {}", err);
                None
            }
        })
        .collect()
}

/// Find the username field for `password`.
///
/// Strategies are tried in priority order; within a strategy the first
/// visible match that precedes the password field wins. Falls back to any
/// visible text-like input before the password field.
pub fn classify_password_field(
    doc: &Document,
    password: NodeId,
) -> Result<LoginFieldSet, ClassifyError> {
    let form = doc.closest(password, "form");
    let scope = form.unwrap_or_else(|| doc.root());
    let eligible = |id: &NodeId| doc.is_visible(*id) && doc.precedes(*id, password);

    let username = USERNAME_STRATEGIES
        .iter()
        .find_map(|strategy| {
            doc.query_selector_all(scope, strategy)
                .into_iter()
                .find(eligible)
        })
        .or_else(|| {
            doc.query_selector_all(scope, &USERNAME_FALLBACK)
                .into_iter()
                .find(eligible)
        })
        .ok_or(ClassifyError::NoMatchingField(password))?;

    Ok(LoginFieldSet {
        username,
        password,
        form,
    })
}

/// Submit-like controls inside the set's container.
pub fn submit_controls(doc: &Document, set: &LoginFieldSet) -> Vec<NodeId> {
    doc.query_selector_all(set.container(doc), &SUBMIT_CONTROLS)
}

#[cfg(test)]
#[path = "login_tests.rs"]
mod tests;
