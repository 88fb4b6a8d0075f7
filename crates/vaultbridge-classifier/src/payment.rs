//! Payment field detection.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, trace};
use vaultbridge_dom::{Document, NodeId, SelectorList};

use crate::selectors::{
    CARD_NUMBER, CARD_NUMBER_HINT, CARDHOLDER_NAME, COMBINED_EXPIRY, CVV, EXPIRY_MONTH,
    EXPIRY_YEAR,
};

/// Attribute set on card-number fields once the controller has taken them.
pub const CARD_MARKER: &str = "data-vaultbridge-card";

/// A card-number field with its companion fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentFieldSet {
    pub card_number: NodeId,
    pub cardholder_name: Option<NodeId>,
    /// Month slot: a split month field, else a combined expiry field.
    pub expiry_month: Option<NodeId>,
    pub expiry_year: Option<NodeId>,
    pub cvv: Option<NodeId>,
    pub form: Option<NodeId>,
}

impl PaymentFieldSet {
    /// Every field in the set.
    pub fn fields(&self) -> impl Iterator<Item = NodeId> {
        [
            Some(self.card_number),
            self.cardholder_name,
            self.expiry_month,
            self.expiry_year,
            self.cvv,
        ]
        .into_iter()
        .flatten()
    }
}

/// Payment field sets for every unprocessed card-number field.
///
/// Fields carrying [`CARD_MARKER`] are skipped, as are candidates already
/// assigned a role by an earlier set in the same pass.
pub fn detect_payment_fields(doc: &Document) -> Vec<PaymentFieldSet> {
    let mut claimed = HashSet::new();
    let mut sets = Vec::new();

    for card in doc.query_selector_all(doc.root(), &CARD_NUMBER) {
        if doc.element(card).has_attribute(CARD_MARKER) {
            trace!("Card field {:?} already processed", card);
            continue;
        }
        if claimed.contains(&card) {
            continue;
        }
        if looks_like_other_role(doc, card) {
            debug!(
                "Skipping card candidate {} matching another role",
                doc.element(card).describe()
            );
            continue;
        }

        let set = classify_card_field(doc, card, &claimed);
        claimed.extend(set.fields());
        sets.push(set);
    }

    sets
}

/// Resolve the companion fields of `card` within its form (or the document).
///
/// Each role takes the first visible match of its highest-priority
/// selector. A field is used for at most one role, and never one in
/// `claimed`.
pub fn classify_card_field(
    doc: &Document,
    card: NodeId,
    claimed: &HashSet<NodeId>,
) -> PaymentFieldSet {
    let form = doc.closest(card, "form");
    let scope = form.unwrap_or_else(|| doc.root());

    let mut taken: HashSet<NodeId> = claimed.clone();
    taken.insert(card);

    let mut pick = |selectors: &[SelectorList]| {
        let found = first_visible(doc, scope, selectors, &taken);
        if let Some(id) = found {
            taken.insert(id);
        }
        found
    };

    let cardholder_name = pick(CARDHOLDER_NAME.as_slice());
    let split_month = pick(EXPIRY_MONTH.as_slice());
    let expiry_year = pick(EXPIRY_YEAR.as_slice());
    let expiry_month = match split_month {
        Some(month) => Some(month),
        None => pick(COMBINED_EXPIRY.as_slice()),
    };
    let cvv = pick(CVV.as_slice());

    PaymentFieldSet {
        card_number: card,
        cardholder_name,
        expiry_month,
        expiry_year,
        cvv,
        form,
    }
}

fn first_visible(
    doc: &Document,
    scope: NodeId,
    selectors: &[SelectorList],
    taken: &HashSet<NodeId>,
) -> Option<NodeId> {
    selectors.iter().find_map(|selector| {
        doc.query_selector_all(scope, selector)
            .into_iter()
            .find(|id| !taken.contains(id) && doc.is_visible(*id))
    })
}

/// A card-number candidate that also matches a companion role, unless it
/// carries an explicit `cc-number` hint.
fn looks_like_other_role(doc: &Document, card: NodeId) -> bool {
    if doc.matches(card, &CARD_NUMBER_HINT) {
        return false;
    }
    [&*CARDHOLDER_NAME, &*COMBINED_EXPIRY, &*EXPIRY_MONTH, &*EXPIRY_YEAR, &*CVV]
        .iter()
        .any(|role| role.iter().any(|selector| doc.matches(card, selector)))
}

#[cfg(test)]
#[path = "payment_tests.rs"]
mod tests;
