//! Writing vault records into live fields.
//!
//! Each written field gets an `input` then a `change` event, both bubbling,
//! so page frameworks observe the new value. Fields that have left the
//! document are skipped.

use thiserror::Error;
use tracing::debug;
use vaultbridge_classifier::{LoginFieldSet, PaymentFieldSet};
use vaultbridge_dom::{Document, EventKind, NodeId};
use vaultbridge_protocols::{Credential, CreditCard};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillError {
    /// The field was removed from the page after detection.
    #[error("Field {0:?} is no longer in the document")]
    StaleTarget(NodeId),

    /// No field set has been detected on the page.
    #[error("No active fields to fill")]
    NoActiveFields,
}

/// Fill `credential` into the login set. Returns the number of fields
/// written.
pub fn fill_login(
    doc: &mut Document,
    fields: Option<&LoginFieldSet>,
    credential: &Credential,
) -> Result<usize, FillError> {
    let set = fields.ok_or(FillError::NoActiveFields)?;
    let mut filled = 0;
    for (field, value) in [
        (set.username, credential.username.as_str()),
        (set.password, credential.password.as_str()),
    ] {
        filled += skip_stale(write_input(doc, field, value));
    }
    Ok(filled)
}

/// Fill `card` into the payment set. Returns the number of fields written.
pub fn fill_card(
    doc: &mut Document,
    fields: Option<&PaymentFieldSet>,
    card: &CreditCard,
) -> Result<usize, FillError> {
    let set = fields.ok_or(FillError::NoActiveFields)?;
    let mut filled = skip_stale(write_input(doc, set.card_number, &card.card_number));

    if let Some(name) = set.cardholder_name {
        filled += skip_stale(write_input(doc, name, &card.cardholder_name));
    }

    if let Some(month) = set.expiry_month {
        let result = if doc.element(month).is_select() {
            let padded = card.padded_month();
            write_select(doc, month, &[card.expiry_month.as_str(), padded.as_str()])
        } else if is_combined_expiry(doc, month, set.expiry_year.is_some()) {
            write_input(doc, month, &card.expiry_mm_yy())
        } else {
            write_input(doc, month, &card.expiry_month)
        };
        filled += skip_stale(result);
    }

    if let Some(year) = set.expiry_year {
        let result = if doc.element(year).is_select() {
            let short = card.short_year();
            write_select(doc, year, &[card.expiry_year.as_str(), short.as_str()])
        } else {
            write_input(doc, year, &card.expiry_year)
        };
        filled += skip_stale(result);
    }

    if let Some(cvv) = set.cvv {
        filled += skip_stale(write_input(doc, cvv, &card.cvv));
    }

    Ok(filled)
}

/// A month-slot field takes `MM/YY` when there is no year field or its
/// placeholder asks for both parts.
fn is_combined_expiry(doc: &Document, field: NodeId, has_year_field: bool) -> bool {
    if !has_year_field {
        return true;
    }
    doc.element(field)
        .placeholder()
        .is_some_and(|p| p.contains("MM") && p.contains("YY"))
}

fn skip_stale(result: Result<(), FillError>) -> usize {
    match result {
        Ok(()) => 1,
        Err(err) => {
            debug!("Skipping fill: {}", err);
            0
        }
    }
}

fn write_input(doc: &mut Document, field: NodeId, value: &str) -> Result<(), FillError> {
    if !doc.is_connected(field) {
        return Err(FillError::StaleTarget(field));
    }
    doc.set_value(field, value);
    notify_change(doc, field);
    Ok(())
}

/// Select the first option whose value is one of `candidates`. Events fire
/// even when no option matches.
fn write_select(doc: &mut Document, field: NodeId, candidates: &[&str]) -> Result<(), FillError> {
    if !doc.is_connected(field) {
        return Err(FillError::StaleTarget(field));
    }
    let matching = doc
        .options(field)
        .into_iter()
        .map(|option| doc.option_value(option))
        .find(|value| candidates.contains(&value.as_str()));
    match matching {
        Some(value) => doc.set_value(field, &value),
        None => debug!("No option matches {:?}", candidates),
    }
    notify_change(doc, field);
    Ok(())
}

fn notify_change(doc: &mut Document, field: NodeId) {
    doc.dispatch_event(field, EventKind::Input);
    doc.dispatch_event(field, EventKind::Change);
}

#[cfg(test)]
#[path = "fill_tests.rs"]
mod tests;
