use super::*;

use serde_json::json;
use vaultbridge_classifier::{detect_login_fields, detect_payment_fields};

fn page(body: serde_json::Value) -> Document {
    Document::from_value(json!({ "url": "https://example.com/", "body": body })).unwrap()
}

fn card() -> CreditCard {
    CreditCard {
        card_name: "Personal".to_string(),
        cardholder_name: "Alice Smith".to_string(),
        card_number: "4111111111111111".to_string(),
        expiry_month: "3".to_string(),
        expiry_year: "2027".to_string(),
        cvv: "123".to_string(),
        ..Default::default()
    }
}

fn login_page() -> Document {
    page(json!([{
        "tag": "form",
        "children": [
            {"tag": "input", "attributes": {"type": "email"}},
            {"tag": "input", "attributes": {"type": "password"}}
        ]
    }]))
}

#[test]
fn test_fill_login_dispatches_events() {
    let mut doc = login_page();
    let set = detect_login_fields(&doc)[0];
    let credential = Credential {
        username: "alice@example.com".to_string(),
        password: "s3cret".to_string(),
        ..Default::default()
    };

    assert_eq!(fill_login(&mut doc, Some(&set), &credential), Ok(2));
    assert_eq!(doc.value(set.username), "alice@example.com");
    assert_eq!(doc.value(set.password), "s3cret");

    let events = doc.take_events();
    let kinds: Vec<_> = events.iter().map(|e| (e.target, e.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (set.username, EventKind::Input),
            (set.username, EventKind::Change),
            (set.password, EventKind::Input),
            (set.password, EventKind::Change),
        ]
    );
    assert!(events.iter().all(|e| e.bubbles));
    assert_eq!(events[3].value, "s3cret");
}

#[test]
fn test_fill_login_skips_stale_field() {
    let mut doc = login_page();
    let set = detect_login_fields(&doc)[0];
    doc.remove(set.username);

    let credential = Credential {
        username: "alice".to_string(),
        password: "pw".to_string(),
        ..Default::default()
    };
    assert_eq!(fill_login(&mut doc, Some(&set), &credential), Ok(1));
    assert_eq!(doc.value(set.username), "");
    assert!(doc.events().iter().all(|e| e.target == set.password));
}

#[test]
fn test_fill_without_fields() {
    let mut doc = login_page();
    assert_eq!(
        fill_login(&mut doc, None, &Credential::default()),
        Err(FillError::NoActiveFields)
    );
    assert_eq!(fill_card(&mut doc, None, &card()), Err(FillError::NoActiveFields));
}

#[test]
fn test_fill_card_split_selects() {
    let mut doc = page(json!([{
        "tag": "form",
        "children": [
            {"tag": "input", "attributes": {"autocomplete": "cc-number"}},
            {"tag": "input", "attributes": {"autocomplete": "cc-name"}},
            {"tag": "select", "attributes": {"name": "month"}, "children": [
                {"tag": "option", "attributes": {"value": ""}},
                {"tag": "option", "attributes": {"value": "02"}},
                {"tag": "option", "attributes": {"value": "03"}}
            ]},
            {"tag": "select", "attributes": {"name": "year"}, "children": [
                {"tag": "option", "attributes": {"value": "26"}},
                {"tag": "option", "attributes": {"value": "27"}}
            ]},
            {"tag": "input", "attributes": {"name": "cvc"}}
        ]
    }]));
    let set = detect_payment_fields(&doc)[0];

    assert_eq!(fill_card(&mut doc, Some(&set), &card()), Ok(5));
    assert_eq!(doc.value(set.card_number), "4111111111111111");
    assert_eq!(doc.value(set.cardholder_name.unwrap()), "Alice Smith");
    assert_eq!(doc.value(set.expiry_month.unwrap()), "03");
    assert_eq!(doc.value(set.expiry_year.unwrap()), "27");
    assert_eq!(doc.value(set.cvv.unwrap()), "123");
    assert_eq!(doc.events().len(), 10);
}

#[test]
fn test_fill_card_combined_expiry() {
    let mut doc = page(json!([{
        "tag": "form",
        "children": [
            {"tag": "input", "attributes": {"name": "cardNumber"}},
            {"tag": "input", "attributes": {"name": "exp", "placeholder": "MM/YY"}}
        ]
    }]));
    let set = detect_payment_fields(&doc)[0];

    fill_card(&mut doc, Some(&set), &card()).unwrap();
    assert_eq!(doc.value(set.expiry_month.unwrap()), "03/27");
}

#[test]
fn test_fill_card_split_inputs() {
    let mut doc = page(json!([{
        "tag": "form",
        "children": [
            {"tag": "input", "attributes": {"name": "cardNumber"}},
            {"tag": "input", "attributes": {"name": "exp_month"}},
            {"tag": "input", "attributes": {"name": "exp_year"}}
        ]
    }]));
    let set = detect_payment_fields(&doc)[0];

    fill_card(&mut doc, Some(&set), &card()).unwrap();
    assert_eq!(doc.value(set.expiry_month.unwrap()), "3");
    assert_eq!(doc.value(set.expiry_year.unwrap()), "2027");
}

#[test]
fn test_select_without_match_still_notifies() {
    let mut doc = page(json!([{
        "tag": "form",
        "children": [
            {"tag": "input", "attributes": {"name": "cardNumber"}},
            {"tag": "select", "attributes": {"name": "month"}, "children": [
                {"tag": "option", "attributes": {"value": "jan"}}
            ]},
            {"tag": "input", "attributes": {"name": "year"}}
        ]
    }]));
    let set = detect_payment_fields(&doc)[0];
    let month = set.expiry_month.unwrap();

    fill_card(&mut doc, Some(&set), &card()).unwrap();
    assert_eq!(doc.value(month), "");
    assert_eq!(doc.events().iter().filter(|e| e.target == month).count(), 2);
}
