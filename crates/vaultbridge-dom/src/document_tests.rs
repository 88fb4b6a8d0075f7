use super::*;

fn login_page() -> (Document, NodeId, NodeId, NodeId) {
    let mut doc = Document::new("https://accounts.example.com/signin?next=/").unwrap();
    let body = doc.body();
    let form = doc.append_element(body, "form", &[("id", "login")]);
    let user = doc.append_element(form, "input", &[("type", "email"), ("name", "email")]);
    let pass = doc.append_element(form, "input", &[("type", "password")]);
    (doc, form, user, pass)
}

#[test]
fn test_new_document() {
    let doc = Document::new("https://accounts.example.com/signin").unwrap();
    assert_eq!(doc.hostname(), "accounts.example.com");
    assert_eq!(doc.children(doc.root()), &[doc.head(), doc.body()]);
    assert!(doc.is_connected(doc.body()));
    assert!(Document::new("::").is_err());
}

#[test]
fn test_tree_order() {
    let (doc, form, user, pass) = login_page();
    assert!(doc.precedes(user, pass));
    assert!(!doc.precedes(pass, user));
    assert!(doc.precedes(form, user));
    assert_eq!(doc.descendants(doc.body()), vec![form, user, pass]);
    assert_eq!(doc.closest(pass, "form"), Some(form));
    assert_eq!(doc.closest(form, "table"), None);
}

#[test]
fn test_query_selector() {
    let (doc, _form, user, pass) = login_page();
    let list = SelectorList::parse(r#"input[type="password"]"#).unwrap();
    assert_eq!(doc.query_selector(doc.root(), &list), Some(pass));
    assert_eq!(doc.select("input").unwrap(), vec![user, pass]);
    assert!(doc.select("input >").is_err());
}

#[test]
fn test_visibility() {
    let (mut doc, form, user, pass) = login_page();
    let hidden = doc.append_element(form, "input", &[("type", "hidden")]);
    assert!(doc.is_visible(user));
    assert!(!doc.is_visible(hidden));

    doc.set_hidden(form, true);
    assert!(!doc.is_visible(pass));
    doc.set_hidden(form, false);

    doc.remove(pass);
    assert!(!doc.is_visible(pass));
    assert!(!doc.is_connected(pass));
    assert!(!doc.precedes(user, pass));
}

#[test]
fn test_dispatch_event_records_value() {
    let (mut doc, _form, user, _pass) = login_page();
    doc.set_value(user, "alice@example.com");
    doc.dispatch_event(user, EventKind::Input);
    doc.dispatch_event(user, EventKind::Change);

    let events = doc.take_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventKind::Input);
    assert!(events[1].bubbles);
    assert_eq!(events[1].value, "alice@example.com");
    assert!(doc.events().is_empty());
}

#[test]
fn test_event_log_keeps_latest() {
    let (mut doc, _form, user, _pass) = login_page();
    for i in 0..MAX_RECORDED_EVENTS + 10 {
        doc.set_value(user, &i.to_string());
        doc.dispatch_event(user, EventKind::Input);
    }

    let events = doc.events();
    assert_eq!(events.len(), MAX_RECORDED_EVENTS);
    assert_eq!(events[0].value, "10");
    assert_eq!(events[MAX_RECORDED_EVENTS - 1].value, (MAX_RECORDED_EVENTS + 9).to_string());
}

#[test]
fn test_mutations_only_under_body() {
    let (mut doc, form, _user, pass) = login_page();
    let mut rx = doc.observe_mutations();

    let head = doc.head();
    doc.append_element(head, "style", &[]);
    assert!(rx.try_recv().is_err());

    let detached = doc.create_element("div");
    let inner = doc.append_element(detached, "input", &[]);
    assert!(rx.try_recv().is_err());

    doc.append_child(form, detached);
    let record = rx.try_recv().unwrap();
    assert_eq!(record.target, form);
    assert_eq!(record.added, vec![detached]);
    assert!(doc.is_connected(inner));

    doc.remove(pass);
    let record = rx.try_recv().unwrap();
    assert_eq!(record.removed, vec![pass]);
}

#[test]
fn test_append_moves_node() {
    let (mut doc, form, user, _pass) = login_page();
    let body = doc.body();
    doc.append_child(body, user);
    assert_eq!(doc.parent(user), Some(body));
    assert!(!doc.children(form).contains(&user));

    // Appending an ancestor into its descendant is ignored.
    doc.append_child(user, body);
    assert_eq!(doc.parent(body), Some(doc.root()));
}

#[test]
fn test_select_options() {
    let mut doc = Document::new("https://shop.example.com").unwrap();
    let body = doc.body();
    let select = doc.append_element(body, "select", &[("name", "month")]);
    let a = doc.append_element(select, "option", &[("value", "01")]);
    let b = doc.append_element(select, "option", &[]);
    doc.set_text(b, " 02 ");

    assert_eq!(doc.options(select), vec![a, b]);
    assert_eq!(doc.option_value(a), "01");
    assert_eq!(doc.option_value(b), "02");
}
