//! Arena-backed live document.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;
use url::Url;

use crate::error::DomError;
use crate::events::{DomEvent, EventKind, MutationRecord};
use crate::node::Element;
use crate::selector::{SelectorError, SelectorList};
use crate::types::{BoundingBox, NodeId, Viewport};

/// Document shared between a page session and whoever drives the page.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Dispatched events kept for inspection; older ones are dropped first.
pub const MAX_RECORDED_EVENTS: usize = 256;

/// A live page document.
///
/// Elements live in an arena and are addressed by [`NodeId`]. Removing an
/// element detaches it from the tree but keeps its data, so stale handles
/// can still be inspected and checked with [`Document::is_connected`].
/// Only the latest [`MAX_RECORDED_EVENTS`] dispatched events are kept.
#[derive(Debug)]
pub struct Document {
    url: Url,
    nodes: Vec<Element>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    viewport: Viewport,
    events: Vec<DomEvent>,
    observers: Vec<mpsc::UnboundedSender<MutationRecord>>,
}

impl Document {
    /// Empty `<html><head></head><body></body></html>` document at `url`.
    pub fn new(url: &str) -> Result<Self, DomError> {
        let mut doc = Self {
            url: Url::parse(url)?,
            nodes: vec![Element::new("html"), Element::new("head"), Element::new("body")],
            root: NodeId(0),
            head: NodeId(1),
            body: NodeId(2),
            viewport: Viewport::default(),
            events: Vec::new(),
            observers: Vec::new(),
        };
        doc.link(doc.root, doc.head);
        doc.link(doc.root, doc.body);
        Ok(doc)
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    // ------------------------------------------------------------------
    // Location and viewport
    // ------------------------------------------------------------------

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Full page URL.
    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    /// Page hostname, empty for URLs without a host.
    pub fn hostname(&self) -> String {
        self.url.host_str().unwrap_or_default().to_string()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_scroll(&mut self, x: f64, y: f64) {
        self.viewport.scroll_x = x;
        self.viewport.scroll_y = y;
    }

    // ------------------------------------------------------------------
    // Tree structure
    // ------------------------------------------------------------------

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    fn element_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Element::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    /// Create an element with attributes and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(tag);
        for (name, value) in attributes {
            self.element_mut(id).set_attribute(name, value);
        }
        self.append_child(parent, id);
        id
    }

    /// Append `child` to `parent`, moving it if it already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.contains(child, parent) {
            trace!("Ignoring append that would create a cycle");
            return;
        }
        self.detach(child);
        self.link(parent, child);
        if self.in_body(parent) {
            self.emit(MutationRecord {
                target: parent,
                added: vec![child],
                removed: Vec::new(),
            });
        }
    }

    /// Remove `id` from the tree. Its data stays addressable.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root || id == self.body || id == self.head {
            return;
        }
        self.detach(id);
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.element_mut(child).parent = Some(parent);
        self.element_mut(parent).children.push(child);
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.element(id).parent else {
            return;
        };
        let observed = self.in_body(parent);
        self.element_mut(parent).children.retain(|c| *c != id);
        self.element_mut(id).parent = None;
        if observed {
            self.emit(MutationRecord {
                target: parent,
                added: Vec::new(),
                removed: vec![id],
            });
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.element(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id).children()
    }

    /// Whether `id` is still reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.top(id) == self.root
    }

    fn top(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.element(current).parent {
            current = parent;
        }
        current
    }

    fn in_body(&self, id: NodeId) -> bool {
        self.is_connected(id) && self.contains(self.body, id)
    }

    /// Inclusive ancestor check.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.element(id).parent;
        }
        false
    }

    /// Nearest inclusive ancestor with tag `tag`.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.element(node).tag().eq_ignore_ascii_case(tag) {
                return Some(node);
            }
            current = self.element(node).parent;
        }
        None
    }

    /// Descendants of `scope` in tree order, excluding `scope`.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    fn tree_path(&self, id: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.element(current).parent {
            let index = self.children(parent).iter().position(|c| *c == current)?;
            path.push(index);
            current = parent;
        }
        if current != self.root {
            return None;
        }
        path.reverse();
        Some(path)
    }

    /// Whether `a` comes before `b` in document order. Ancestors precede
    /// their descendants; detached nodes precede nothing.
    pub fn precedes(&self, a: NodeId, b: NodeId) -> bool {
        match (self.tree_path(a), self.tree_path(b)) {
            (Some(pa), Some(pb)) => pa < pb,
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Attributes, values and layout
    // ------------------------------------------------------------------

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).attribute(name)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        self.element_mut(id).set_attribute(name, value);
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        self.element_mut(id).remove_attribute(name)
    }

    pub fn value(&self, id: NodeId) -> &str {
        self.element(id).value()
    }

    /// Set the form value without dispatching events, like assigning
    /// `.value` from script.
    pub fn set_value(&mut self, id: NodeId, value: &str) {
        self.element_mut(id).set_value(value);
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.element_mut(id).set_text(text);
    }

    /// Text of `id` and all its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = self.element(id).text().to_string();
        for node in self.descendants(id) {
            out.push_str(self.element(node).text());
        }
        out
    }

    pub fn rect(&self, id: NodeId) -> BoundingBox {
        self.element(id).rect()
    }

    pub fn set_rect(&mut self, id: NodeId, rect: BoundingBox) {
        self.element_mut(id).set_rect(rect);
    }

    /// Toggle `display: none`.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        self.element_mut(id).set_hidden(hidden);
    }

    /// Whether the element participates in layout: connected, not a hidden
    /// input, and neither it nor any ancestor is `display: none`.
    pub fn is_visible(&self, id: NodeId) -> bool {
        if !self.is_connected(id) {
            return false;
        }
        if self.element(id).input_type().as_deref() == Some("hidden") {
            return false;
        }
        let mut current = Some(id);
        while let Some(node) = current {
            if self.element(node).is_hidden() {
                return false;
            }
            current = self.element(node).parent;
        }
        true
    }

    /// `<option>` elements of a `<select>`, in order.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|id| self.element(*id).tag() == "option")
            .collect()
    }

    /// Value of an `<option>`: its `value` attribute, else its text.
    pub fn option_value(&self, option: NodeId) -> String {
        match self.attribute(option, "value") {
            Some(value) => value.to_string(),
            None => self.text_content(option).trim().to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Selectors
    // ------------------------------------------------------------------

    pub fn matches(&self, id: NodeId, selector: &SelectorList) -> bool {
        selector.matches(self.element(id))
    }

    /// Descendants of `scope` matching `selector`, in tree order.
    pub fn query_selector_all(&self, scope: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(self.element(*id)))
            .collect()
    }

    pub fn query_selector(&self, scope: NodeId, selector: &SelectorList) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| selector.matches(self.element(*id)))
    }

    /// Parse `selector` and query the whole document.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let selector = SelectorList::parse(selector)?;
        Ok(self.query_selector_all(self.root, &selector))
    }

    // ------------------------------------------------------------------
    // Events and mutation observers
    // ------------------------------------------------------------------

    /// Dispatch a bubbling event on `target`.
    pub fn dispatch_event(&mut self, target: NodeId, kind: EventKind) {
        let value = self.value(target).to_string();
        if self.events.len() >= MAX_RECORDED_EVENTS {
            let excess = self.events.len() + 1 - MAX_RECORDED_EVENTS;
            self.events.drain(..excess);
        }
        self.events.push(DomEvent {
            target,
            kind,
            bubbles: true,
            value,
        });
    }

    /// Events dispatched so far, oldest first.
    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<DomEvent> {
        std::mem::take(&mut self.events)
    }

    /// Subscribe to child-list mutations in the `<body>` subtree.
    pub fn observe_mutations(&mut self) -> mpsc::UnboundedReceiver<MutationRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    fn emit(&mut self, record: MutationRecord) {
        self.observers.retain(|tx| tx.send(record.clone()).is_ok());
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
