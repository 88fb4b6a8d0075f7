//! Element data stored in the document arena.

use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, NodeId};

/// An element node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// Tag name (lowercase).
    tag: String,
    /// Attributes in insertion order; names are lowercase.
    attributes: Vec<(String, String)>,
    /// Current form value (inputs, selects, textareas).
    value: String,
    /// Direct text content.
    text: String,
    /// Layout box in viewport coordinates.
    rect: BoundingBox,
    /// `display: none` on this element.
    hidden: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Element {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            value: String::new(),
            text: String::new(),
            rect: BoundingBox::default(),
            hidden: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        // The value attribute seeds the current value until it is edited.
        if name == "value" && self.value.is_empty() {
            self.value = value.to_string();
        }
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name, value.to_string())),
        }
    }

    pub(crate) fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.attributes.len() != before
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn name(&self) -> Option<&str> {
        self.attribute("name")
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.attribute("placeholder")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Class list starting with `prefix`.
    pub fn has_class_prefix(&self, prefix: &str) -> bool {
        self.classes().any(|c| c.starts_with(prefix))
    }

    /// Effective input type; inputs without a `type` attribute are `text`.
    pub fn input_type(&self) -> Option<String> {
        if self.tag != "input" {
            return None;
        }
        Some(
            self.attribute("type")
                .map(|t| t.to_ascii_lowercase())
                .unwrap_or_else(|| "text".to_string()),
        )
    }

    pub fn is_select(&self) -> bool {
        self.tag == "select"
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn rect(&self) -> BoundingBox {
        self.rect
    }

    pub(crate) fn set_rect(&mut self, rect: BoundingBox) {
        self.rect = rect;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub(crate) fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// One-line description for logs.
    pub fn describe(&self) -> String {
        let mut out = format!("<{}", self.tag);
        for key in ["type", "name", "id", "autocomplete"] {
            if let Some(v) = self.attribute(key) {
                out.push_str(&format!(" {}=\"{}\"", key, v));
            }
        }
        out.push('>');
        out
    }
}
