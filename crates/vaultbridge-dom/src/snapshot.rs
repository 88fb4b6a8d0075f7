//! Serializable page snapshots.
//!
//! A snapshot is a JSON description of a page body, used by the `scan`
//! command and by tests to build documents without a browser.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::error::DomError;
use crate::types::{BoundingBox, NodeId, Viewport};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub url: String,
    #[serde(default)]
    pub viewport: Viewport,
    /// Children of `<body>`.
    #[serde(default)]
    pub body: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Current value; falls back to the `value` attribute when absent.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rect: Option<BoundingBox>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub children: Vec<NodeSnapshot>,
}

impl Document {
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Result<Self, DomError> {
        let mut doc = Document::new(&snapshot.url)?;
        doc.set_viewport(snapshot.viewport);
        let body = doc.body();
        for node in &snapshot.body {
            doc.build_node(body, node);
        }
        Ok(doc)
    }

    pub fn from_json(json: &str) -> Result<Self, DomError> {
        let snapshot: DocumentSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }

    pub fn from_value(value: Value) -> Result<Self, DomError> {
        let snapshot: DocumentSnapshot = serde_json::from_value(value)?;
        Self::from_snapshot(&snapshot)
    }

    fn build_node(&mut self, parent: NodeId, node: &NodeSnapshot) -> NodeId {
        let id = self.create_element(&node.tag);
        for (name, value) in &node.attributes {
            self.set_attribute(id, name, value);
        }
        if let Some(ref value) = node.value {
            self.set_value(id, value);
        }
        if let Some(ref text) = node.text {
            self.set_text(id, text);
        }
        if let Some(rect) = node.rect {
            self.set_rect(id, rect);
        }
        self.set_hidden(id, node.hidden);
        self.append_child(parent, id);
        for child in &node.children {
            self.build_node(id, child);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_value_builds_tree() {
        let doc = Document::from_value(json!({
            "url": "https://example.com/login",
            "body": [{
                "tag": "form",
                "children": [
                    {"tag": "input", "attributes": {"type": "email", "value": "a@b.c"}},
                    {"tag": "input", "attributes": {"type": "password"}, "value": "pw",
                     "rect": {"x": 10.0, "y": 20.0, "width": 200.0, "height": 30.0}},
                    {"tag": "button", "text": "Sign in", "hidden": true}
                ]
            }]
        }))
        .unwrap();

        let form = doc.children(doc.body())[0];
        let fields = doc.children(form).to_vec();
        assert_eq!(fields.len(), 3);
        assert_eq!(doc.value(fields[0]), "a@b.c");
        assert_eq!(doc.value(fields[1]), "pw");
        assert_eq!(doc.rect(fields[1]).width, 200.0);
        assert!(!doc.is_visible(fields[2]));
        assert_eq!(doc.text_content(form), "Sign in");
        assert_eq!(doc.hostname(), "example.com");
    }

    #[test]
    fn test_invalid_snapshot() {
        assert!(matches!(
            Document::from_json("{\"body\": []}"),
            Err(DomError::Snapshot(_))
        ));
        assert!(matches!(
            Document::from_json("{\"url\": \"not a url\"}"),
            Err(DomError::InvalidUrl(_))
        ));
    }
}
