//! Page overlays: inline icons, selection menus, notifications and the
//! save prompt.
//!
//! Every overlay element carries a class starting with [`UI_PREFIX`] so the
//! mutation watcher can tell the controller's own nodes from page content.

use vaultbridge_dom::{BoundingBox, Document, NodeId, Viewport};

pub const UI_PREFIX: &str = "vaultbridge-";

pub const ICON_CLASS: &str = "vaultbridge-icon";
pub const CARD_ICON_CLASS: &str = "vaultbridge-card-icon";
pub const MENU_CLASS: &str = "vaultbridge-menu";
pub const CARD_MENU_CLASS: &str = "vaultbridge-card-menu";
pub const MENU_ITEM_CLASS: &str = "vaultbridge-menu-item";
pub const NOTIFICATION_CLASS: &str = "vaultbridge-notification";
pub const SAVE_PROMPT_CLASS: &str = "vaultbridge-save-prompt";
pub const SAVE_BUTTON_CLASS: &str = "vaultbridge-btn-save";
pub const CANCEL_BUTTON_CLASS: &str = "vaultbridge-btn-cancel";

/// Set on login fields once focus/blur handling is attached.
pub const LISTENER_MARKER: &str = "data-vaultbridge-listener";
/// Set on password fields that have an inline icon.
pub const ICON_MARKER: &str = "data-vaultbridge-icon";
/// Set on card fields that have an inline icon.
pub const CARD_ICON_MARKER: &str = "data-vaultbridge-card-icon";
/// Set on submit-like controls being watched.
pub const SUBMIT_MARKER: &str = "data-vaultbridge-submit";

pub const ICON_SIZE: f64 = 24.0;
const ICON_RIGHT_INSET: f64 = 30.0;
const MENU_GAP: f64 = 2.0;

/// Absolute page position of an overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub top: f64,
    pub left: f64,
}

/// Icon position: vertically centred, inset from the field's right edge.
pub fn icon_placement(rect: BoundingBox, viewport: Viewport) -> Placement {
    Placement {
        top: rect.top() + viewport.scroll_y + (rect.height - ICON_SIZE) / 2.0,
        left: rect.left() + viewport.scroll_x + rect.width - ICON_RIGHT_INSET,
    }
}

/// Menu position: just below the field, left-aligned with it.
pub fn menu_placement(rect: BoundingBox, viewport: Viewport) -> Placement {
    Placement {
        top: rect.bottom() + viewport.scroll_y + MENU_GAP,
        left: rect.left() + viewport.scroll_x,
    }
}

/// Value of `name` in an inline `style` attribute.
pub fn style_property<'a>(style: &'a str, name: &str) -> Option<&'a str> {
    style.split(';').find_map(|decl| {
        let (key, value) = decl.split_once(':')?;
        (key.trim() == name).then(|| value.trim())
    })
}

/// Whether `id` belongs to an overlay created by the controller.
pub fn is_own_ui(doc: &Document, id: NodeId) -> bool {
    let mut current = Some(id);
    while let Some(node) = current {
        if doc.element(node).has_class_prefix(UI_PREFIX) {
            return true;
        }
        current = doc.parent(node);
    }
    false
}

/// Nearest inclusive ancestor carrying `class`.
pub fn closest_class(doc: &Document, id: NodeId, class: &str) -> Option<NodeId> {
    let mut current = Some(id);
    while let Some(node) = current {
        if doc.element(node).has_class(class) {
            return Some(node);
        }
        current = doc.parent(node);
    }
    None
}

/// Create the inline icon for `field` and attach it to `<body>`.
pub fn create_icon(doc: &mut Document, field: NodeId, card: bool) -> NodeId {
    let icon = doc.create_element("div");
    if card {
        doc.set_attribute(icon, "class", &format!("{ICON_CLASS} {CARD_ICON_CLASS}"));
        doc.set_attribute(icon, "title", "Auto-fill credit card from VaultZero");
    } else {
        doc.set_attribute(icon, "class", ICON_CLASS);
        doc.set_attribute(icon, "title", "Auto-fill with VaultZero");
    }
    doc.append_element(icon, "img", &[("alt", "VaultZero")]);
    position_icon(doc, icon, field);
    let body = doc.body();
    doc.append_child(body, icon);
    icon
}

/// Move `icon` to track `field`'s current box.
pub fn position_icon(doc: &mut Document, icon: NodeId, field: NodeId) {
    let at = icon_placement(doc.rect(field), doc.viewport());
    let style = format!(
        "position: absolute; top: {}px; left: {}px; width: {ICON_SIZE}px; height: {ICON_SIZE}px; cursor: pointer; z-index: 10000",
        at.top, at.left
    );
    doc.set_attribute(icon, "style", &style);
}

/// One menu row: a title line and a detail line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub title: String,
    pub detail: String,
}

/// Build a selection menu under `trigger` and attach it to `<body>`.
///
/// Returns the menu node and one item node per entry, in order.
pub fn create_menu(
    doc: &mut Document,
    trigger: NodeId,
    entries: &[MenuEntry],
    card: bool,
) -> (NodeId, Vec<NodeId>) {
    let menu = doc.create_element("div");
    let class = if card {
        format!("{MENU_CLASS} {CARD_MENU_CLASS}")
    } else {
        MENU_CLASS.to_string()
    };
    doc.set_attribute(menu, "class", &class);

    let items = entries
        .iter()
        .map(|entry| {
            let item = doc.append_element(menu, "div", &[("class", MENU_ITEM_CLASS)]);
            let title = doc.append_element(item, "div", &[("class", "vaultbridge-menu-item-name")]);
            doc.set_text(title, &entry.title);
            let detail =
                doc.append_element(item, "div", &[("class", "vaultbridge-menu-item-username")]);
            doc.set_text(detail, &entry.detail);
            item
        })
        .collect();

    let rect = doc.rect(trigger);
    let at = menu_placement(rect, doc.viewport());
    let style = format!(
        "position: absolute; top: {}px; left: {}px; min-width: {}px",
        at.top, at.left, rect.width
    );
    doc.set_attribute(menu, "style", &style);

    let body = doc.body();
    doc.append_child(body, menu);
    (menu, items)
}

/// Transient notice attached to `<body>`.
pub fn create_notification(doc: &mut Document, message: &str) -> NodeId {
    let body = doc.body();
    let node = doc.create_element("div");
    doc.set_attribute(node, "class", NOTIFICATION_CLASS);
    doc.set_text(node, message);
    doc.append_child(body, node);
    node
}

/// Nodes of a displayed save prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavePrompt {
    pub node: NodeId,
    pub save: NodeId,
    pub cancel: NodeId,
}

/// "Save to VaultZero?" prompt for `username` on `hostname`.
pub fn create_save_prompt(doc: &mut Document, username: &str, hostname: &str) -> SavePrompt {
    let node = doc.create_element("div");
    doc.set_attribute(node, "class", SAVE_PROMPT_CLASS);
    let content = doc.append_element(node, "div", &[("class", "vaultbridge-save-content")]);
    let title = doc.append_element(content, "strong", &[]);
    doc.set_text(title, "Save to VaultZero?");
    let details = doc.append_element(content, "div", &[("class", "vaultbridge-save-details")]);
    doc.set_text(details, &format!("{username} on {hostname}"));
    let buttons = doc.append_element(content, "div", &[("class", "vaultbridge-save-buttons")]);
    let save = doc.append_element(buttons, "button", &[("class", SAVE_BUTTON_CLASS)]);
    doc.set_text(save, "Save");
    let cancel = doc.append_element(buttons, "button", &[("class", CANCEL_BUTTON_CLASS)]);
    doc.set_text(cancel, "Not now");

    let body = doc.body();
    doc.append_child(body, node);
    SavePrompt { node, save, cancel }
}

#[cfg(test)]
#[path = "ui_tests.rs"]
mod tests;
