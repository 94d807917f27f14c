//! Reconnect control classification.

use crate::dom::{Dom, NodeId};

/// Built-in reconnect labels, lowercase.
pub const DEFAULT_RECONNECT_TEXTS: &[&str] = &[
    "reconnect",
    "reconnect again",
    "verbindung wiederherstellen",
    "reconectar",
    "reconnecter",
    "riconnetti",
    "opnieuw verbinden",
    "yeniden bağlan",
    "připojit znovu",
    "połącz ponownie",
    "переподключиться",
    "újracsatlakozás",
    "重新连接",
    "再接続",
];

/// Tags treated as clickable containers when their class names say so.
const CONTAINER_TAGS: &[&str] = &["div", "a", "span"];

/// Class name fragments that mark a container as button-like.
const BUTTON_CLASS_TOKENS: &[&str] = &["btn", "button"];

/// Ordered set of lowercase "reconnect" labels.
///
/// Matching is substring containment so longer labels such as
/// "Reconnect Again" still hit the base entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectTexts {
    entries: Vec<String>,
}

impl ReconnectTexts {
    /// Build a table from arbitrary labels. Entries are trimmed and
    /// lowercased; empty entries and duplicates are dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self {
            entries: Vec::new(),
        };
        table.extend(entries);
        table
    }

    /// Append more labels, keeping first occurrences.
    pub fn extend<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for entry in entries {
            let entry = entry.as_ref().trim().to_lowercase();
            if !entry.is_empty() && !self.entries.contains(&entry) {
                self.entries.push(entry);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Whether `text` contains any entry, ignoring case.
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.entries.iter().any(|entry| text.contains(entry.as_str()))
    }
}

impl Default for ReconnectTexts {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_TEXTS)
    }
}

/// Decides whether an element is a reconnect control.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    texts: ReconnectTexts,
}

impl Classifier {
    pub fn new(texts: ReconnectTexts) -> Self {
        Self { texts }
    }

    /// Structural gate: native button, `role="button"`, or a div/a/span whose
    /// class name contains "btn" or "button".
    pub fn is_button_like(dom: &Dom, node: NodeId) -> bool {
        let Some(tag) = dom.tag_name(node) else {
            return false;
        };
        if tag == "button" || dom.attribute(node, "role") == Some("button") {
            return true;
        }
        if !CONTAINER_TAGS.contains(&tag) {
            return false;
        }
        let class = dom.class_name(node).to_ascii_lowercase();
        BUTTON_CLASS_TOKENS.iter().any(|token| class.contains(*token))
    }

    /// Rendered text if any, else raw text content; trimmed and lowercased.
    pub fn control_text(dom: &Dom, node: NodeId) -> String {
        let text = match dom.inner_text(node) {
            Some(rendered) if !rendered.is_empty() => rendered.to_string(),
            _ => dom.text_content(node),
        };
        text.trim().to_lowercase()
    }

    /// Structural gate first, then the text table.
    pub fn is_reconnect_control(&self, dom: &Dom, node: NodeId) -> bool {
        if !Self::is_button_like(dom, node) {
            return false;
        }
        let text = Self::control_text(dom, node);
        !text.is_empty() && self.texts.matches(&text)
    }
}
