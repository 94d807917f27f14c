//! In-memory element tree.
//!
//! A [`Dom`] is an arena of nodes mirroring the parts of a browser document the
//! engine looks at: elements with their attributes, inline style and rendered
//! box, text and comment nodes, and attached open shadow roots. Live pages are
//! captured into a `Dom` once per detection pass; tests build one by hand.
//!
//! Selector matching is not done here. The page answers `querySelector` for
//! each known selector at capture time and the answers are stored alongside
//! the tree (see [`Dom::query_selector`]).
//!
//! Activation never touches the page directly. The activator queues
//! [`Command`]s on the arena's outbox and the host replays them afterwards.

use crate::activator::PointerEvent;

/// Opaque handle to a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Rendered bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box at the origin with the given size.
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// The inline style properties that affect visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub display: Option<String>,
    pub visibility: Option<String>,
}

/// A deferred side effect on a live element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Dispatch a synthetic pointer event on the element.
    Dispatch { node: NodeId, event: PointerEvent },
    /// Invoke the element's native `click()` if it has one.
    NativeClick { node: NodeId },
}

impl Command {
    pub fn node(&self) -> NodeId {
        match self {
            Command::Dispatch { node, .. } | Command::NativeClick { node } => *node,
        }
    }
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    style: InlineStyle,
    rect: Rect,
    inner_text: Option<String>,
    text_content: Option<String>,
    shadow_root: Option<NodeId>,
    handle: Option<usize>,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(ElementData),
    Text(String),
    Comment,
    ShadowRoot,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document tree.
#[derive(Debug, Clone, Default)]
pub struct Dom {
    nodes: Vec<Node>,
    body: Option<NodeId>,
    queries: Vec<(String, NodeId)>,
    outbox: Vec<Command>,
}

impl Dom {
    /// Create an empty document with no body yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the `<body>` element and make it the document body.
    pub fn create_body(&mut self) -> NodeId {
        let id = self.push(NodeKind::Element(ElementData::new("body")), None);
        self.body = Some(id);
        id
    }

    /// The document body, if the document has one.
    pub fn body(&self) -> Option<NodeId> {
        self.body
    }

    /// Number of nodes in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    // --- building ---

    /// Append a new element under `parent` (an element or a shadow root).
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData::new(tag)), Some(parent))
    }

    /// Append a new element and return a builder for it.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> ElementMut<'_> {
        let id = self.append_element(parent, tag);
        ElementMut { dom: self, id }
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()), Some(parent))
    }

    pub fn append_comment(&mut self, parent: NodeId) -> NodeId {
        self.push(NodeKind::Comment, Some(parent))
    }

    /// Attach an open shadow root to `host`, or return the existing one.
    ///
    /// Returns `None` if `host` is not an element.
    pub fn attach_shadow(&mut self, host: NodeId) -> Option<NodeId> {
        let existing = self.element(host)?.shadow_root;
        if existing.is_some() {
            return existing;
        }
        let root = self.push(NodeKind::ShadowRoot, None);
        self.nodes[root.0].parent = Some(host);
        if let Some(el) = self.element_mut(host) {
            el.shadow_root = Some(root);
        }
        Some(root)
    }

    /// Detach a node from its parent. Its id stays valid but it is no longer
    /// reachable from the body.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.retain(|c| *c != id);
            if let NodeKind::Element(el) = &mut p.kind {
                if el.shadow_root == Some(id) {
                    el.shadow_root = None;
                }
            }
        }
        self.nodes[id.0].parent = None;
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        let name = name.to_ascii_lowercase();
        match el.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => el.attributes.push((name, value.to_string())),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        }
    }

    /// Set an inline style property. Only `display` and `visibility` are kept.
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        let value = (!value.is_empty()).then(|| value.to_string());
        match property {
            "display" => el.style.display = value,
            "visibility" => el.style.visibility = value,
            _ => {}
        }
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        if let Some(el) = self.element_mut(id) {
            el.rect = rect;
        }
    }

    /// Override the rendered (`innerText`) text of an element.
    pub fn set_inner_text(&mut self, id: NodeId, text: Option<&str>) {
        if let Some(el) = self.element_mut(id) {
            el.inner_text = text.map(str::to_string);
        }
    }

    /// Override the raw text content of an element instead of deriving it
    /// from descendant text nodes.
    pub fn set_text_content(&mut self, id: NodeId, text: Option<&str>) {
        if let Some(el) = self.element_mut(id) {
            el.text_content = text.map(str::to_string);
        }
    }

    /// Record `node` as the first match of `selector` in document order.
    pub fn set_query_match(&mut self, selector: &str, node: NodeId) {
        if !self.is_element(node) {
            return;
        }
        match self.queries.iter_mut().find(|(s, _)| s == selector) {
            Some((_, n)) => *n = node,
            None => self.queries.push((selector.to_string(), node)),
        }
    }

    /// Associate an element with its index in the live page registry.
    pub fn set_handle(&mut self, id: NodeId, handle: usize) {
        if let Some(el) = self.element_mut(id) {
            el.handle = Some(handle);
        }
    }

    // --- reading ---

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_shadow_root(&self, id: NodeId) -> bool {
        matches!(self.node(id).map(|n| &n.kind), Some(NodeKind::ShadowRoot))
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    /// Attribute value by (case-insensitive) name.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// The `class` attribute, or an empty string.
    pub fn class_name(&self, id: NodeId) -> &str {
        self.attribute(id, "class").unwrap_or("")
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id).map(|el| el.attributes.as_slice()).unwrap_or(&[])
    }

    pub fn style(&self, id: NodeId) -> Option<&InlineStyle> {
        self.element(id).map(|el| &el.style)
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.element(id).map(|el| el.rect)
    }

    pub fn inner_text(&self, id: NodeId) -> Option<&str> {
        self.element(id)?.inner_text.as_deref()
    }

    /// Concatenated text of all descendant text nodes, like `textContent`.
    ///
    /// Shadow trees do not contribute. An explicit override set with
    /// [`Dom::set_text_content`] stands in for the element's whole subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            match &node.kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element(el) if el.text_content.is_some() => {
                    out.push_str(el.text_content.as_deref().unwrap_or_default());
                }
                NodeKind::Comment => {}
                _ => stack.extend(node.children.iter().rev()),
            }
        }
        out
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// The element's attached open shadow root.
    pub fn shadow_root(&self, id: NodeId) -> Option<NodeId> {
        self.element(id)?.shadow_root
    }

    /// First element matching `selector`, as recorded at capture time.
    ///
    /// `None` when the selector matched nothing or was never queried.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.queries
            .iter()
            .find(|(s, _)| s == selector)
            .map(|(_, node)| *node)
    }

    /// Live registry index recorded at capture time.
    pub fn handle(&self, id: NodeId) -> Option<usize> {
        self.element(id)?.handle
    }

    // --- outbox ---

    pub fn push_command(&mut self, command: Command) {
        self.outbox.push(command);
    }

    /// Commands queued so far, oldest first.
    pub fn commands(&self) -> &[Command] {
        &self.outbox
    }

    /// Drain the outbox.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            style: InlineStyle::default(),
            rect: Rect::default(),
            inner_text: None,
            text_content: None,
            shadow_root: None,
            handle: None,
        }
    }
}

/// Chained builder over a freshly appended element.
pub struct ElementMut<'a> {
    dom: &'a mut Dom,
    id: NodeId,
}

impl ElementMut<'_> {
    pub fn attr(self, name: &str, value: &str) -> Self {
        self.dom.set_attribute(self.id, name, value);
        self
    }

    pub fn class(self, value: &str) -> Self {
        self.attr("class", value)
    }

    /// Append a text node child.
    pub fn text(self, text: &str) -> Self {
        self.dom.append_text(self.id, text);
        self
    }

    pub fn inner_text(self, text: &str) -> Self {
        self.dom.set_inner_text(self.id, Some(text));
        self
    }

    pub fn style(self, property: &str, value: &str) -> Self {
        self.dom.set_style(self.id, property, value);
        self
    }

    pub fn size(self, width: f64, height: f64) -> Self {
        self.dom.set_rect(self.id, Rect::sized(width, height));
        self
    }

    /// Mark the element as the `querySelector` answer for `selector`.
    pub fn matches(self, selector: &str) -> Self {
        self.dom.set_query_match(selector, self.id);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}
