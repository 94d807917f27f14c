//! Pre-order element traversal that descends into open shadow roots.

use crate::dom::{Dom, NodeId};

/// Lazy depth-first, pre-order iterator over the elements below a root.
///
/// Text and comment nodes are skipped. When an element hosts an open shadow
/// root, the shadow tree's elements come right after the host and before the
/// host's light children, the way the composed page renders them. Like a DOM
/// `TreeWalker`, the root itself is never yielded and a shadow root attached
/// to the root is not entered.
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

/// Walk every element below `root`, shadow trees included.
///
/// A missing root yields nothing.
pub fn walk(dom: &Dom, root: Option<NodeId>) -> Walk<'_> {
    let stack = match root {
        Some(root) => dom.children(root).iter().rev().copied().collect(),
        None => Vec::new(),
    };
    Walk { dom, stack }
}

impl Walk<'_> {
    fn expand(&mut self, id: NodeId) {
        self.stack.extend(self.dom.children(id).iter().rev());
        if let Some(shadow) = self.dom.shadow_root(id) {
            self.stack.push(shadow);
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            // Stale ids are skipped rather than treated as errors.
            if !self.dom.contains(id) {
                continue;
            }
            if self.dom.is_shadow_root(id) {
                self.expand(id);
                continue;
            }
            if self.dom.is_element(id) {
                self.expand(id);
                return Some(id);
            }
        }
        None
    }
}
