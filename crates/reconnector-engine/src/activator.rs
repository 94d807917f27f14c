//! Synthetic user activation.
//!
//! Frameworks bind handlers to different phases of a click, so the full
//! pointer sequence is sent before the native activation.

use serde::Serialize;

use crate::dom::{Command, Dom, NodeId};

/// Pointer event types dispatched during activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerEventKind {
    MouseOver,
    MouseDown,
    MouseUp,
    Click,
}

impl PointerEventKind {
    /// DOM event type name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MouseOver => "mouseover",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::Click => "click",
        }
    }
}

/// Hover, press, release, click.
pub const ACTIVATION_SEQUENCE: [PointerEventKind; 4] = [
    PointerEventKind::MouseOver,
    PointerEventKind::MouseDown,
    PointerEventKind::MouseUp,
    PointerEventKind::Click,
];

/// A synthetic mouse event as handed to `dispatchEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointerEvent {
    #[serde(rename = "type")]
    pub kind: PointerEventKind,
    pub bubbles: bool,
    pub cancelable: bool,
    pub buttons: u16,
}

impl PointerEvent {
    /// Bubbling, cancelable event with the primary button held.
    pub fn primary(kind: PointerEventKind) -> Self {
        Self {
            kind,
            bubbles: true,
            cancelable: true,
            buttons: 1,
        }
    }
}

/// Queue the activation of `node` on the document's outbox.
pub fn activate(dom: &mut Dom, node: NodeId) {
    for kind in ACTIVATION_SEQUENCE {
        dom.push_command(Command::Dispatch {
            node,
            event: PointerEvent::primary(kind),
        });
    }
    dom.push_command(Command::NativeClick { node });
}
