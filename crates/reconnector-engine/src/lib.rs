//! # reconnector-engine
//!
//! Detection and activation of a transient "reconnect" control in a captured
//! document. Browser-agnostic: the host captures the page into a [`Dom`],
//! runs [`Detector::attempt_activation`], and replays the queued
//! [`Command`]s into the live page.
//!
//! ## Quick Start
//!
//! ```rust
//! use reconnector_engine::{Command, Detector, Dom, Notify};
//!
//! struct Flash;
//! impl Notify for Flash {
//!     fn show(&mut self) {}
//! }
//!
//! let mut dom = Dom::new();
//! let body = dom.create_body();
//! dom.append(body, "button").text("Reconnect").size(96.0, 32.0);
//!
//! let detector = Detector::default();
//! assert!(detector.attempt_activation(&mut dom, &mut Flash));
//! assert!(matches!(dom.commands().last(), Some(Command::NativeClick { .. })));
//! ```

pub mod activator;
pub mod classifier;
pub mod detector;
pub mod dom;
pub mod scheduler;
pub mod visibility;
pub mod walker;

pub use activator::{activate, PointerEvent, PointerEventKind, ACTIVATION_SEQUENCE};
pub use classifier::{Classifier, ReconnectTexts, DEFAULT_RECONNECT_TEXTS};
pub use detector::{
    DeepScan, Detector, FindStrategy, Found, KnownSelectors, Notify, DEFAULT_SELECTORS,
};
pub use dom::{Command, Dom, InlineStyle, NodeId, Rect};
pub use scheduler::{ChangeScheduler, MutationKind, MutationRecord, ReadyState};
pub use visibility::is_visible;
pub use walker::{walk, Walk};

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },
}
