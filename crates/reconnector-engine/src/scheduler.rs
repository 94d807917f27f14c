//! When to run detection.
//!
//! Three triggers feed the detector: a one-shot startup trigger once the
//! document stops loading, a mutation trigger for structural and visibility
//! changes, and a flat polling interval as the safety net. The scheduler owns
//! all of its state so it can be driven without a page.

use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::debug;

/// Attributes whose changes can reveal or hide a control.
pub const OBSERVED_ATTRIBUTES: &[&str] = &["class", "style", "hidden", "aria-hidden"];

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2_000);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// `document.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl FromStr for ReadyState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loading" => Ok(Self::Loading),
            "interactive" => Ok(Self::Interactive),
            "complete" => Ok(Self::Complete),
            other => Err(format!("unknown ready state '{}'", other)),
        }
    }
}

/// Kind of document change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    ChildList,
    Attributes,
}

/// One observed document change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MutationRecord {
    pub kind: MutationKind,
    #[serde(default)]
    pub added_nodes: usize,
    #[serde(default)]
    pub attribute_name: Option<String>,
}

impl MutationRecord {
    pub fn child_list(added_nodes: usize) -> Self {
        Self {
            kind: MutationKind::ChildList,
            added_nodes,
            attribute_name: None,
        }
    }

    pub fn attribute(name: &str) -> Self {
        Self {
            kind: MutationKind::Attributes,
            added_nodes: 0,
            attribute_name: Some(name.to_string()),
        }
    }
}

/// Trigger state machine.
#[derive(Debug, Clone)]
pub struct ChangeScheduler {
    poll_interval: Duration,
    debounce: Duration,
    attributes: Vec<String>,
    started: bool,
    last_significant_change: Option<Instant>,
}

impl ChangeScheduler {
    pub fn new(poll_interval: Duration, debounce: Duration) -> Self {
        Self {
            poll_interval,
            debounce,
            attributes: OBSERVED_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
            started: false,
            last_significant_change: None,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Attribute allow-list for the mutation observer.
    pub fn observed_attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn last_significant_change(&self) -> Option<Instant> {
        self.last_significant_change
    }

    /// Startup trigger. True exactly once, the first time the document is no
    /// longer loading.
    pub fn on_ready_state(&mut self, state: ReadyState) -> bool {
        if self.started || state == ReadyState::Loading {
            return false;
        }
        self.started = true;
        true
    }

    /// Whether a single change could have revealed a control.
    pub fn is_significant(&self, record: &MutationRecord) -> bool {
        match record.kind {
            MutationKind::ChildList => record.added_nodes > 0,
            MutationKind::Attributes => record
                .attribute_name
                .as_deref()
                .is_some_and(|name| self.attributes.iter().any(|a| a == name)),
        }
    }

    /// Mutation trigger. True when the batch qualifies and the previous
    /// triggering batch is older than the debounce window.
    ///
    /// Suppressed batches do not extend the window.
    pub fn on_mutations(&mut self, records: &[MutationRecord], now: Instant) -> bool {
        if !records.iter().any(|r| self.is_significant(r)) {
            return false;
        }
        if let Some(last) = self.last_significant_change {
            if now.saturating_duration_since(last) < self.debounce {
                debug!("mutation batch debounced ({} records)", records.len());
                return false;
            }
        }
        self.last_significant_change = Some(now);
        true
    }
}

impl Default for ChangeScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_DEBOUNCE)
    }
}
