//! Finding and activating the reconnect control.
//!
//! Detection runs an ordered list of [`FindStrategy`]s: fixed selectors for
//! markup seen on known page versions first, then a full classifier scan that
//! survives markup changes. The first visible hit is activated.

use tracing::{debug, info};

use crate::activator::activate;
use crate::classifier::Classifier;
use crate::dom::{Dom, NodeId};
use crate::visibility::is_visible;
use crate::walker::walk;
use crate::{Error, Result};

/// Structural signatures of the reconnect control on known page versions.
pub const DEFAULT_SELECTORS: &[&str] = &[
    r#"button[data-testid="modal__accept-button"]"#,
    r#"[data-testid="live-view__global-reconnect-modal"] button"#,
];

/// Callback flashed after a successful activation.
pub trait Notify {
    fn show(&mut self);
}

/// One way of locating a visible reconnect control.
pub trait FindStrategy: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    fn find(&self, dom: &Dom, classifier: &Classifier) -> Option<NodeId>;
}

/// Fast path: fixed selectors checked in order.
///
/// Selectors are plain CSS handed to the page's `document.querySelector`; the
/// captured [`Dom`] carries each answer. Like `querySelector` on the document,
/// only the light tree is searched.
#[derive(Debug, Clone)]
pub struct KnownSelectors {
    selectors: Vec<String>,
}

impl KnownSelectors {
    /// Collect selector sources, rejecting blank ones.
    pub fn new<I, S>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selectors = Vec::new();
        for source in sources {
            let selector = source.as_ref().trim();
            if selector.is_empty() {
                return Err(Error::Selector {
                    selector: source.as_ref().to_string(),
                    reason: "empty selector".into(),
                });
            }
            selectors.push(selector.to_string());
        }
        Ok(Self { selectors })
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }
}

impl Default for KnownSelectors {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_SELECTORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FindStrategy for KnownSelectors {
    fn name(&self) -> &'static str {
        "known selector"
    }

    fn find(&self, dom: &Dom, _classifier: &Classifier) -> Option<NodeId> {
        self.selectors.iter().find_map(|selector| {
            let node = dom.query_selector(selector)?;
            if is_visible(dom, node) {
                debug!("selector '{}' matched a visible element", selector);
                Some(node)
            } else {
                None
            }
        })
    }
}

/// Fallback: walk the whole body, shadow trees included.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepScan;

impl FindStrategy for DeepScan {
    fn name(&self) -> &'static str {
        "deep scan"
    }

    fn find(&self, dom: &Dom, classifier: &Classifier) -> Option<NodeId> {
        walk(dom, dom.body())
            .find(|&node| classifier.is_reconnect_control(dom, node) && is_visible(dom, node))
    }
}

/// A located control and the strategy that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Found {
    pub node: NodeId,
    pub strategy: &'static str,
}

/// Orchestrates the strategies and the activator.
pub struct Detector {
    classifier: Classifier,
    strategies: Vec<Box<dyn FindStrategy>>,
}

impl Detector {
    /// Known selectors first, deep scan second.
    pub fn new(classifier: Classifier, selectors: KnownSelectors) -> Self {
        Self::with_strategies(classifier, vec![Box::new(selectors), Box::new(DeepScan)])
    }

    pub fn with_strategies(classifier: Classifier, strategies: Vec<Box<dyn FindStrategy>>) -> Self {
        Self {
            classifier,
            strategies,
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First visible control, trying strategies in order.
    pub fn find_control(&self, dom: &Dom) -> Option<Found> {
        self.strategies.iter().find_map(|strategy| {
            strategy.find(dom, &self.classifier).map(|node| Found {
                node,
                strategy: strategy.name(),
            })
        })
    }

    /// Find and activate a control, then notify. Returns whether one was found.
    ///
    /// At most one control is activated per call.
    pub fn attempt_activation(&self, dom: &mut Dom, notifier: &mut dyn Notify) -> bool {
        let Some(found) = self.find_control(dom) else {
            return false;
        };
        info!(
            "Found reconnect control via {}: <{}> \"{}\"",
            found.strategy,
            dom.tag_name(found.node).unwrap_or("?"),
            Classifier::control_text(dom, found.node)
        );
        activate(dom, found.node);
        notifier.show();
        true
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(Classifier::default(), KnownSelectors::default())
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("classifier", &self.classifier)
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Command;

    #[derive(Default)]
    struct Counter(usize);

    impl Notify for Counter {
        fn show(&mut self) {
            self.0 += 1;
        }
    }

    fn clicked(dom: &Dom) -> Vec<NodeId> {
        dom.commands()
            .iter()
            .filter_map(|c| match c {
                Command::NativeClick { node } => Some(*node),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_default_strategy_order() {
        assert_eq!(
            Detector::default().strategy_names(),
            ["known selector", "deep scan"]
        );
    }

    #[test]
    fn test_known_selector_fast_path() {
        let mut dom = Dom::new();
        let body = dom.create_body();
        // Label is not in the text table; only the selector can find it.
        let button = dom
            .append(body, "button")
            .attr("data-testid", "modal__accept-button")
            .text("OK")
            .size(90.0, 32.0)
            .matches(DEFAULT_SELECTORS[0])
            .id();

        let found = Detector::default().find_control(&dom).unwrap();
        assert_eq!(found.node, button);
        assert_eq!(found.strategy, "known selector");
    }

    #[test]
    fn test_hidden_selector_match_falls_through() {
        let mut dom = Dom::new();
        let body = dom.create_body();
        dom.append(body, "button")
            .attr("data-testid", "modal__accept-button")
            .attr("hidden", "")
            .text("Reconnect")
            .size(90.0, 32.0)
            .matches(DEFAULT_SELECTORS[0]);
        let modal = dom
            .append(body, "div")
            .attr("data-testid", "live-view__global-reconnect-modal")
            .id();
        let second = dom
            .append(modal, "button")
            .text("Go")
            .size(90.0, 32.0)
            .matches(DEFAULT_SELECTORS[1])
            .id();

        let found = Detector::default().find_control(&dom).unwrap();
        assert_eq!(found.node, second);
    }

    #[test]
    fn test_deep_scan_inside_shadow_root() {
        let mut dom = Dom::new();
        let body = dom.create_body();
        let host = dom.append_element(body, "live-player");
        let shadow = dom.attach_shadow(host).unwrap();
        let button = dom
            .append(shadow, "span")
            .class("ui-button")
            .text("Reconectar")
            .size(40.0, 20.0)
            .id();

        let found = Detector::default().find_control(&dom).unwrap();
        assert_eq!(found.node, button);
        assert_eq!(found.strategy, "deep scan");
    }

    #[test]
    fn test_not_found() {
        let mut dom = Dom::new();
        let body = dom.create_body();
        dom.append(body, "button").text("Disconnect").size(40.0, 20.0);
        dom.append(body, "p").text("Reconnect").size(40.0, 20.0);

        let mut notifier = Counter::default();
        assert!(!Detector::default().attempt_activation(&mut dom, &mut notifier));
        assert_eq!(notifier.0, 0);
        assert!(dom.commands().is_empty());
    }

    #[test]
    fn test_no_body() {
        let mut dom = Dom::new();
        let mut notifier = Counter::default();
        assert!(!Detector::default().attempt_activation(&mut dom, &mut notifier));
    }

    #[test]
    fn test_first_match_wins() {
        let mut dom = Dom::new();
        let body = dom.create_body();
        let first = dom.append(body, "button").text("Reconnect").size(40.0, 20.0).id();
        dom.append(body, "button").text("Reconnect").size(40.0, 20.0);

        let mut notifier = Counter::default();
        assert!(Detector::default().attempt_activation(&mut dom, &mut notifier));
        assert_eq!(clicked(&dom), [first]);
        assert_eq!(dom.commands().len(), 5);
        assert_eq!(notifier.0, 1);
    }

    #[test]
    fn test_custom_strategy_runs_first() {
        struct ById;
        impl FindStrategy for ById {
            fn name(&self) -> &'static str {
                "by id"
            }
            fn find(&self, dom: &Dom, _: &Classifier) -> Option<NodeId> {
                walk(dom, dom.body()).find(|&n| dom.attribute(n, "id") == Some("retry"))
            }
        }

        let mut dom = Dom::new();
        let body = dom.create_body();
        dom.append(body, "button").text("Reconnect").size(40.0, 20.0);
        let retry = dom.append(body, "div").attr("id", "retry").id();

        let detector = Detector::with_strategies(
            Classifier::default(),
            vec![Box::new(ById), Box::new(DeepScan)],
        );
        assert_eq!(detector.find_control(&dom).unwrap().node, retry);
    }

    #[test]
    fn test_selector_without_answer_is_skipped() {
        let mut dom = Dom::new();
        let body = dom.create_body();
        // Matches the markup but the page never reported it.
        dom.append(body, "button")
            .attr("data-testid", "modal__accept-button")
            .text("OK")
            .size(90.0, 32.0);

        assert!(Detector::default().find_control(&dom).is_none());
    }

    #[test]
    fn test_arbitrary_selector_syntax() {
        let selectors = KnownSelectors::new([
            "button:not([disabled])",
            r#"[data-testid^="live-view"] button"#,
        ])
        .unwrap();
        let mut dom = Dom::new();
        let body = dom.create_body();
        let button = dom
            .append(body, "button")
            .text("Resume")
            .size(60.0, 20.0)
            .matches(r#"[data-testid^="live-view"] button"#)
            .id();

        let found = Detector::new(Classifier::default(), selectors)
            .find_control(&dom)
            .unwrap();
        assert_eq!(found.node, button);
        assert_eq!(found.strategy, "known selector");
    }

    #[test]
    fn test_blank_selector_rejected() {
        let err = KnownSelectors::new(["button", "  "]).unwrap_err();
        assert!(err.to_string().contains("empty selector"));
        assert_eq!(
            KnownSelectors::new([" button "]).unwrap().selectors(),
            ["button"]
        );
    }
}
