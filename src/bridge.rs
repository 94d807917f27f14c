//! Page bridge: moves documents, mutations and commands across CDP.
//!
//! Page-side state lives under `window.__ringReconnector`: the element
//! registry of the latest snapshot, the mutation observer and its pending
//! records. A navigation wipes it, which [`drain_mutations`] reports so the
//! observer can be reinstalled.

use eoka::Page;
use reconnector_engine::{Command, Dom, MutationRecord, NodeId, PointerEvent, ReadyState, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::{Error, Result};

/// Serializes `document.body` (open shadow roots included) into a flat
/// pre-order node list and records every element in a registry so later
/// commands can address it by index.
///
/// Takes the known selectors; each element the document's `querySelector`
/// returns for one of them lists that selector in `matched`. Layout and
/// rendered text are only read for elements that can pass the structural
/// gate or that a selector matched.
const SNAPSHOT_JS: &str = r#"
((selectors) => {
    const state = window.__ringReconnector || (window.__ringReconnector = {});
    const registry = [];
    state.nodes = registry;
    const nodes = [];
    if (!document.body) return JSON.stringify(nodes);

    const MAYBE_BUTTON = 'button, [role="button"], div[class], a[class], span[class]';
    const TEXT_LIMIT = 512;

    const hits = new Map();
    for (const selector of selectors) {
        let el = null;
        try { el = document.querySelector(selector); } catch (e) { continue; }
        if (!el) continue;
        if (!hits.has(el)) hits.set(el, []);
        hits.get(el).push(selector);
    }

    const stack = [[document.body, null]];
    while (stack.length) {
        const [node, parent] = stack.pop();
        const index = nodes.length;

        if (node.nodeType === Node.TEXT_NODE) {
            nodes.push({ kind: 'text', parent, text: node.data });
            continue;
        }
        if (node.nodeType === Node.DOCUMENT_FRAGMENT_NODE) {
            nodes.push({ kind: 'shadow', parent });
        } else if (node.nodeType === Node.ELEMENT_NODE) {
            const matched = hits.get(node) || [];
            const candidate = node.matches(MAYBE_BUTTON);
            let rect = [0, 0, 0, 0];
            if (candidate || matched.length) {
                const r = node.getBoundingClientRect();
                rect = [r.x, r.y, r.width, r.height];
            }
            let innerText = null;
            if (candidate && typeof node.innerText === 'string') {
                innerText = node.innerText.slice(0, TEXT_LIMIT);
            }
            const attributes = [];
            for (const attr of node.attributes) attributes.push([attr.name, attr.value]);
            const style = node.style || {};
            nodes.push({
                kind: 'element',
                parent,
                tag: node.tagName.toLowerCase(),
                attributes,
                display: style.display || null,
                visibility: style.visibility || null,
                inner_text: innerText,
                rect,
                matched,
                handle: registry.length,
            });
            registry.push(node);
        } else {
            continue;
        }

        const children = node.childNodes;
        for (let i = children.length - 1; i >= 0; i--) stack.push([children[i], index]);
        if (node.shadowRoot) stack.push([node.shadowRoot, index]);
    }
    return JSON.stringify(nodes);
})
"#;

/// Returns the selectors the page's CSS engine rejects.
const CHECK_SELECTORS_JS: &str = r#"
((selectors) => JSON.stringify(selectors.filter((selector) => {
    try { document.createDocumentFragment().querySelector(selector); return false; }
    catch (e) { return true; }
})))
"#;

/// Installs the mutation observer if it is not already running.
const OBSERVE_JS: &str = r#"
((attributes) => {
    const state = window.__ringReconnector || (window.__ringReconnector = {});
    if (state.observer) return true;
    if (!document.body) return false;
    state.records = [];
    state.dropped = 0;
    state.observer = new MutationObserver((mutations) => {
        for (const m of mutations) {
            if (state.records.length >= 512) { state.dropped++; continue; }
            state.records.push({
                kind: m.type,
                added_nodes: m.addedNodes ? m.addedNodes.length : 0,
                attribute_name: m.attributeName || null,
            });
        }
    });
    state.observer.observe(document.body, {
        childList: true,
        subtree: true,
        attributes: true,
        attributeFilter: attributes,
    });
    return true;
})
"#;

const DRAIN_JS: &str = r#"
(() => {
    const state = window.__ringReconnector;
    if (!state || !state.observer) return JSON.stringify({ installed: false, records: [], dropped: 0 });
    const records = state.records;
    const dropped = state.dropped;
    state.records = [];
    state.dropped = 0;
    return JSON.stringify({ installed: true, records, dropped });
})()
"#;

/// Replays activation commands against registry entries.
const REPLAY_JS: &str = r#"
((commands) => {
    const registry = (window.__ringReconnector || {}).nodes || [];
    let applied = 0;
    for (const command of commands) {
        const el = registry[command.handle];
        if (!el || !el.isConnected) continue;
        if (command.event) {
            el.dispatchEvent(new MouseEvent(command.event.type, {
                bubbles: command.event.bubbles,
                cancelable: command.event.cancelable,
                view: window,
                buttons: command.event.buttons,
            }));
        } else if (typeof el.click === 'function') {
            el.click();
        }
        applied++;
    }
    return applied;
})
"#;

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawNode {
    Element {
        parent: Option<usize>,
        tag: String,
        #[serde(default)]
        attributes: Vec<(String, String)>,
        display: Option<String>,
        visibility: Option<String>,
        inner_text: Option<String>,
        rect: [f64; 4],
        #[serde(default)]
        matched: Vec<String>,
        handle: usize,
    },
    Shadow {
        parent: usize,
    },
    Text {
        parent: usize,
        text: String,
    },
}

#[derive(Debug, Deserialize)]
struct Drained {
    installed: bool,
    records: Vec<MutationRecord>,
    #[serde(default)]
    dropped: usize,
}

#[derive(Debug, Serialize)]
struct RemoteCommand {
    handle: usize,
    event: Option<PointerEvent>,
}

/// Browser family the page runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostBrowser {
    Chrome,
    Firefox,
}

impl std::fmt::Display for HostBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chrome => write!(f, "Chrome"),
            Self::Firefox => write!(f, "Firefox"),
        }
    }
}

impl HostBrowser {
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.contains("Firefox/") {
            Self::Firefox
        } else {
            Self::Chrome
        }
    }
}

/// Capture the live document into a [`Dom`], answering `selectors` with the
/// page's own `querySelector`.
pub async fn capture(page: &Page, selectors: &[String]) -> Result<Dom> {
    let js = format!(
        "{}({})",
        SNAPSHOT_JS,
        serde_json::to_string(selectors).unwrap()
    );
    let json: String = page.evaluate(&js).await?;
    let dom = build_dom(&json)?;
    debug!("captured {} nodes", dom.len());
    Ok(dom)
}

/// Rebuild a [`Dom`] from the snapshot payload.
pub fn build_dom(json: &str) -> Result<Dom> {
    let raw: Vec<RawNode> = serde_json::from_str(json)
        .map_err(|e| Error::Bridge(format!("snapshot parse error: {}", e)))?;

    let mut dom = Dom::new();
    let mut ids: Vec<Option<NodeId>> = Vec::with_capacity(raw.len());
    for node in raw {
        let id = match node {
            RawNode::Element {
                parent,
                tag,
                attributes,
                display,
                visibility,
                inner_text,
                rect,
                matched,
                handle,
            } => {
                let id = match parent {
                    None => {
                        if dom.body().is_some() {
                            return Err(Error::Bridge("snapshot has more than one root".into()));
                        }
                        dom.create_body()
                    }
                    Some(p) => dom.append_element(lookup(&ids, p)?, &tag),
                };
                for (name, value) in &attributes {
                    dom.set_attribute(id, name, value);
                }
                dom.set_style(id, "display", display.as_deref().unwrap_or(""));
                dom.set_style(id, "visibility", visibility.as_deref().unwrap_or(""));
                dom.set_inner_text(id, inner_text.as_deref());
                dom.set_rect(id, Rect::new(rect[0], rect[1], rect[2], rect[3]));
                dom.set_handle(id, handle);
                for selector in &matched {
                    dom.set_query_match(selector, id);
                }
                Some(id)
            }
            RawNode::Shadow { parent } => dom.attach_shadow(lookup(&ids, parent)?),
            RawNode::Text { parent, text } => Some(dom.append_text(lookup(&ids, parent)?, &text)),
        };
        ids.push(id);
    }
    Ok(dom)
}

fn lookup(ids: &[Option<NodeId>], index: usize) -> Result<NodeId> {
    ids.get(index)
        .copied()
        .flatten()
        .ok_or_else(|| Error::Bridge(format!("snapshot references unknown parent {}", index)))
}

/// Selectors that are not valid CSS for the page. They never match.
pub async fn invalid_selectors(page: &Page, selectors: &[String]) -> Result<Vec<String>> {
    let js = format!(
        "{}({})",
        CHECK_SELECTORS_JS,
        serde_json::to_string(selectors).unwrap()
    );
    let json: String = page.evaluate(&js).await?;
    serde_json::from_str(&json).map_err(|e| Error::Bridge(format!("selector check error: {}", e)))
}

/// Current `document.readyState`.
pub async fn ready_state(page: &Page) -> Result<ReadyState> {
    let state: String = page.evaluate("document.readyState").await?;
    state.parse().map_err(Error::Bridge)
}

/// Start observing `document.body`. Returns `false` while there is no body.
pub async fn install_observer(page: &Page, attributes: &[String]) -> Result<bool> {
    let js = format!(
        "{}({})",
        OBSERVE_JS,
        serde_json::to_string(attributes).unwrap()
    );
    Ok(page.evaluate(&js).await?)
}

/// Pending mutation records, or `None` if the observer is gone.
pub async fn drain_mutations(page: &Page) -> Result<Option<Vec<MutationRecord>>> {
    let json: String = page.evaluate(DRAIN_JS).await?;
    let drained: Drained = serde_json::from_str(&json)
        .map_err(|e| Error::Bridge(format!("mutation parse error: {}", e)))?;
    if !drained.installed {
        return Ok(None);
    }
    if drained.dropped > 0 {
        debug!("observer dropped {} records", drained.dropped);
    }
    Ok(Some(drained.records))
}

/// Replay queued commands into the page. Returns how many were applied.
pub async fn replay(page: &Page, dom: &mut Dom) -> Result<usize> {
    let commands = remote_commands(dom);
    if commands.is_empty() {
        return Ok(0);
    }
    let js = format!(
        "{}({})",
        REPLAY_JS,
        serde_json::to_string(&commands).unwrap()
    );
    let applied: usize = page.evaluate(&js).await?;
    debug!("replayed {}/{} commands", applied, commands.len());
    Ok(applied)
}

/// Drain the outbox, dropping commands for nodes with no live handle.
fn remote_commands(dom: &mut Dom) -> Vec<RemoteCommand> {
    let handles: HashMap<NodeId, usize> = dom
        .commands()
        .iter()
        .filter_map(|c| dom.handle(c.node()).map(|h| (c.node(), h)))
        .collect();
    dom.take_commands()
        .into_iter()
        .filter_map(|command| {
            let handle = *handles.get(&command.node())?;
            Some(match command {
                Command::Dispatch { event, .. } => RemoteCommand {
                    handle,
                    event: Some(event),
                },
                Command::NativeClick { .. } => RemoteCommand {
                    handle,
                    event: None,
                },
            })
        })
        .collect()
}

/// Which browser the page runs in. Only used for logging.
pub async fn probe_environment(page: &Page) -> Result<HostBrowser> {
    let user_agent: String = page.evaluate("navigator.userAgent").await?;
    Ok(HostBrowser::from_user_agent(&user_agent))
}
