//! Reconnect notification overlay: a small spinner in the page corner.

use eoka::Page;
use reconnector_engine::Notify;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

const STYLE_ID: &str = "ring-reconnector-style";

const STYLE_CSS: &str = r#"
@keyframes ring-reconnector-rotate {
    from { transform: rotate(0deg); }
    to { transform: rotate(360deg); }
}
.ring-reconnector-notification {
    position: fixed;
    top: 29px;
    right: 68px;
    width: 22px;
    height: 24px;
    z-index: 2147483647;
    opacity: 0;
    transition: opacity 0.3s ease-in-out;
    pointer-events: none;
    filter: drop-shadow(0 0 2px rgba(33, 150, 243, 0.3));
}
.ring-reconnector-notification.show {
    opacity: 1;
}
.ring-reconnector-notification svg {
    width: 100%;
    height: 100%;
    animation: ring-reconnector-rotate 1.5s cubic-bezier(0.4, 0, 0.2, 1) infinite;
}
.ring-reconnector-notification circle {
    stroke: url(#ring-reconnector-gradient);
}
"#;

const SPINNER_SVG: &str = r##"
<svg viewBox="0 0 30 30" xmlns="http://www.w3.org/2000/svg">
    <defs>
        <linearGradient id="ring-reconnector-gradient" x1="0%" y1="0%" x2="100%" y2="0%">
            <stop offset="0%" style="stop-color:#2196F3;stop-opacity:1" />
            <stop offset="50%" style="stop-color:#90CAF9;stop-opacity:1" />
            <stop offset="100%" style="stop-color:#2196F3;stop-opacity:1" />
        </linearGradient>
    </defs>
    <circle cx="15" cy="15" r="12" fill="none" stroke-width="3" stroke-linecap="round" stroke-dasharray="56 20"/>
</svg>
"##;

/// Notifier backed by an overlay element in the live page.
///
/// [`Notify::show`] only records the request; the watcher loop applies it
/// with [`Overlay::flush`] and hides the overlay once [`Overlay::hide_deadline`]
/// passes.
#[derive(Debug)]
pub struct Overlay {
    enabled: bool,
    duration: Duration,
    pending: bool,
    hide_at: Option<Instant>,
    styled: bool,
}

impl Overlay {
    pub fn new(enabled: bool, duration: Duration) -> Self {
        Self {
            enabled,
            duration,
            pending: false,
            hide_at: None,
            styled: false,
        }
    }

    pub fn is_styled(&self) -> bool {
        self.styled
    }

    /// Drop a show request that has not been flushed yet.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    /// Forget page-side state, e.g. after a navigation.
    pub fn reset(&mut self) {
        self.styled = false;
        self.hide_at = None;
    }

    /// Inject the overlay styles. Returns `false` while `document.head` is
    /// missing; safe to call repeatedly.
    pub async fn inject(&mut self, page: &Page) -> crate::Result<bool> {
        let js = format!(
            r#"(() => {{
                if (document.getElementById({id})) return true;
                if (!document.head) return false;
                const style = document.createElement('style');
                style.id = {id};
                style.textContent = {css};
                document.head.appendChild(style);
                return true;
            }})()"#,
            id = serde_json::to_string(STYLE_ID).unwrap(),
            css = serde_json::to_string(STYLE_CSS).unwrap(),
        );
        self.styled = page.evaluate(&js).await?;
        Ok(self.styled)
    }

    /// Add the overlay element to `body` unless it is already there.
    pub async fn insert(&self, page: &Page) -> crate::Result<bool> {
        let js = format!(
            r#"(() => {{
                if (!document.body) return false;
                if (document.querySelector('.ring-reconnector-notification')) return true;
                const el = document.createElement('div');
                el.className = 'ring-reconnector-notification';
                el.title = 'Ring Live View Reconnector - Automatically reconnecting...';
                el.innerHTML = {svg};
                document.body.appendChild(el);
                return true;
            }})()"#,
            svg = serde_json::to_string(SPINNER_SVG).unwrap(),
        );
        Ok(page.evaluate(&js).await?)
    }

    /// When the visible overlay should be hidden.
    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_at
    }

    /// Apply a pending show request.
    pub async fn flush(&mut self, page: &Page) -> crate::Result<()> {
        if !std::mem::take(&mut self.pending) {
            return Ok(());
        }
        if !self.styled {
            self.inject(page).await?;
        }
        self.insert(page).await?;
        page.execute(
            "document.querySelector('.ring-reconnector-notification')?.classList.add('show')",
        )
        .await?;
        self.hide_at = Some(Instant::now() + self.duration);
        debug!("overlay shown for {:?}", self.duration);
        Ok(())
    }

    pub async fn hide(&mut self, page: &Page) -> crate::Result<()> {
        self.hide_at = None;
        page.execute(
            "document.querySelector('.ring-reconnector-notification')?.classList.remove('show')",
        )
        .await?;
        Ok(())
    }
}

impl Notify for Overlay {
    fn show(&mut self) {
        if self.enabled {
            self.pending = true;
        }
    }
}
