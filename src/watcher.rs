use crate::bridge;
use crate::config::{BrowserConfig, Config};
use crate::overlay::Overlay;
use crate::Result;
use eoka::{Browser, Page};
use reconnector_engine::{ChangeScheduler, Detector};
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Counters for a watch session.
#[derive(Debug, Default, Clone)]
pub struct WatchStats {
    /// Detection passes run.
    pub passes: u64,
    /// Passes that found and activated a control.
    pub activations: u64,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

/// Watches one page and clicks its reconnect control whenever it shows up.
///
/// Everything runs on one task: ready-state retries, mutation collection,
/// the polling interval and the overlay hide timer are branches of a single
/// `select!` loop, so detection passes never overlap.
pub struct Watcher {
    browser: Browser,
    page: Page,
    detector: Detector,
    selectors: Vec<String>,
    scheduler: ChangeScheduler,
    overlay: Overlay,
    mutation_check: Duration,
    ready_retry: Duration,
    observing: bool,
    stats: WatchStats,
}

impl Watcher {
    /// Launch a browser and open the configured page.
    pub async fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let detector = config.detector()?;
        let scheduler = config.scheduler();

        let browser = launch(&config.browser).await?;
        info!("Opening: {}", config.target.url);
        let page = browser.new_page(&config.target.url).await?;

        Ok(Self {
            browser,
            page,
            detector,
            selectors: config.detection.selectors.clone(),
            scheduler,
            overlay: Overlay::new(
                config.notification.enabled,
                Duration::from_millis(config.notification.duration_ms),
            ),
            mutation_check: Duration::from_millis(config.schedule.mutation_check_ms),
            ready_retry: Duration::from_millis(config.schedule.ready_retry_ms),
            observing: false,
            stats: WatchStats::default(),
        })
    }

    /// Get a reference to the watched page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn stats(&self) -> &WatchStats {
        &self.stats
    }

    /// One detection pass: capture, find, activate, notify.
    ///
    /// A control that left the page before the clicks were replayed counts
    /// as not found.
    pub async fn detect_once(&mut self) -> Result<bool> {
        let mut dom = bridge::capture(&self.page, &self.selectors).await?;
        self.stats.passes += 1;

        if !self.detector.attempt_activation(&mut dom, &mut self.overlay) {
            return Ok(false);
        }
        if bridge::replay(&self.page, &mut dom).await? == 0 {
            debug!("control detached before activation");
            self.overlay.cancel();
            return Ok(false);
        }
        self.stats.activations += 1;
        if let Err(e) = self.overlay.flush(&self.page).await {
            warn!("Failed to show notification: {}", e);
        }
        Ok(true)
    }

    async fn detect(&mut self, trigger: &str) {
        match self.detect_once().await {
            Ok(true) => info!("Reconnect triggered ({})", trigger),
            Ok(false) => debug!("no reconnect control ({})", trigger),
            Err(e) => warn!("Detection pass ({}) failed: {}", trigger, e),
        }
    }

    fn setup_pending(&self) -> bool {
        !self.scheduler.has_started() || !self.overlay.is_styled()
    }

    async fn on_ready_tick(&mut self) {
        if !self.overlay.is_styled() {
            if let Err(e) = self.overlay.inject(&self.page).await {
                error!("Style injection failed: {}", e);
            }
        }
        if self.scheduler.has_started() {
            return;
        }
        match bridge::ready_state(&self.page).await {
            Ok(state) => {
                if self.scheduler.on_ready_state(state) {
                    self.complete_initialization().await;
                }
            }
            Err(e) => debug!("ready state unavailable: {}", e),
        }
    }

    async fn complete_initialization(&mut self) {
        match bridge::invalid_selectors(&self.page, &self.selectors).await {
            Ok(invalid) => {
                for selector in invalid {
                    warn!("Selector '{}' is not valid CSS and never matches", selector);
                }
            }
            Err(e) => debug!("selector check failed: {}", e),
        }
        self.ensure_observer().await;
        if let Err(e) = self.overlay.insert(&self.page).await {
            error!("Failed to insert notification: {}", e);
        }
        self.detect("startup").await;
        info!("Initialization complete");
    }

    async fn ensure_observer(&mut self) {
        match bridge::install_observer(&self.page, self.scheduler.observed_attributes()).await {
            Ok(true) => {
                debug!("mutation observer installed");
                self.observing = true;
            }
            Ok(false) => debug!("body not available yet, observer deferred"),
            Err(e) => error!("Failed to start observing: {}", e),
        }
    }

    async fn on_mutation_tick(&mut self) {
        if !self.scheduler.has_started() {
            return;
        }
        match bridge::drain_mutations(&self.page).await {
            Ok(Some(records)) => {
                if self
                    .scheduler
                    .on_mutations(&records, std::time::Instant::now())
                {
                    self.detect("mutation").await;
                }
            }
            Ok(None) => {
                if self.observing {
                    info!("Page state lost (navigation?), reinstalling observer");
                    self.observing = false;
                    self.overlay.reset();
                }
                self.ensure_observer().await;
            }
            Err(e) => debug!("mutation drain failed: {}", e),
        }
    }

    /// Watch until `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F) -> WatchStats
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();
        match bridge::probe_environment(&self.page).await {
            Ok(host) => info!("Running in {}", host),
            Err(e) => debug!("environment probe failed: {}", e),
        }

        tokio::pin!(shutdown);
        let poll_every = self.scheduler.poll_interval();
        let mut poll = time::interval_at(start + poll_every, poll_every);
        let mut mutations = time::interval(self.mutation_check);
        let mut ready = time::interval(self.ready_retry);
        for timer in [&mut poll, &mut mutations, &mut ready] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        loop {
            let hide_at = self.overlay.hide_deadline();
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down");
                    break;
                }
                _ = ready.tick(), if self.setup_pending() => self.on_ready_tick().await,
                _ = mutations.tick() => self.on_mutation_tick().await,
                _ = poll.tick() => self.detect("poll").await,
                _ = time::sleep_until(hide_at.unwrap_or_else(Instant::now)), if hide_at.is_some() => {
                    if let Err(e) = self.overlay.hide(&self.page).await {
                        debug!("failed to hide notification: {}", e);
                    }
                }
            }
        }

        self.stats.duration_ms = start.elapsed().as_millis() as u64;
        self.stats.clone()
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}

async fn launch(config: &BrowserConfig) -> Result<Browser> {
    let stealth = eoka::StealthConfig {
        headless: config.headless,
        proxy: config.proxy.clone(),
        user_agent: config.user_agent.clone(),
        viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
        viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
        ..Default::default()
    };

    debug!(
        "Launching browser (headless: {}, proxy: {:?})",
        config.headless, config.proxy
    );
    Ok(Browser::launch_with_config(stealth).await?)
}
