//! # ring-reconnector
//!
//! Keeps a Ring live view stream running. Opens the page in a browser, watches
//! it for the "Reconnect" control that appears when the stream drops, and
//! clicks it the way a user would.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ring_reconnector::{Config, Watcher};
//!
//! # #[tokio::main]
//! # async fn main() -> ring_reconnector::Result<()> {
//! let config = Config::load("configs/ring.yaml")?;
//! let mut watcher = Watcher::new(&config).await?;
//! let stats = watcher
//!     .run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await;
//! println!("Reconnects: {}", stats.activations);
//! watcher.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
mod config;
mod overlay;
mod watcher;

pub use config::{
    BrowserConfig, Config, DetectionConfig, NotificationConfig, ScheduleConfig, TargetUrl,
    Viewport, DEFAULT_URL,
};
pub use overlay::Overlay;
pub use watcher::{WatchStats, Watcher};

pub use reconnector_engine as engine;

/// Result type for ring-reconnector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or watching.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("detection error: {0}")]
    Engine(#[from] reconnector_engine::Error),

    #[error("page script error: {0}")]
    Bridge(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config.target.url, DEFAULT_URL);
        assert!(!config.browser.headless);
        assert_eq!(config.detection.selectors.len(), 2);
        assert_eq!(config.detection.reconnect_texts().len(), 14);
        assert_eq!(config.schedule.poll_interval_ms, 2000);
        assert_eq!(config.schedule.debounce_ms, 250);
        assert_eq!(config.schedule.mutation_check_ms, 100);
        assert_eq!(config.schedule.ready_retry_ms, 50);
        assert!(config.notification.enabled);
        assert_eq!(config.notification.duration_ms, 2000);
    }

    #[test]
    fn test_parse_browser_config() {
        let yaml = r#"
target:
  url: "https://example.com"
browser:
  headless: true
  proxy: "http://localhost:8080"
  user_agent: "Custom UA"
  viewport:
    width: 1920
    height: 1080
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.target.url, "https://example.com");
        assert!(config.browser.headless);
        assert_eq!(config.browser.proxy, Some("http://localhost:8080".into()));
        assert_eq!(config.browser.user_agent, Some("Custom UA".into()));
        let viewport = config.browser.viewport.unwrap();
        assert_eq!(viewport.width, 1920);
        assert_eq!(viewport.height, 1080);
    }

    #[test]
    fn test_parse_detection_config() {
        let yaml = r##"
detection:
  selectors:
    - "#reconnect"
  texts: ["Resume", "  "]
  extra_texts: ["Try again", "resume"]
"##;
        let config = Config::parse(yaml).unwrap();
        let texts = config.detection.reconnect_texts();
        assert_eq!(texts.iter().collect::<Vec<_>>(), ["resume", "try again"]);
        assert_eq!(config.detection.known_selectors().unwrap().selectors().len(), 1);
    }

    #[test]
    fn test_extra_texts_extend_defaults() {
        let yaml = r#"
detection:
  extra_texts: ["Wieder verbinden"]
"#;
        let config = Config::parse(yaml).unwrap();
        let texts = config.detection.reconnect_texts();
        assert_eq!(texts.len(), 15);
        assert!(texts.matches("WIEDER VERBINDEN"));
        assert!(texts.matches("Reconnect"));
    }

    #[test]
    fn test_scheduler_from_config() {
        let yaml = r#"
schedule:
  poll_interval_ms: 500
  debounce_ms: 0
"#;
        let config = Config::parse(yaml).unwrap();
        let scheduler = config.scheduler();
        assert_eq!(scheduler.poll_interval(), Duration::from_millis(500));
        assert_eq!(scheduler.debounce(), Duration::ZERO);
    }

    #[test]
    fn test_detector_from_config() {
        let config = Config::default();
        let detector = config.detector().unwrap();
        assert_eq!(detector.strategy_names(), ["known selector", "deep scan"]);
    }

    #[test]
    fn test_validation_empty_url() {
        let yaml = r#"
target:
  url: ""
"#;
        let err = Config::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("target.url"));
    }

    #[test]
    fn test_validation_zero_poll_interval() {
        let yaml = r#"
schedule:
  poll_interval_ms: 0
"#;
        let err = Config::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_validation_empty_text_table() {
        let yaml = r#"
detection:
  texts: []
"#;
        let err = Config::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("detection.texts"));
    }

    #[test]
    fn test_validation_blank_selector() {
        let yaml = r#"
detection:
  selectors: ["button", "   "]
"#;
        let err = Config::parse(yaml).unwrap_err();
        assert!(matches!(err, Error::Engine(_)));
        assert!(err.to_string().contains("empty selector"));
    }

    #[test]
    fn test_full_css_selectors_accepted() {
        let yaml = r##"
detection:
  selectors:
    - "button:not([disabled])"
    - '[data-testid^="live-view"] button'
    - "a + button"
    - "#reconnect > span:first-child"
"##;
        let config = Config::parse(yaml).unwrap();
        let selectors = config.detection.known_selectors().unwrap();
        assert_eq!(selectors.selectors().len(), 4);
        assert_eq!(selectors.selectors()[2], "a + button");
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            Config::parse("schedule: [1, 2"),
            Err(Error::Yaml(_))
        ));
    }

    #[test]
    fn test_load_example_config() {
        let config = Config::load("configs/ring.yaml").unwrap();
        assert_eq!(config.target.url, DEFAULT_URL);
        assert_eq!(config.schedule.poll_interval_ms, 2000);
    }
}
