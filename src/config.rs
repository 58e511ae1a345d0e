use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// How the collector waits for a freshly navigated page to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettlePolicy {
    /// Sleep for a fixed delay
    Fixed { delay_ms: u64 },

    /// Poll the page source until two consecutive reads match,
    /// giving up after `max_wait_ms`
    PollUntilStable { interval_ms: u64, max_wait_ms: u64 },
}

impl Default for SettlePolicy {
    fn default() -> Self {
        SettlePolicy::Fixed {
            delay_ms: default_settle_delay_ms(),
        }
    }
}

/// Configuration for a sorting session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Catalog URL to open when the session starts
    #[serde(default)]
    pub start_url: Option<String>,

    /// Origin used to qualify relative item links
    #[serde(default = "default_origin")]
    pub origin: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// File holding the resumable run state
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Wait policy after activating the next page
    #[serde(default)]
    pub settle: SettlePolicy,

    /// Delay before resuming a run on a fresh activation
    #[serde(default = "default_resume_delay_ms")]
    pub resume_delay_ms: u64,

    /// Items per results page, used by the page estimate
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Hard ceiling on pages visited in one run
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Page estimate when pagination shows no page numbers
    #[serde(default = "default_page_guess")]
    pub default_page_guess: u32,

    /// How long notices stay on screen
    #[serde(default = "default_notice_ttl_ms")]
    pub notice_ttl_ms: u64,
}

/// Default value for origin
fn default_origin() -> String {
    "https://www.vinted.pt".to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

/// Default value for state_path
fn default_state_path() -> String {
    "fave-rank-state.json".to_string()
}

fn default_settle_delay_ms() -> u64 {
    2500
}

fn default_resume_delay_ms() -> u64 {
    2000
}

/// The listing renders 96 items per page
fn default_page_size() -> u32 {
    96
}

fn default_max_pages() -> u32 {
    100
}

fn default_page_guess() -> u32 {
    5
}

fn default_notice_ttl_ms() -> u64 {
    3000
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            start_url: None,
            origin: default_origin(),
            webdriver_url: default_webdriver_url(),
            state_path: default_state_path(),
            settle: SettlePolicy::default(),
            resume_delay_ms: default_resume_delay_ms(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            default_page_guess: default_page_guess(),
            notice_ttl_ms: default_notice_ttl_ms(),
        }
    }
}

impl CollectorConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: Some(start_url.to_string()),
            ..Self::default()
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Apply the WEBDRIVER_URL environment override, if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = CollectorConfig::from_json("{}").unwrap();
        assert_eq!(config.origin, "https://www.vinted.pt");
        assert_eq!(config.page_size, 96);
        assert_eq!(config.max_pages, 100);
        assert_eq!(config.settle, SettlePolicy::Fixed { delay_ms: 2500 });
        assert_eq!(config.start_url, None);
    }

    #[test]
    fn test_poll_policy_from_json() {
        let json = r#"{
            "start_url": "https://www.vinted.pt/catalog?search_text=jacket",
            "settle": { "kind": "poll_until_stable", "interval_ms": 250, "max_wait_ms": 8000 },
            "max_pages": 20
        }"#;
        let config = CollectorConfig::from_json(json).unwrap();
        assert_eq!(
            config.settle,
            SettlePolicy::PollUntilStable {
                interval_ms: 250,
                max_wait_ms: 8000
            }
        );
        assert_eq!(config.max_pages, 20);
        assert_eq!(config.notice_ttl_ms, 3000);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "origin": "https://www.vinted.fr" }"#).unwrap();

        let config = CollectorConfig::from_file(&path).unwrap();
        assert_eq!(config.origin, "https://www.vinted.fr");
        assert!(CollectorConfig::from_file(dir.path().join("missing.json")).is_err());
    }
}
