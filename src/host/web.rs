use crate::error::HostError;
use crate::host::{HostPage, Notice, Request};
use crate::pagination::Activator;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};

const MAIN_MARKUP: &str = "return (document.querySelector('main') || document.body).innerHTML;";

const REPLACE_MAIN: &str = r#"
const main = document.querySelector('main') || document.body;
main.innerHTML = arguments[0];
const restore = document.getElementById('fave-rank-restore');
if (restore) {
  restore.addEventListener('click', () => { document.body.dataset.faveRankRequest = 'restore'; });
}
"#;

const SHOW_NOTICE: &str = r#"
document.querySelectorAll('.fave-rank-message').forEach((el) => el.remove());
const message = document.createElement('div');
message.className = 'fave-rank-message';
message.style.cssText = 'position: fixed; top: 20px; left: 50%; transform: translateX(-50%); color: white; padding: 10px 20px; border-radius: 4px; z-index: 9999;';
message.style.backgroundColor = arguments[1] ? '#e74c3c' : '#09B1BA';
message.textContent = arguments[0];
document.body.appendChild(message);
setTimeout(() => message.remove(), arguments[2]);
"#;

const SHOW_PROGRESS: &str = r#"
let bar = document.querySelector('.fave-rank-progress');
if (!bar) {
  bar = document.createElement('div');
  bar.className = 'fave-rank-progress';
  bar.style.cssText = 'position: fixed; top: 0; left: 0; height: 4px; background-color: #09B1BA; z-index: 10000;';
  document.body.appendChild(bar);
}
bar.style.width = arguments[0] + '%';
"#;

const CLEAR_PROGRESS: &str = "document.querySelectorAll('.fave-rank-progress').forEach((el) => el.remove());";

const ARM_TRIGGERS: &str = r#"
if (document.getElementById('fave-rank-triggers')) return;
const box = document.createElement('div');
box.id = 'fave-rank-triggers';
box.style.cssText = 'position: fixed; bottom: 30px; left: 30px; z-index: 9999; display: flex; flex-direction: column; gap: 10px;';
for (const [label, request] of [['Sort This Page', 'current'], ['Sort All Pages', 'all']]) {
  const button = document.createElement('button');
  button.textContent = label;
  button.className = 'fave-rank-button';
  button.addEventListener('click', () => { document.body.dataset.faveRankRequest = request; });
  box.appendChild(button);
}
document.body.appendChild(box);
"#;

const DISARM_TRIGGERS: &str = "const box = document.getElementById('fave-rank-triggers'); if (box) box.remove();";

const HAS_ELEMENT: &str = "return document.getElementById(arguments[0]) !== null;";

const TAKE_REQUEST: &str = r#"
const request = document.body.dataset.faveRankRequest || null;
delete document.body.dataset.faveRankRequest;
return request;
"#;

/// Connects to the WebDriver instance, falling back to common local ports
pub async fn connect_to_webdriver(webdriver_url: &str) -> Option<Client> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Some(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                webdriver_url,
                e
            );
        }
    }

    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://localhost:4444", // geckodriver / Selenium default
        "http://127.0.0.1:4444", // Try with IP instead of localhost
    ];

    for url in fallback_urls.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Some(client);
        }
    }

    ::log::error!("Failed to connect to any WebDriver servers");
    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    None
}

/// Maps a WebDriver command error, flagging lost sessions
fn command_error(error: fantoccini::error::CmdError, context: &str) -> HostError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while {}", context);
    } else {
        ::log::error!("Failed while {}: {}", context, error);
    }
    HostError::new(context, error)
}

/// A browser tab driven over WebDriver
pub struct WebDriverPage {
    client: Client,
    notice_ttl_ms: u64,
}

impl WebDriverPage {
    pub fn new(client: Client, notice_ttl_ms: u64) -> Self {
        Self {
            client,
            notice_ttl_ms,
        }
    }

    /// Connects to WebDriver and wraps the new session
    pub async fn connect(webdriver_url: &str, notice_ttl_ms: u64) -> Result<Self, HostError> {
        connect_to_webdriver(webdriver_url)
            .await
            .map(|client| Self::new(client, notice_ttl_ms))
            .ok_or_else(|| HostError::new("connecting to WebDriver", webdriver_url))
    }

    /// Ends the WebDriver session
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }

    async fn run(&self, script: &str, args: Vec<Value>, context: &str) -> Result<Value, HostError> {
        self.client
            .execute(script, args)
            .await
            .map_err(|e| command_error(e, context))
    }
}

impl HostPage for WebDriverPage {
    async fn source(&self) -> Result<String, HostError> {
        self.client
            .source()
            .await
            .map_err(|e| command_error(e, "getting page source"))
    }

    async fn current_url(&self) -> Result<String, HostError> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| command_error(e, "reading current URL"))
    }

    async fn open(&self, url: &str) -> Result<(), HostError> {
        ::log::info!("Navigating to {}", url);
        self.client
            .goto(url)
            .await
            .map_err(|e| command_error(e, "navigating"))
    }

    async fn activate(&self, activator: &Activator) -> Result<(), HostError> {
        let controls = self
            .client
            .find_all(Locator::Css(&activator.selector))
            .await
            .map_err(|e| command_error(e, "locating next page control"))?;

        let control = controls.into_iter().nth(activator.index).ok_or_else(|| {
            HostError::new(
                "locating next page control",
                format!("no match #{} for {}", activator.index, activator.selector),
            )
        })?;

        ::log::debug!("Clicking {:?} next page control", activator.strategy);
        control
            .click()
            .await
            .map_err(|e| command_error(e, "activating next page control"))
    }

    async fn main_markup(&self) -> Result<String, HostError> {
        let value = self.run(MAIN_MARKUP, vec![], "reading main content").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn replace_main(&self, markup: &str) -> Result<(), HostError> {
        self.run(REPLACE_MAIN, vec![json!(markup)], "replacing main content")
            .await
            .map(|_| ())
    }

    async fn notify(&self, notice: &Notice) {
        if notice.is_error() {
            ::log::error!("{}", notice.text);
        } else {
            ::log::info!("{}", notice.text);
        }

        let args = vec![
            json!(notice.text),
            json!(notice.is_error()),
            json!(self.notice_ttl_ms),
        ];
        if let Err(e) = self.run(SHOW_NOTICE, args, "showing notice").await {
            ::log::debug!("Notice not shown: {}", e);
        }
    }

    async fn progress(&self, current: u32, total: u32) {
        if total == 0 {
            return;
        }
        let percent = (f64::from(current) / f64::from(total) * 100.0).min(100.0);
        if let Err(e) = self
            .run(SHOW_PROGRESS, vec![json!(percent)], "updating progress")
            .await
        {
            ::log::debug!("Progress not shown: {}", e);
        }
    }

    async fn clear_progress(&self) {
        if let Err(e) = self.run(CLEAR_PROGRESS, vec![], "clearing progress").await {
            ::log::debug!("Progress not cleared: {}", e);
        }
    }

    async fn arm_triggers(&self) {
        if let Err(e) = self.run(ARM_TRIGGERS, vec![], "adding sort controls").await {
            ::log::warn!("Sort controls not added: {}", e);
        }
    }

    async fn disarm_triggers(&self) {
        if let Err(e) = self
            .run(DISARM_TRIGGERS, vec![], "removing sort controls")
            .await
        {
            ::log::debug!("Sort controls not removed: {}", e);
        }
    }

    async fn has_element(&self, id: &str) -> bool {
        match self
            .run(HAS_ELEMENT, vec![json!(id)], "checking injected controls")
            .await
        {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn take_request(&self) -> Option<Request> {
        match self.run(TAKE_REQUEST, vec![], "polling sort controls").await {
            Ok(value) => value.as_str().and_then(Request::from_marker),
            Err(_) => None,
        }
    }
}
