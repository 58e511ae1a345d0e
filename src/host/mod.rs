//! The page being re-ranked.
//!
//! [`HostPage`] is everything the collector needs from the browser: the
//! current markup, navigation, the presentation swap, and the transient
//! notice and progress surfaces. [`web::WebDriverPage`] drives a real
//! browser over WebDriver.

pub mod web;

#[cfg(test)]
pub mod scripted;

use crate::error::HostError;
use crate::pagination::Activator;
use serde::{Deserialize, Serialize};

/// Id of the injected box holding the sort controls
pub const TRIGGERS_ID: &str = "fave-rank-triggers";

/// Severity of a transient notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A short status or error message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NoticeLevel::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NoticeLevel::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// A user action requested from inside the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    SortCurrent,
    SortAll,
    Restore,
}

impl Request {
    /// Parses the marker the page-side controls leave behind
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "current" => Some(Request::SortCurrent),
            "all" => Some(Request::SortAll),
            "restore" => Some(Request::Restore),
            _ => None,
        }
    }
}

/// Operations the collector performs on the host document
#[allow(async_fn_in_trait)]
pub trait HostPage {
    /// Full markup of the current page
    async fn source(&self) -> Result<String, HostError>;

    /// URL of the current page
    async fn current_url(&self) -> Result<String, HostError>;

    /// Navigates to a URL
    async fn open(&self, url: &str) -> Result<(), HostError>;

    /// Clicks the control an activator names
    async fn activate(&self, activator: &Activator) -> Result<(), HostError>;

    /// Inner markup of the main content area
    async fn main_markup(&self) -> Result<String, HostError>;

    /// Replaces the inner markup of the main content area
    async fn replace_main(&self, markup: &str) -> Result<(), HostError>;

    /// Shows a transient notice
    async fn notify(&self, notice: &Notice);

    /// Updates the progress indicator
    async fn progress(&self, current: u32, total: u32);

    /// Removes the progress indicator
    async fn clear_progress(&self);

    /// Shows the "sort this page" and "sort all pages" controls
    async fn arm_triggers(&self);

    /// Removes the sort controls
    async fn disarm_triggers(&self);

    /// Whether an element with the given id is currently in the page.
    /// Injected elements disappear when the page reloads.
    async fn has_element(&self, id: &str) -> bool;

    /// Returns and clears the last action requested from the page
    async fn take_request(&self) -> Option<Request>;
}
