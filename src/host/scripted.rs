use crate::dom::{Node, parse_document};
use crate::error::HostError;
use crate::host::{HostPage, Notice, Request, TRIGGERS_ID};
use crate::pagination::Activator;
use crate::store::MemoryStore;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Host double that serves a fixed list of pages.
///
/// Page `n` lives at `https://www.vinted.pt/catalog?page=n`. Activating a
/// control advances to the next page, and opening a URL jumps to the page it
/// names.
#[derive(Default)]
pub struct ScriptedPage {
    pages: Vec<String>,
    state: Mutex<ScriptState>,
    observed: Option<MemoryStore>,
}

#[derive(Default)]
struct ScriptState {
    current: usize,
    main_override: Option<String>,
    notices: Vec<Notice>,
    activations: usize,
    armed: bool,
    requests: VecDeque<Request>,
    fail_activation: bool,
    keep_changing: bool,
    renders: usize,
    stored_at_activation: Vec<Map<String, Value>>,
}

impl ScriptedPage {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            state: Mutex::new(ScriptState::default()),
            observed: None,
        }
    }

    /// Records what the store holds each time a control is activated
    pub fn observing(mut self, store: &MemoryStore) -> Self {
        self.observed = Some(store.clone());
        self
    }

    pub fn url_for(page: usize) -> String {
        format!("https://www.vinted.pt/catalog?page={}", page + 1)
    }

    /// Starts on the given zero-based page
    pub fn at(self, page: usize) -> Self {
        self.state.lock().unwrap().current = page;
        self
    }

    pub fn fail_activation(&self) {
        self.state.lock().unwrap().fail_activation = true;
    }

    /// Makes every source read differ from the previous one
    pub fn keep_changing(&self) {
        self.state.lock().unwrap().keep_changing = true;
    }

    /// Reloads the current page, dropping injected controls and views
    pub fn reload(&self) {
        let mut state = self.state.lock().unwrap();
        state.armed = false;
        state.main_override = None;
    }

    pub fn queue_request(&self, request: Request) {
        self.state.lock().unwrap().requests.push_back(request);
    }

    pub fn current(&self) -> usize {
        self.state.lock().unwrap().current
    }

    pub fn activations(&self) -> usize {
        self.state.lock().unwrap().activations
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.state.lock().unwrap().notices.clone()
    }

    pub fn armed(&self) -> bool {
        self.state.lock().unwrap().armed
    }

    pub fn stored_at_activation(&self) -> Vec<Map<String, Value>> {
        self.state.lock().unwrap().stored_at_activation.clone()
    }

    fn main_of(source: &str) -> String {
        let doc = parse_document(source);
        let root = doc.root_element();
        root.find("main")
            .or_else(|| root.find("body"))
            .map(|el| el.markup())
            .unwrap_or_default()
    }
}

impl HostPage for ScriptedPage {
    async fn source(&self) -> Result<String, HostError> {
        let mut state = self.state.lock().unwrap();
        let page = self
            .pages
            .get(state.current)
            .cloned()
            .ok_or_else(|| HostError::new("getting page source", "no such page"))?;
        if !state.keep_changing {
            return Ok(page);
        }
        state.renders += 1;
        Ok(format!("{page}<!-- render {} -->", state.renders))
    }

    async fn current_url(&self) -> Result<String, HostError> {
        Ok(Self::url_for(self.current()))
    }

    async fn open(&self, url: &str) -> Result<(), HostError> {
        let page = (0..self.pages.len())
            .find(|page| Self::url_for(*page) == url)
            .ok_or_else(|| HostError::new("navigating", url))?;
        let mut state = self.state.lock().unwrap();
        state.current = page;
        state.main_override = None;
        Ok(())
    }

    async fn activate(&self, _activator: &Activator) -> Result<(), HostError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_activation {
            return Err(HostError::new(
                "activating next page control",
                "element click intercepted",
            ));
        }
        if let Some(store) = &self.observed {
            state.stored_at_activation.push(store.snapshot());
        }
        state.current += 1;
        state.activations += 1;
        state.main_override = None;
        Ok(())
    }

    async fn main_markup(&self) -> Result<String, HostError> {
        let state = self.state.lock().unwrap();
        if let Some(markup) = &state.main_override {
            return Ok(markup.clone());
        }
        Ok(self
            .pages
            .get(state.current)
            .map(|page| Self::main_of(page))
            .unwrap_or_default())
    }

    async fn replace_main(&self, markup: &str) -> Result<(), HostError> {
        self.state.lock().unwrap().main_override = Some(markup.to_string());
        Ok(())
    }

    async fn notify(&self, notice: &Notice) {
        self.state.lock().unwrap().notices.push(notice.clone());
    }

    async fn progress(&self, _current: u32, _total: u32) {}

    async fn clear_progress(&self) {}

    async fn arm_triggers(&self) {
        self.state.lock().unwrap().armed = true;
    }

    async fn disarm_triggers(&self) {
        self.state.lock().unwrap().armed = false;
    }

    async fn has_element(&self, id: &str) -> bool {
        let state = self.state.lock().unwrap();
        if id == TRIGGERS_ID {
            return state.armed;
        }
        let marker = format!(r#"id="{id}""#);
        state
            .main_override
            .as_ref()
            .is_some_and(|markup| markup.contains(&marker))
    }

    async fn take_request(&self) -> Option<Request> {
        self.state.lock().unwrap().requests.pop_front()
    }
}
