//! Scripted in-memory page shared by the integration tests
//!
//! Items are laid out vertically, 100px apart, inside a 400px viewport. The
//! host is single-select: clicking an item makes it the only active one.
//! Reaching the bottom by any scroll loads the next pending batch.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use scroll_harvest::browser::{BoundingBox, PageDriver};
use scroll_harvest::config::HarvestConfig;
use scroll_harvest::error::{PageError, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

pub const ITEM: &str = ".item";
pub const ACTIVE: &str = ".item.active";
pub const NEUTRAL: &str = "body";
pub const BUTTON: &str = ".download";

pub const ITEM_HEIGHT: f64 = 100.0;
pub const VIEWPORT_HEIGHT: f64 = 400.0;

/// Config wired to the scripted page's selectors, with short waits and no
/// pacing
pub fn test_config() -> HarvestConfig {
    HarvestConfig::builder()
        .item_selector(ITEM)
        .active_selector(ACTIVE)
        .neutral_selector(NEUTRAL)
        .default_timeout_ms(2_000)
        .settle_timeout_ms(500)
        .pacing_jitter_ms(0)
        .build()
}

/// Item text with a unique timestamp and prompt
pub fn item_text(i: usize) -> String {
    format!(
        "Creation Time 25 Aug 2025 {:02}:{:02}:{:02}\nScene {} shows a lighthouse keeper painting boats at dawn",
        (i / 3600) % 24,
        (i / 60) % 60,
        i % 60,
        i
    )
}

pub fn item_texts(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(item_text).collect()
}

/// Handle onto something the scripted page rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockElement {
    Item(usize),
    Neutral,
    Button(String),
    Other(String),
}

#[derive(Debug, Clone)]
struct MockItem {
    text: String,
    class: String,
    active: bool,
    visible: bool,
}

#[derive(Debug, Clone)]
struct MockButton {
    disabled: bool,
    clicks: usize,
}

#[derive(Debug)]
struct MockState {
    items: Vec<MockItem>,
    pending: VecDeque<Vec<String>>,
    scroll_offset: f64,
    container_scrollable: bool,
    deselect_on_neutral: bool,
    snap_back: Option<usize>,
    fail_queries: bool,
    buttons: HashMap<String, MockButton>,
    present: HashSet<String>,
    texts: HashMap<String, String>,
    eval_result: Option<Value>,
    clicks: Vec<MockElement>,
    hovers: Vec<MockElement>,
}

impl MockState {
    fn document_height(&self) -> f64 {
        (self.items.len() as f64 * ITEM_HEIGHT).max(VIEWPORT_HEIGHT)
    }

    fn max_offset(&self) -> f64 {
        (self.document_height() - VIEWPORT_HEIGHT).max(0.0)
    }

    fn set_offset(&mut self, target: f64) -> f64 {
        let before = self.scroll_offset;
        self.scroll_offset = target.clamp(0.0, self.max_offset());
        if self.scroll_offset >= self.max_offset() {
            self.load_next_batch();
        }
        self.scroll_offset - before
    }

    fn load_next_batch(&mut self) {
        if let Some(batch) = self.pending.pop_front() {
            self.items.extend(batch.into_iter().map(MockItem::new));
        }
    }

    fn item(&self, index: usize) -> Result<&MockItem> {
        self.items
            .get(index)
            .ok_or_else(|| PageError::Detached(format!("item {index}")).into())
    }
}

impl MockItem {
    fn new(text: String) -> Self {
        Self {
            text,
            class: "item".to_string(),
            active: false,
            visible: true,
        }
    }
}

/// In-memory [`PageDriver`]
#[derive(Debug)]
pub struct MockPage {
    state: Mutex<MockState>,
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MockPage {
    pub fn new(texts: Vec<String>) -> Self {
        Self {
            state: Mutex::new(MockState {
                items: texts.into_iter().map(MockItem::new).collect(),
                pending: VecDeque::new(),
                scroll_offset: 0.0,
                container_scrollable: true,
                deselect_on_neutral: true,
                snap_back: None,
                fail_queries: false,
                buttons: HashMap::new(),
                present: HashSet::new(),
                texts: HashMap::new(),
                eval_result: None,
                clicks: Vec::new(),
                hovers: Vec::new(),
            }),
        }
    }

    pub fn with_items(count: usize) -> Self {
        Self::new(item_texts(0..count))
    }

    pub fn push_batch(&self, texts: Vec<String>) {
        self.state.lock().pending.push_back(texts);
    }

    pub fn set_active(&self, indices: &[usize]) {
        let mut state = self.state.lock();
        for (i, item) in state.items.iter_mut().enumerate() {
            item.active = indices.contains(&i);
        }
    }

    pub fn set_hidden(&self, index: usize) {
        self.state.lock().items[index].visible = false;
    }

    pub fn set_class(&self, index: usize, class: &str) {
        self.state.lock().items[index].class = class.to_string();
    }

    pub fn set_container_scrollable(&self, scrollable: bool) {
        self.state.lock().container_scrollable = scrollable;
    }

    pub fn set_deselect_on_neutral(&self, deselect: bool) {
        self.state.lock().deselect_on_neutral = deselect;
    }

    /// Host re-selects `index` after every item click
    pub fn set_snap_back(&self, index: Option<usize>) {
        self.state.lock().snap_back = index;
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.state.lock().fail_queries = fail;
    }

    pub fn add_button(&self, selector: &str, disabled: bool) {
        self.state.lock().buttons.insert(
            selector.to_string(),
            MockButton {
                disabled,
                clicks: 0,
            },
        );
    }

    pub fn set_button_disabled(&self, selector: &str, disabled: bool) {
        if let Some(button) = self.state.lock().buttons.get_mut(selector) {
            button.disabled = disabled;
        }
    }

    pub fn button_clicks(&self, selector: &str) -> usize {
        self.state
            .lock()
            .buttons
            .get(selector)
            .map(|b| b.clicks)
            .unwrap_or(0)
    }

    pub fn set_present(&self, selector: &str, present: bool) {
        let mut state = self.state.lock();
        if present {
            state.present.insert(selector.to_string());
        } else {
            state.present.remove(selector);
        }
    }

    pub fn set_text(&self, selector: &str, text: &str) {
        let mut state = self.state.lock();
        state.present.insert(selector.to_string());
        state.texts.insert(selector.to_string(), text.to_string());
    }

    pub fn set_eval_result(&self, value: Option<Value>) {
        self.state.lock().eval_result = value;
    }

    pub fn scroll_to(&self, offset: f64) {
        self.state.lock().set_offset(offset);
    }

    pub fn active_indices(&self) -> Vec<usize> {
        self.state
            .lock()
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.active)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn item_count(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn current_offset(&self) -> f64 {
        self.state.lock().scroll_offset
    }

    pub fn clicks(&self) -> Vec<MockElement> {
        self.state.lock().clicks.clone()
    }

    pub fn hovers(&self) -> Vec<MockElement> {
        self.state.lock().hovers.clone()
    }
}

#[async_trait]
impl PageDriver for MockPage {
    type Element = MockElement;

    async fn query_all(&self, selector: &str) -> Result<Vec<MockElement>> {
        let state = self.state.lock();
        if state.fail_queries {
            return Err(PageError::QueryFailed {
                selector: selector.to_string(),
                message: "scripted failure".to_string(),
            }
            .into());
        }
        let found = match selector {
            ITEM => (0..state.items.len()).map(MockElement::Item).collect(),
            ACTIVE => state
                .items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.active)
                .map(|(i, _)| MockElement::Item(i))
                .collect(),
            NEUTRAL => vec![MockElement::Neutral],
            other if state.buttons.contains_key(other) => {
                vec![MockElement::Button(other.to_string())]
            }
            other if state.present.contains(other) => vec![MockElement::Other(other.to_string())],
            _ => Vec::new(),
        };
        Ok(found)
    }

    async fn inner_text(&self, element: &MockElement) -> Result<String> {
        let state = self.state.lock();
        match element {
            MockElement::Item(i) => Ok(state.item(*i)?.text.clone()),
            MockElement::Other(selector) => {
                Ok(state.texts.get(selector).cloned().unwrap_or_default())
            }
            _ => Ok(String::new()),
        }
    }

    async fn attribute(&self, element: &MockElement, name: &str) -> Result<Option<String>> {
        let state = self.state.lock();
        match (element, name) {
            (MockElement::Item(i), "class") => {
                let item = state.item(*i)?;
                Ok(Some(if item.active {
                    format!("{} active", item.class)
                } else {
                    item.class.clone()
                }))
            }
            _ => Ok(None),
        }
    }

    async fn click(&self, element: &MockElement) -> Result<()> {
        let mut state = self.state.lock();
        state.clicks.push(element.clone());
        match element {
            MockElement::Item(i) => {
                state.item(*i)?;
                let selected = state.snap_back.unwrap_or(*i);
                for (j, item) in state.items.iter_mut().enumerate() {
                    item.active = j == selected;
                }
            }
            MockElement::Neutral => {
                if state.deselect_on_neutral {
                    state.items.iter_mut().for_each(|item| item.active = false);
                }
            }
            MockElement::Button(selector) => {
                if let Some(button) = state.buttons.get_mut(selector) {
                    button.clicks += 1;
                }
            }
            MockElement::Other(_) => {}
        }
        Ok(())
    }

    async fn hover(&self, element: &MockElement) -> Result<()> {
        self.state.lock().hovers.push(element.clone());
        Ok(())
    }

    async fn scroll_into_view(&self, element: &MockElement) -> Result<()> {
        let mut state = self.state.lock();
        if let MockElement::Item(i) = element {
            state.item(*i)?;
            state.set_offset(*i as f64 * ITEM_HEIGHT);
        }
        Ok(())
    }

    async fn focus(&self, _element: &MockElement) -> Result<()> {
        Ok(())
    }

    async fn evaluate(&self, _expression: &str) -> Result<Value> {
        self.state
            .lock()
            .eval_result
            .clone()
            .ok_or_else(|| PageError::ScriptFailed("scripted page runs no scripts".into()).into())
    }

    async fn call_on(&self, _element: &MockElement, _function: &str) -> Result<Value> {
        Err(PageError::ScriptFailed("scripted page runs no scripts".into()).into())
    }

    async fn wait_for_network_idle(&self, _idle: Duration, _timeout: Duration) -> Result<bool> {
        Ok(true)
    }

    async fn is_visible(&self, element: &MockElement) -> Result<bool> {
        match element {
            MockElement::Item(i) => Ok(self.state.lock().item(*i)?.visible),
            _ => Ok(true),
        }
    }

    async fn is_disabled(&self, element: &MockElement) -> Result<bool> {
        match element {
            MockElement::Button(selector) => Ok(self
                .state
                .lock()
                .buttons
                .get(selector)
                .map(|b| b.disabled)
                .unwrap_or(true)),
            _ => Ok(false),
        }
    }

    async fn bounding_box(&self, element: &MockElement) -> Result<Option<BoundingBox>> {
        match element {
            MockElement::Item(i) => {
                let state = self.state.lock();
                let item = state.item(*i)?;
                if !item.visible {
                    return Ok(None);
                }
                Ok(Some(BoundingBox {
                    x: 0.0,
                    y: *i as f64 * ITEM_HEIGHT,
                    width: 300.0,
                    height: ITEM_HEIGHT,
                }))
            }
            _ => Ok(Some(BoundingBox::default())),
        }
    }

    async fn scroll_offset(&self) -> Result<f64> {
        Ok(self.state.lock().scroll_offset)
    }

    async fn document_height(&self) -> Result<f64> {
        Ok(self.state.lock().document_height())
    }

    async fn scroll_window_to(&self, y: f64) -> Result<f64> {
        let mut state = self.state.lock();
        state.set_offset(y);
        Ok(state.scroll_offset)
    }

    async fn scroll_container_by(
        &self,
        _container: Option<&str>,
        _fallback_content: &str,
        delta: f64,
    ) -> Result<f64> {
        let mut state = self.state.lock();
        if !state.container_scrollable {
            return Err(PageError::NoScrollContainer.into());
        }
        let target = state.scroll_offset + delta;
        Ok(state.set_offset(target))
    }
}
