//! Generic "pick one record from a long catalog" state machine.
//!
//! One [`Selector`] replaces the per-catalog widgets. It is parameterized by
//! a [`Catalog`] (search + point lookup), the catalog's [`Candidate`] type
//! (rendering and filtering), and a sourcing mode:
//!
//! - **local**: the whole catalog is resident and filtered synchronously;
//! - **remote**: every query change is debounced and sent to the backend,
//!   with further pages fetched as the window grows.
//!
//! The host UI owns rendering. It forwards input (`open`, `set_query`,
//! `on_scroll`, `select`, ...) and calls [`poll`](Selector::poll) once per
//! frame/tick, inside a tokio runtime, to dispatch due searches and apply
//! finished ones.
//!
//! ```rust,ignore
//! let mut vehicles = Selector::remote(api.vehicles(), SystemClock, SelectorConfig::default());
//! vehicles.set_selected(form.vehicle_id.clone());
//! vehicles.open();
//! vehicles.set_query("abc");
//! // every tick:
//! vehicles.poll();
//! match vehicles.results() { ... }
//! ```

mod candidate;
mod labels;
mod window;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use candidate::{Candidate, filter_local, matches_query};
pub use window::{CandidateWindow, ScrollMetrics};

use self::labels::{Cached, LabelCache};
use crate::catalog::{Catalog, Page, SearchQuery};
use crate::clock::{Clock, Millis};
use crate::error::Error;
use crate::types::EntityId;

/// Per-selector tuning.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct SelectorConfig {
    /// Initial window size and growth increment.
    pub page_size: usize,
    /// Quiet period after the last keystroke before a remote search.
    pub debounce_ms: Millis,
    /// Distance from the list bottom that triggers growth.
    pub scroll_threshold_px: f32,
    /// How long a point-lookup label stays fresh.
    pub label_ttl_ms: Millis,
    /// Rows requested per remote page.
    pub fetch_limit: usize,
    /// Permit picking candidates a business rule marks unavailable.
    pub allow_unavailable: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            debounce_ms: 250,
            scroll_threshold_px: 80.0,
            label_ttl_ms: 5 * 60 * 1_000,
            fetch_limit: 50,
            allow_unavailable: false,
        }
    }
}

impl SelectorConfig {
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn with_debounce_ms(mut self, debounce_ms: Millis) -> Self {
        self.debounce_ms = debounce_ms.max(0);
        self
    }

    #[must_use]
    pub fn with_fetch_limit(mut self, fetch_limit: usize) -> Self {
        self.fetch_limit = fetch_limit.max(1);
        self
    }

    #[must_use]
    pub fn with_allow_unavailable(mut self, allow: bool) -> Self {
        self.allow_unavailable = allow;
        self
    }
}

/// What the candidate list should show.
#[derive(Debug, PartialEq)]
pub enum Results<'a, T> {
    /// First remote page for the current query not in yet.
    Loading,
    /// Query done, nothing matched.
    NoResults,
    Items(&'a [T]),
}

/// Answer to a click on a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected(EntityId),
    /// Listed but not pickable; `reason` is meant for a toast.
    Blocked { reason: String },
    /// The id is not among the loaded candidates.
    NotFound,
}

enum SelectorEvent<T> {
    Search {
        seq: u64,
        offset: usize,
        result: Result<Page<T>, Error>,
    },
    Lookup {
        id: EntityId,
        result: Result<T, Error>,
    },
}

enum Sourcing<T> {
    Local(Vec<T>),
    Remote,
}

pub struct Selector<S: Catalog, C> {
    catalog: Arc<S>,
    clock: C,
    config: SelectorConfig,
    sourcing: Sourcing<S::Item>,

    open: bool,
    query: String,
    candidates: Vec<S::Item>,
    window: CandidateWindow,
    has_more: bool,
    /// Query the current `candidates` belong to (remote mode).
    loaded_query: Option<String>,

    selected: Option<EntityId>,
    error: Option<String>,
    search_error: Option<String>,

    seq: u64,
    search_due_at: Option<Millis>,
    search_task: Option<JoinHandle<()>>,
    lookup_tasks: HashMap<EntityId, JoinHandle<()>>,
    labels: LabelCache,

    events_tx: mpsc::UnboundedSender<SelectorEvent<S::Item>>,
    events_rx: mpsc::UnboundedReceiver<SelectorEvent<S::Item>>,
}

impl<S: Catalog, C: Clock> Selector<S, C> {
    /// Selector over a resident candidate list. `catalog` is used only for
    /// point lookups.
    #[must_use]
    pub fn local(catalog: S, clock: C, items: Vec<S::Item>, config: SelectorConfig) -> Self {
        let mut selector = Self::build(catalog, clock, Sourcing::Local(items), config);
        selector.refilter();
        selector
    }

    /// Selector backed by debounced server-side search.
    #[must_use]
    pub fn remote(catalog: S, clock: C, config: SelectorConfig) -> Self {
        Self::build(catalog, clock, Sourcing::Remote, config)
    }

    fn build(catalog: S, clock: C, sourcing: Sourcing<S::Item>, config: SelectorConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            catalog: Arc::new(catalog),
            clock,
            window: CandidateWindow::new(config.page_size),
            config,
            sourcing,
            open: false,
            query: String::new(),
            candidates: Vec::new(),
            has_more: false,
            loaded_query: None,
            selected: None,
            error: None,
            search_error: None,
            seq: 0,
            search_due_at: None,
            search_task: None,
            lookup_tasks: HashMap::new(),
            labels: LabelCache::default(),
            events_tx,
            events_rx,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self.sourcing, Sourcing::Local(_))
    }

    pub fn open(&mut self) {
        if self.open {
            return;
        }
        self.open = true;
        self.window.reset();
        if !self.is_local() && self.loaded_query.as_deref() != Some(self.query.as_str()) {
            self.search_due_at = Some(self.clock.now_ms());
        }
    }

    /// Closes the popup, cancelling the pending debounce and abandoning any
    /// in-flight search.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.cancel_search();
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query == self.query {
            return;
        }
        self.query = query;
        self.window.reset();
        if self.is_local() {
            self.refilter();
        } else {
            // Rows still in flight belong to the previous query.
            self.cancel_search();
            self.search_due_at = Some(self.clock.now_ms() + self.config.debounce_ms);
        }
    }

    /// Replaces the resident list (local mode only).
    pub fn set_local_items(&mut self, items: Vec<S::Item>) {
        if let Sourcing::Local(current) = &mut self.sourcing {
            *current = items;
            self.refilter();
        }
    }

    fn refilter(&mut self) {
        if let Sourcing::Local(items) = &self.sourcing {
            self.candidates = filter_local(items, &self.query);
            self.has_more = false;
            self.loaded_query = Some(self.query.clone());
        }
        self.refresh_selected_label();
    }

    #[must_use]
    pub fn window(&self) -> CandidateWindow {
        self.window
    }

    /// Grows the window when the list is scrolled near its bottom.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> bool {
        if metrics.distance_to_bottom() > self.config.scroll_threshold_px {
            return false;
        }
        self.reveal_more()
    }

    /// Reveals one more increment; in remote mode, asks for the next page
    /// once the loaded rows are exhausted.
    pub fn reveal_more(&mut self) -> bool {
        let grew = self.window.grow(self.candidates.len());
        if !self.is_local()
            && self.open
            && self.has_more
            && self.search_task.is_none()
            && self.search_due_at.is_none()
            && self.window.covers(self.candidates.len())
        {
            self.dispatch_search(self.candidates.len());
        }
        grew
    }

    /// The revealed slice of the candidates.
    #[must_use]
    pub fn visible(&self) -> &[S::Item] {
        let end = self.window.size().min(self.candidates.len());
        &self.candidates[..end]
    }

    #[must_use]
    pub fn results(&self) -> Results<'_, S::Item> {
        if self.candidates.is_empty() {
            let settled = self.loaded_query.as_deref() == Some(self.query.as_str())
                && self.search_due_at.is_none()
                && self.search_task.is_none();
            if settled || self.search_error.is_some() {
                Results::NoResults
            } else {
                Results::Loading
            }
        } else {
            Results::Items(self.visible())
        }
    }

    /// Every loaded candidate, revealed or not.
    #[must_use]
    pub fn candidates(&self) -> &[S::Item] {
        &self.candidates
    }

    /// Last search failure message, cleared by the next successful search.
    #[must_use]
    pub fn search_error(&self) -> Option<&str> {
        self.search_error.as_deref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&EntityId> {
        self.selected.as_ref()
    }

    /// User picked `id` from the list.
    pub fn select(&mut self, id: &EntityId) -> SelectOutcome {
        let Some(candidate) = self.candidates.iter().find(|c| &c.id() == id) else {
            return SelectOutcome::NotFound;
        };
        if !self.config.allow_unavailable
            && let Some(reason) = candidate.unavailable_reason()
        {
            return SelectOutcome::Blocked { reason };
        }
        let label = candidate.label();
        let now = self.clock.now_ms();
        self.labels.store(id.clone(), Some(label), now);
        self.selected = Some(id.clone());
        SelectOutcome::Selected(id.clone())
    }

    /// Selection set from outside (initial form value, programmatic change).
    ///
    /// If the record is not among the loaded candidates, a point lookup is
    /// started to resolve its label.
    pub fn set_selected(&mut self, id: Option<EntityId>) {
        self.selected = id;
        self.refresh_selected_label();
    }

    /// Drops the selection. Query and window are left alone.
    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Text for the closed selector: the label if known, else the raw id.
    ///
    /// The label survives filtering: a selection that drops out of the
    /// current candidates is still shown by name.
    #[must_use]
    pub fn display_text(&self) -> Option<String> {
        let id = self.selected.as_ref()?;
        if let Some(label) = self.resident_label(id) {
            return Some(label);
        }
        Some(
            self.labels
                .last_known(id)
                .map_or_else(|| id.to_string(), str::to_owned),
        )
    }

    /// Label of `id` from the loaded candidates or, in local mode, the whole
    /// resident list.
    fn resident_label(&self, id: &EntityId) -> Option<String> {
        let find = |items: &[S::Item]| items.iter().find(|c| &c.id() == id).map(Candidate::label);
        find(self.candidates.as_slice()).or_else(|| match &self.sourcing {
            Sourcing::Local(items) => find(items.as_slice()),
            Sourcing::Remote => None,
        })
    }

    /// `true` while a point lookup for the selection is running.
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        self.selected
            .as_ref()
            .is_some_and(|id| self.lookup_tasks.contains_key(id))
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Applies finished requests and dispatches a due search.
    ///
    /// Must run inside a tokio runtime. Returns whether visible state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events_rx.try_recv() {
            changed |= self.apply(event);
        }
        if let Some(due_at) = self.search_due_at
            && self.open
            && self.clock.now_ms() >= due_at
        {
            self.search_due_at = None;
            self.dispatch_search(0);
            changed = true;
        }
        changed
    }

    /// Waits for outstanding requests and applies their results.
    pub async fn settle(&mut self) {
        if let Some(task) = self.search_task.take() {
            let _ = task.await;
        }
        let lookups: Vec<_> = self.lookup_tasks.drain().map(|(_, task)| task).collect();
        for task in lookups {
            let _ = task.await;
        }
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    fn dispatch_search(&mut self, offset: usize) {
        if offset == 0 {
            self.seq += 1;
        }
        if let Some(task) = self.search_task.take() {
            task.abort();
        }

        let seq = self.seq;
        let query = SearchQuery::new(self.query.trim(), self.config.fetch_limit).at_offset(offset);
        let catalog = self.catalog.clone();
        let tx = self.events_tx.clone();
        tracing::debug!(seq, offset, query = %query.text, "Dispatching catalog search");

        self.search_task = Some(tokio::spawn(async move {
            let result = catalog.search(&query).await;
            let _ = tx.send(SelectorEvent::Search {
                seq,
                offset,
                result,
            });
        }));
    }

    fn cancel_search(&mut self) {
        self.search_due_at = None;
        if let Some(task) = self.search_task.take() {
            task.abort();
        }
        // Anything already queued for the old sequence is now stale.
        self.seq += 1;
    }

    fn refresh_selected_label(&mut self) {
        if let Some(id) = self.selected.clone() {
            self.ensure_label(&id);
        }
    }

    /// Keeps a label for `id` on hand, starting a point lookup when neither
    /// the loaded rows nor a fresh cache entry can provide one.
    fn ensure_label(&mut self, id: &EntityId) {
        let now = self.clock.now_ms();
        if let Some(label) = self.resident_label(id) {
            self.labels.store(id.clone(), Some(label), now);
            return;
        }
        if self.lookup_tasks.contains_key(id) {
            return;
        }
        if self.labels.get(id, now, self.config.label_ttl_ms) != Cached::Miss {
            return;
        }

        let catalog = self.catalog.clone();
        let tx = self.events_tx.clone();
        let lookup_id = id.clone();
        let task = tokio::spawn(async move {
            let result = catalog.fetch(&lookup_id).await;
            let _ = tx.send(SelectorEvent::Lookup {
                id: lookup_id,
                result,
            });
        });
        self.lookup_tasks.insert(id.clone(), task);
    }

    fn apply(&mut self, event: SelectorEvent<S::Item>) -> bool {
        match event {
            SelectorEvent::Search {
                seq,
                offset,
                result,
            } => {
                if seq != self.seq {
                    tracing::debug!(seq, current = self.seq, "Dropping stale search response");
                    return false;
                }
                self.search_task = None;
                match result {
                    Ok(page) => {
                        self.has_more = page.has_more();
                        if offset == 0 {
                            self.candidates = page.data;
                        } else if offset == self.candidates.len() {
                            self.candidates.extend(page.data);
                        } else {
                            tracing::debug!(offset, loaded = self.candidates.len(), "Ignoring misaligned page");
                            return false;
                        }
                        self.loaded_query = Some(self.query.clone());
                        self.search_error = None;
                        self.refresh_selected_label();
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, query = %self.query, "Catalog search failed");
                        self.search_error = Some(e.to_string());
                    }
                }
                true
            }
            SelectorEvent::Lookup { id, result } => {
                self.lookup_tasks.remove(&id);
                let now = self.clock.now_ms();
                match result {
                    Ok(item) => self.labels.store(id, Some(item.label()), now),
                    Err(e) => {
                        tracing::debug!(%id, error = %e, "Label lookup failed; showing raw id");
                        self.labels.store(id, None, now);
                    }
                }
                true
            }
        }
    }
}

impl<S: Catalog, C> Drop for Selector<S, C> {
    fn drop(&mut self) {
        if let Some(task) = self.search_task.take() {
            task.abort();
        }
        for (_, task) in self.lookup_tasks.drain() {
            task.abort();
        }
    }
}
