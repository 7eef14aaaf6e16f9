//! View model for the item summary screen.
//!
//! Binds a selected date range to the item store and the balance tracker.
//! Construction and the initial fetch are separate steps: build the view
//! model, then [`ItemSummary::mount`] it once the consumer is ready for data.

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{Balance, FetchError, HttpGet, Item};
use crate::balance::BalanceTracker;
use crate::cache::{CacheKey, RangeStore};
use crate::range::DateRange;

/// Failures surfaced to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryEvent {
  ItemsFailed { key: CacheKey, error: FetchError },
  BalanceFailed { range: DateRange, error: FetchError },
}

/// What the screen should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryState {
  /// No complete range selected; prompt for one
  NeedsRange,
  /// Waiting for the first page
  Loading,
  /// The range has no items
  Empty,
  Loaded,
}

pub struct ItemSummary<C: HttpGet> {
  store: RangeStore<Item, C>,
  balances: BalanceTracker<C>,
  resource: String,
  range: Option<DateRange>,
  /// Key of the range last loaded; reset before a different range loads
  active: Option<CacheKey>,
  mounted: bool,
  tasks: Vec<JoinHandle<()>>,
  events: mpsc::UnboundedSender<SummaryEvent>,
}

impl<C: HttpGet> ItemSummary<C> {
  /// Build the view model. Nothing is fetched until [`Self::mount`].
  pub fn new(
    store: RangeStore<Item, C>,
    balances: BalanceTracker<C>,
    resource: impl Into<String>,
    range: Option<DateRange>,
  ) -> (Self, mpsc::UnboundedReceiver<SummaryEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let summary = Self {
      store,
      balances,
      resource: resource.into(),
      range,
      active: None,
      mounted: false,
      tasks: Vec::new(),
      events: tx,
    };
    (summary, rx)
  }

  /// Issue the initial fetches. Later calls do nothing.
  pub fn mount(&mut self) {
    if self.mounted {
      return;
    }
    self.mounted = true;
    if let Some(range) = self.range {
      self.load(range);
    }
  }

  /// Switch to a new range, or to none.
  ///
  /// Before mount this only records the range. After mount a changed range
  /// resets the last loaded entry and fetches the new one, even when the
  /// range passed through unset in between; an unset range leaves the store
  /// alone.
  pub fn set_range(&mut self, range: Option<DateRange>) {
    if range == self.range {
      return;
    }
    self.range = range;
    if !self.mounted {
      return;
    }
    let Some(range) = range else {
      debug!("range cleared");
      return;
    };

    if let Some(active) = self.active.take() {
      self.store.reset(&active);
    }
    self.load(range);
  }

  /// Request the next page of the current range
  pub fn load_more(&mut self) {
    let Some(key) = self.key().filter(|_| self.mounted) else {
      return;
    };

    let store = self.store.clone();
    let events = self.events.clone();
    self.spawn(async move {
      let result = store.fetch_next_page(&key).await;
      if let Err(error) = result {
        let _ = events.send(SummaryEvent::ItemsFailed { key, error });
      }
    });
  }

  /// Re-issue the initial fetches after a failure.
  ///
  /// A range whose first page already landed is not requested again.
  pub fn retry(&mut self) {
    if let Some(range) = self.range.filter(|_| self.mounted) {
      self.load(range);
    }
  }

  /// Wait for every fetch this view model started
  pub async fn settle(&mut self) {
    for result in join_all(self.tasks.drain(..)).await {
      if let Err(e) = result {
        warn!(error = %e, "fetch task ended abnormally");
      }
    }
  }

  pub fn range(&self) -> Option<DateRange> {
    self.range
  }

  pub fn key(&self) -> Option<CacheKey> {
    self.range.map(|r| self.key_for(r))
  }

  pub fn items(&self) -> Vec<Item> {
    self
      .key()
      .and_then(|k| self.store.get(&k))
      .map(|e| e.items)
      .unwrap_or_default()
  }

  pub fn has_more(&self) -> bool {
    self
      .key()
      .and_then(|k| self.store.get(&k))
      .is_some_and(|e| e.has_more)
  }

  pub fn is_loading(&self) -> bool {
    self
      .key()
      .and_then(|k| self.store.get(&k))
      .is_some_and(|e| e.pending)
  }

  /// Totals for the current range; `None` until they land
  pub fn balance(&self) -> Option<Balance> {
    match self.range {
      Some(range) if self.balances.range() == Some(range) => self.balances.current(),
      _ => None,
    }
  }

  pub fn state(&self) -> SummaryState {
    let Some(key) = self.key() else {
      return SummaryState::NeedsRange;
    };
    match self.store.get(&key) {
      Some(entry) if entry.page >= 1 && entry.items.is_empty() => SummaryState::Empty,
      Some(entry) if entry.page >= 1 => SummaryState::Loaded,
      _ => SummaryState::Loading,
    }
  }

  fn key_for(&self, range: DateRange) -> CacheKey {
    CacheKey::new(self.resource.clone(), range)
  }

  fn load(&mut self, range: DateRange) {
    debug!(range = %range, "loading range");
    let key = self.key_for(range);
    self.active = Some(key.clone());

    let store = self.store.clone();
    let events = self.events.clone();
    self.spawn(async move {
      let result = store.fetch_first_page(&key).await;
      if let Err(error) = result {
        let _ = events.send(SummaryEvent::ItemsFailed { key, error });
      }
    });

    let balances = self.balances.clone();
    let events = self.events.clone();
    self.spawn(async move {
      if let Err(error) = balances.fetch_balance(range).await {
        let _ = events.send(SummaryEvent::BalanceFailed { range, error });
      }
    });
  }

  fn spawn<F>(&mut self, task: F)
  where
    F: std::future::Future<Output = ()> + Send + 'static,
  {
    self.tasks.retain(|t| !t.is_finished());
    self.tasks.push(tokio::spawn(task));
  }
}
