//! Range-scoped, paginated cache store.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::entry::{CacheEntry, FetchOutcome};
use super::event::StoreEvent;
use super::key::CacheKey;
use super::traits::{Cacheable, QueryKey};
use crate::api::api_types::ApiResources;
use crate::api::{FetchError, HttpGet};

/// An entry plus the generation it was created under.
///
/// Every request remembers the generation it was issued for; a response is
/// only applied while the slot for its key still carries that generation.
struct Slot<T> {
  generation: u64,
  entry: CacheEntry<T>,
}

struct Shared<T> {
  slots: HashMap<CacheKey, Slot<T>>,
  next_generation: u64,
  subscribers: Vec<mpsc::UnboundedSender<StoreEvent>>,
}

impl<T> Shared<T> {
  fn bump_generation(&mut self) -> u64 {
    self.next_generation += 1;
    self.next_generation
  }

  /// The slot for `key`, but only if nothing replaced it since `generation`
  fn current(&mut self, key: &CacheKey, generation: u64) -> Option<&mut Slot<T>> {
    self
      .slots
      .get_mut(key)
      .filter(|slot| slot.generation == generation)
  }

  fn notify(&mut self, event: StoreEvent) {
    self
      .subscribers
      .retain(|tx| tx.send(event.clone()).is_ok());
  }
}

/// Process-wide cache of paginated, range-scoped result sets.
///
/// Cloning is cheap and every clone shares the same entries. The lock is
/// never held across a request, so different keys can have requests in
/// flight at the same time while each key has at most one.
pub struct RangeStore<T, C> {
  http: C,
  shared: Arc<Mutex<Shared<T>>>,
}

impl<T: Cacheable, C: HttpGet> RangeStore<T, C> {
  pub fn new(http: C) -> Self {
    Self {
      http,
      shared: Arc::new(Mutex::new(Shared {
        slots: HashMap::new(),
        next_generation: 0,
        subscribers: Vec::new(),
      })),
    }
  }

  fn lock(&self) -> MutexGuard<'_, Shared<T>> {
    // No invariant spans a panic point inside the lock
    self.shared.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Receive a [`StoreEvent`] for every change to any entry
  pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    self.lock().subscribers.push(tx);
    rx
  }

  /// Snapshot of the entry for `key`
  pub fn get(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
    self.lock().slots.get(key).map(|slot| slot.entry.clone())
  }

  pub fn keys(&self) -> Vec<CacheKey> {
    self.lock().slots.keys().cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.lock().slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Load page 1 for `key`.
  ///
  /// A no-op when the entry already holds a page or has a request in
  /// flight. On failure the entry is removed again so a later call retries.
  pub async fn fetch_first_page(&self, key: &CacheKey) -> Result<FetchOutcome, FetchError> {
    let generation = {
      let mut shared = self.lock();
      match shared.slots.get(key) {
        Some(slot) if slot.entry.page >= 1 => {
          debug!(key = %key, "first page already loaded");
          return Ok(FetchOutcome::AlreadyLoaded);
        }
        Some(slot) if slot.entry.pending => {
          debug!(key = %key, "first page already in flight");
          return Ok(FetchOutcome::InFlight);
        }
        _ => {}
      }

      let generation = shared.bump_generation();
      shared.slots.insert(
        key.clone(),
        Slot {
          generation,
          entry: CacheEntry {
            pending: true,
            ..CacheEntry::default()
          },
        },
      );
      shared.notify(StoreEvent::Updated(key.clone()));
      generation
    };

    let result = self.request(key, 1).await;

    let mut shared = self.lock();
    let Some(slot) = shared.current(key, generation) else {
      debug!(key = %key, generation, "discarding first page for reset key");
      return Ok(FetchOutcome::Discarded);
    };

    match result {
      Ok(response) => {
        slot.entry = CacheEntry {
          items: response.resources.into_iter().map(T::from_wire).collect(),
          page: 1,
          has_more: response.pager.has_more(),
          pending: false,
        };
        info!(
          key = %key,
          items = slot.entry.items.len(),
          has_more = slot.entry.has_more,
          "loaded first page"
        );
        shared.notify(StoreEvent::Updated(key.clone()));
        Ok(FetchOutcome::Applied)
      }
      Err(e) => {
        warn!(key = %key, error = %e, "first page failed");
        shared.slots.remove(key);
        shared.notify(StoreEvent::Updated(key.clone()));
        Err(e)
      }
    }
  }

  /// Load the page after the last one fetched and append it.
  ///
  /// A no-op when no first page has landed, a request is in flight, or the
  /// last page has been reached. On failure the entry keeps its prior items
  /// and page; only `pending` is cleared.
  pub async fn fetch_next_page(&self, key: &CacheKey) -> Result<FetchOutcome, FetchError> {
    let (generation, next_page) = {
      let mut shared = self.lock();
      let Some(slot) = shared.slots.get_mut(key) else {
        return Ok(FetchOutcome::NotStarted);
      };
      if slot.entry.pending {
        debug!(key = %key, "next page skipped, request in flight");
        return Ok(FetchOutcome::InFlight);
      }
      if slot.entry.page == 0 {
        return Ok(FetchOutcome::NotStarted);
      }
      if !slot.entry.has_more {
        debug!(key = %key, page = slot.entry.page, "next page skipped, no more pages");
        return Ok(FetchOutcome::Exhausted);
      }

      slot.entry.pending = true;
      let claim = (slot.generation, slot.entry.page + 1);
      shared.notify(StoreEvent::Updated(key.clone()));
      claim
    };

    let result = self.request(key, next_page).await;

    let mut shared = self.lock();
    let Some(slot) = shared.current(key, generation) else {
      debug!(key = %key, page = next_page, "discarding page for reset key");
      return Ok(FetchOutcome::Discarded);
    };
    slot.entry.pending = false;

    let outcome = match result {
      Ok(response) => {
        let before = slot.entry.items.len();
        append_unique(&mut slot.entry.items, response.resources);
        slot.entry.page = next_page;
        slot.entry.has_more = response.pager.has_more();
        info!(
          key = %key,
          page = next_page,
          appended = slot.entry.items.len() - before,
          has_more = slot.entry.has_more,
          "loaded next page"
        );
        Ok(FetchOutcome::Applied)
      }
      Err(e) => {
        warn!(key = %key, page = next_page, error = %e, "next page failed");
        Err(e)
      }
    };
    shared.notify(StoreEvent::Updated(key.clone()));
    outcome
  }

  /// Discard the entry for `key`.
  ///
  /// Requests still in flight for it will find their generation gone when
  /// they land, and drop their result.
  pub fn reset(&self, key: &CacheKey) {
    let mut shared = self.lock();
    if let Some(slot) = shared.slots.remove(key) {
      info!(
        key = %key,
        fingerprint = &key.cache_hash()[..12],
        abandoned_request = slot.entry.pending,
        "reset entry"
      );
    }
    shared.notify(StoreEvent::Reset(key.clone()));
  }

  /// Reset every key
  pub fn clear(&self) {
    let mut shared = self.lock();
    let keys: Vec<CacheKey> = shared.slots.drain().map(|(key, _)| key).collect();
    for key in keys {
      shared.notify(StoreEvent::Reset(key));
    }
  }

  async fn request(&self, key: &CacheKey, page: u32) -> Result<ApiResources<T::Wire>, FetchError> {
    let mut query = key.range().query_params();
    query.insert("page", page.to_string());
    debug!(key = %key, page, "requesting page");
    self.http.get(&key.path(), &query).await
  }
}

/// Append a page, skipping records the entry already holds.
///
/// Pages shift when items are created mid-pagination; the server's order is
/// kept for everything new.
fn append_unique<T: Cacheable>(items: &mut Vec<T>, page: Vec<T::Wire>) {
  let mut held: HashSet<u64> = items.iter().map(T::cache_id).collect();
  for wire in page {
    let item = T::from_wire(wire);
    let id = item.cache_id();
    if !held.insert(id) {
      debug!(id, "skipping item already held");
      continue;
    }
    items.push(item);
  }
}

impl<T, C: Clone> Clone for RangeStore<T, C> {
  fn clone(&self) -> Self {
    Self {
      http: self.http.clone(),
      shared: Arc::clone(&self.shared),
    }
  }
}
