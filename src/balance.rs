//! Income/expense totals for the selected date range.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::api_types::ApiBalance;
use crate::api::{Balance, FetchError, HttpGet};
use crate::range::DateRange;

/// Change notifications published by a [`BalanceTracker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceEvent {
  Updated(DateRange),
}

#[derive(Default)]
struct State {
  range: Option<DateRange>,
  /// Bumped for every request; only the newest may write `balance`
  generation: u64,
  balance: Option<Balance>,
  subscribers: Vec<mpsc::UnboundedSender<BalanceEvent>>,
}

/// Holds the balance for the most recently requested range.
///
/// Last range wins: a response is applied only if no newer request was
/// issued while it was in flight.
pub struct BalanceTracker<C> {
  http: C,
  path: String,
  state: Arc<Mutex<State>>,
}

impl<C: HttpGet> BalanceTracker<C> {
  /// `resource` names the list whose totals are fetched, e.g. "items"
  pub fn new(http: C, resource: &str) -> Self {
    Self {
      http,
      path: format!("/{}/balance", resource),
      state: Arc::new(Mutex::new(State::default())),
    }
  }

  fn lock(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn subscribe(&self) -> mpsc::UnboundedReceiver<BalanceEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    self.lock().subscribers.push(tx);
    rx
  }

  /// Balance of the selected range, once its response has landed
  pub fn current(&self) -> Option<Balance> {
    self.lock().balance
  }

  pub fn range(&self) -> Option<DateRange> {
    self.lock().range
  }

  /// Select `range` and fetch its totals.
  ///
  /// Returns `Ok(None)` when a newer request superseded this one before it
  /// landed; its result (success or failure) is dropped.
  pub async fn fetch_balance(&self, range: DateRange) -> Result<Option<Balance>, FetchError> {
    let generation = {
      let mut state = self.lock();
      state.generation += 1;
      state.range = Some(range);
      state.balance = None;
      state.generation
    };

    debug!(range = %range, "requesting balance");
    let result = self
      .http
      .get::<ApiBalance>(&self.path, &range.query_params())
      .await;

    let mut state = self.lock();
    if state.generation != generation {
      debug!(range = %range, "discarding balance for superseded range");
      return Ok(None);
    }

    match result {
      Ok(body) => {
        let balance = Balance::from(body);
        info!(range = %range, balance = balance.balance, "loaded balance");
        state.balance = Some(balance);
        state
          .subscribers
          .retain(|tx| tx.send(BalanceEvent::Updated(range)).is_ok());
        Ok(Some(balance))
      }
      Err(e) => {
        warn!(range = %range, error = %e, "balance failed");
        Err(e)
      }
    }
  }

  /// Forget the selected range; in-flight responses are dropped
  pub fn clear(&self) {
    let mut state = self.lock();
    state.generation += 1;
    state.range = None;
    state.balance = None;
  }
}

impl<C: Clone> Clone for BalanceTracker<C> {
  fn clone(&self) -> Self {
    Self {
      http: self.http.clone(),
      path: self.path.clone(),
      state: Arc::clone(&self.state),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{balance, idle, month, ScriptedHttp};

  fn setup() -> (BalanceTracker<ScriptedHttp>, ScriptedHttp) {
    let http = ScriptedHttp::new();
    (BalanceTracker::new(http.clone(), "items"), http)
  }

  #[tokio::test]
  async fn test_fetch_balance() {
    let (tracker, http) = setup();
    http.reply("/items/balance", balance(5000, 1200));

    let b = tracker.fetch_balance(month(1)).await.unwrap().unwrap();

    assert_eq!(
      b,
      Balance {
        income: 5000,
        expenses: 1200,
        balance: 3800
      }
    );
    assert_eq!(tracker.current(), Some(b));
    let request = &http.requests()[0];
    assert_eq!(request.path, "/items/balance");
    assert_eq!(request.query["happen_after"], "2024-01-01");
    assert!(request.page().is_none());
  }

  #[tokio::test]
  async fn test_superseded_range_is_dropped() {
    let (tracker, http) = setup();
    let gate = http.reply_gated("/items/balance", balance(100, 0));
    let slow_b = http.reply_gated("/items/balance", balance(0, 40));

    let background = tracker.clone();
    let a = tokio::spawn(async move { background.fetch_balance(month(1)).await });
    idle().await;
    let background = tracker.clone();
    let b = tokio::spawn(async move { background.fetch_balance(month(2)).await });
    idle().await;

    // A lands after B was selected
    gate.send(()).unwrap();
    assert_eq!(a.await.unwrap().unwrap(), None);
    assert_eq!(tracker.current(), None);

    slow_b.send(()).unwrap();
    let landed = b.await.unwrap().unwrap().unwrap();
    assert_eq!(landed.balance, -40);
    assert_eq!(tracker.current(), Some(landed));
    assert_eq!(tracker.range(), Some(month(2)));
  }

  #[tokio::test]
  async fn test_old_range_landing_last_is_dropped() {
    let (tracker, http) = setup();
    let gate = http.reply_gated("/items/balance", balance(100, 0));
    http.reply("/items/balance", balance(0, 40));

    let background = tracker.clone();
    let a = tokio::spawn(async move { background.fetch_balance(month(1)).await });
    idle().await;
    tracker.fetch_balance(month(2)).await.unwrap();

    gate.send(()).unwrap();
    assert_eq!(a.await.unwrap().unwrap(), None);
    assert_eq!(tracker.current().map(|b| b.expenses), Some(40));
  }

  #[tokio::test]
  async fn test_failure_for_current_range_surfaces() {
    let (tracker, http) = setup();
    http.fail("/items/balance", FetchError::network("timed out"));

    let err = tracker.fetch_balance(month(1)).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(tracker.current(), None);
  }

  #[tokio::test]
  async fn test_failure_for_superseded_range_is_dropped() {
    let (tracker, http) = setup();
    let gate = http.fail_gated("/items/balance", FetchError::network("timed out"));

    let background = tracker.clone();
    let a = tokio::spawn(async move { background.fetch_balance(month(1)).await });
    idle().await;
    tracker.clear();

    gate.send(()).unwrap();
    assert_eq!(a.await.unwrap(), Ok(None));
  }

  #[tokio::test]
  async fn test_subscribers_notified() {
    let (tracker, http) = setup();
    let mut events = tracker.subscribe();
    http.reply("/items/balance", balance(1, 0));

    tracker.fetch_balance(month(3)).await.unwrap();
    assert_eq!(events.try_recv().unwrap(), BalanceEvent::Updated(month(3)));
  }
}
