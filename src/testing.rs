//! Scripted stand-in for the HTTP boundary, plus response fixtures.
//!
//! Replies are queued per request path and handed out in order. A gated
//! reply is held until its sender fires (or is dropped), which lets tests
//! decide exactly when a response "arrives".

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::api::{FetchError, HttpGet, QueryParams};
use crate::range::DateRange;

/// A request as seen by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
  pub path: String,
  pub query: QueryParams,
}

impl Request {
  pub fn page(&self) -> Option<u32> {
    self.query.get("page").and_then(|p| p.parse().ok())
  }
}

struct Scripted {
  reply: Result<Value, FetchError>,
  gate: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
struct Script {
  requests: Vec<Request>,
  replies: HashMap<String, VecDeque<Scripted>>,
}

#[derive(Clone, Default)]
pub struct ScriptedHttp {
  script: Arc<Mutex<Script>>,
}

impl ScriptedHttp {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn reply(&self, path: &str, body: Value) {
    self.push(path, Ok(body), None);
  }

  pub fn fail(&self, path: &str, error: FetchError) {
    self.push(path, Err(error), None);
  }

  /// Queue a reply that is held until the returned sender fires
  pub fn reply_gated(&self, path: &str, body: Value) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.push(path, Ok(body), Some(rx));
    tx
  }

  pub fn fail_gated(&self, path: &str, error: FetchError) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.push(path, Err(error), Some(rx));
    tx
  }

  pub fn requests(&self) -> Vec<Request> {
    self.script.lock().unwrap().requests.clone()
  }

  pub fn requests_to(&self, path: &str) -> Vec<Request> {
    self
      .requests()
      .into_iter()
      .filter(|r| r.path == path)
      .collect()
  }

  pub fn request_count(&self) -> usize {
    self.script.lock().unwrap().requests.len()
  }

  fn push(&self, path: &str, reply: Result<Value, FetchError>, gate: Option<oneshot::Receiver<()>>) {
    self
      .script
      .lock()
      .unwrap()
      .replies
      .entry(path.to_string())
      .or_default()
      .push_back(Scripted { reply, gate });
  }
}

impl HttpGet for ScriptedHttp {
  fn get<T>(
    &self,
    path: &str,
    query: &QueryParams,
  ) -> impl Future<Output = Result<T, FetchError>> + Send
  where
    T: DeserializeOwned + Send + 'static,
  {
    let next = {
      let mut script = self.script.lock().unwrap();
      script.requests.push(Request {
        path: path.to_string(),
        query: query.clone(),
      });
      script.replies.get_mut(path).and_then(VecDeque::pop_front)
    };
    let path = path.to_string();

    async move {
      let Some(Scripted { reply, gate }) = next else {
        return Err(FetchError::network(format!("no scripted reply for {}", path)));
      };
      if let Some(gate) = gate {
        let _ = gate.await;
      }
      serde_json::from_value(reply?).map_err(|e| FetchError::Decode {
        message: e.to_string(),
      })
    }
  }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn item(id: u64) -> Value {
  json!({
    "id": id,
    "amount": 100 * id,
    "happen_at": "2024-01-15T10:00:00Z",
    "tags": [{"id": 1, "name": "Food", "sign": "F", "kind": "expenses"}],
    "tag_ids": [1]
  })
}

pub fn page(ids: &[u64], page: u32, per_page: u32, count: u64) -> Value {
  json!({
    "resources": ids.iter().map(|&id| item(id)).collect::<Vec<_>>(),
    "pager": {"page": page, "per_page": per_page, "count": count}
  })
}

pub fn balance(income: u64, expenses: u64) -> Value {
  json!({
    "income": income,
    "expenses": expenses,
    "balance": (income as i64) - (expenses as i64)
  })
}

pub fn month(month: u32) -> DateRange {
  let start = NaiveDate::from_ymd_opt(2024, month, 1).unwrap();
  let end = NaiveDate::from_ymd_opt(2024, month, 28).unwrap();
  DateRange::new(start, end).unwrap()
}

/// Let spawned tasks run until they block
pub async fn idle() {
  for _ in 0..16 {
    tokio::task::yield_now().await;
  }
}
