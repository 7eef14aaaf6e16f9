//! Core traits for the caching system.

use serde::de::DeserializeOwned;

use crate::api::api_types::ApiItem;
use crate::api::Item;

/// Trait for entities that can be held in a paginated cache entry.
///
/// Implementors name the wire type the server sends for them and a stable id
/// used to keep a page from appending a record already held.
pub trait Cacheable: Clone + Send + Sync + 'static {
  /// Serde shape of one element of the `resources` array
  type Wire: DeserializeOwned + Send + 'static;

  fn from_wire(wire: Self::Wire) -> Self;

  /// Server-assigned identifier
  fn cache_id(&self) -> u64;
}

/// Trait for keys identifying a cached query.
pub trait QueryKey {
  /// Stable, fixed-length fingerprint for log correlation
  fn cache_hash(&self) -> String;

  /// Human-readable description (e.g. "items 2024-01-01..2024-01-31")
  fn description(&self) -> String;
}

impl Cacheable for Item {
  type Wire = ApiItem;

  fn from_wire(wire: ApiItem) -> Self {
    Item::from(wire)
  }

  fn cache_id(&self) -> u64 {
    self.id
  }
}
