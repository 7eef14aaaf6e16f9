/// Accumulated state for one cache key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<T> {
  /// Items in fetch order, across every page loaded so far
  pub items: Vec<T>,
  /// Last successfully fetched page; 0 when none has landed yet
  pub page: u32,
  /// Whether pages exist beyond `page`
  pub has_more: bool,
  /// A request for this key is in flight
  pub pending: bool,
}

impl<T> Default for CacheEntry<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      page: 0,
      has_more: false,
      pending: false,
    }
  }
}

/// What a fetch call did, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
  /// The response was written into the entry
  Applied,
  /// The entry already holds a first page; nothing was requested
  AlreadyLoaded,
  /// Another request for this key is in flight; nothing was requested
  InFlight,
  /// The last page has been fetched; nothing was requested
  Exhausted,
  /// No first page for this key yet; nothing was requested
  NotStarted,
  /// The key was reset while the request was in flight, so the response
  /// (or its failure) was dropped
  Discarded,
}

impl FetchOutcome {
  pub fn is_applied(self) -> bool {
    matches!(self, Self::Applied)
  }
}
