use super::key::CacheKey;

/// Change notifications published by a [`super::RangeStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
  /// The entry for this key changed; re-read it with `get`
  Updated(CacheKey),
  /// The entry for this key was discarded
  Reset(CacheKey),
}
