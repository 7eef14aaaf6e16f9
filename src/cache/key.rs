use sha2::{Digest, Sha256};
use std::fmt;

use super::traits::QueryKey;
use crate::range::DateRange;

/// Identity of a cached, range-scoped result set.
///
/// Two keys are the same entry only when resource and both range bounds
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  resource: String,
  range: DateRange,
}

impl CacheKey {
  pub fn new(resource: impl Into<String>, range: DateRange) -> Self {
    Self {
      resource: resource.into(),
      range,
    }
  }

  pub fn resource(&self) -> &str {
    &self.resource
  }

  pub fn range(&self) -> DateRange {
    self.range
  }

  /// Request path of the list endpoint for this key
  pub fn path(&self) -> String {
    format!("/{}", self.resource)
  }
}

impl QueryKey for CacheKey {
  fn cache_hash(&self) -> String {
    let input = format!(
      "{}:{}:{}",
      self.resource,
      self.range.start(),
      self.range.end()
    );

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    format!("{} {}", self.resource, self.range)
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.description())
  }
}
