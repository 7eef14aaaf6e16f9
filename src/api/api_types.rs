//! Serde-deserializable types matching the finance API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::types::{Balance, Item, Tag, TagKind};

// ============================================================================
// List envelope
// ============================================================================

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ApiPager {
  pub page: u32,
  pub per_page: u32,
  pub count: u64,
}

impl ApiPager {
  /// Whether pages exist beyond the one this pager describes
  pub fn has_more(&self) -> bool {
    u64::from(self.page) * u64::from(self.per_page) < self.count
  }
}

/// Paginated list response: `{resources: [...], pager: {...}}`
#[derive(Debug, Deserialize)]
pub struct ApiResources<T> {
  #[serde(default = "Vec::new")]
  pub resources: Vec<T>,
  pub pager: ApiPager,
}

/// Body of a non-2xx response
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrors {
  #[serde(default)]
  pub errors: BTreeMap<String, Vec<String>>,
}

// ============================================================================
// Items and tags
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiTag {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub sign: String,
  pub kind: TagKind,
}

#[derive(Debug, Deserialize)]
pub struct ApiItem {
  pub id: u64,
  pub amount: i64,
  pub happen_at: DateTime<Utc>,
  #[serde(default)]
  pub tags: Option<Vec<ApiTag>>,
  #[serde(default)]
  pub tag_ids: Vec<u64>,
  pub kind: Option<TagKind>,
}

impl From<ApiTag> for Tag {
  fn from(tag: ApiTag) -> Self {
    Tag {
      id: tag.id,
      name: tag.name,
      sign: tag.sign,
      kind: tag.kind,
    }
  }
}

impl From<ApiItem> for Item {
  fn from(item: ApiItem) -> Self {
    Item {
      id: item.id,
      amount: item.amount,
      happen_at: item.happen_at,
      tags: item
        .tags
        .unwrap_or_default()
        .into_iter()
        .map(Tag::from)
        .collect(),
      tag_ids: item.tag_ids,
      kind: item.kind,
    }
  }
}

// ============================================================================
// Balance endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiBalance {
  #[serde(default)]
  pub income: u64,
  #[serde(default)]
  pub expenses: u64,
  #[serde(default)]
  pub balance: i64,
}

impl From<ApiBalance> for Balance {
  fn from(b: ApiBalance) -> Self {
    Balance {
      income: b.income,
      expenses: b.expenses,
      balance: b.balance,
    }
  }
}
