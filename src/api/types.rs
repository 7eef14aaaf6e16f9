use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Money in minor units (cents)
pub type Amount = i64;

/// Which side of the ledger a tag (and the items it labels) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
  Expenses,
  Income,
}

/// User-defined category with a display glyph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
  pub id: u64,
  pub name: String,
  pub sign: String,
  pub kind: TagKind,
}

/// A single financial transaction record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
  pub id: u64,
  pub amount: Amount,
  pub happen_at: DateTime<Utc>,
  pub tags: Vec<Tag>,
  pub tag_ids: Vec<u64>,
  pub kind: Option<TagKind>,
}

impl Item {
  /// The tag shown for this item in list views, if it has any
  pub fn primary_tag(&self) -> Option<&Tag> {
    self.tags.first()
  }

  /// Whether this item counts towards income.
  ///
  /// Uses the item's own kind when the server sends one, else the kind of
  /// its primary tag. Untagged items without a kind count as expenses.
  pub fn is_income(&self) -> bool {
    self
      .kind
      .or_else(|| self.primary_tag().map(|t| t.kind))
      .is_some_and(|k| k == TagKind::Income)
  }
}

/// Summary totals for one date range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
  pub income: u64,
  pub expenses: u64,
  pub balance: Amount,
}
