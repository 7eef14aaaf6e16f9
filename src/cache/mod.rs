//! Range-scoped caching of paginated result sets.
//!
//! This module provides an in-memory cache that:
//! - Keys result sets by resource name plus date range
//! - Accumulates pages in fetch order with an explicit "has more" flag
//! - Allows at most one request in flight per key
//! - Drops responses that land after their key was reset

mod entry;
mod event;
mod key;
mod store;
mod traits;

pub use entry::{CacheEntry, FetchOutcome};
pub use event::StoreEvent;
pub use key::CacheKey;
pub use store::RangeStore;
pub use traits::{Cacheable, QueryKey};
