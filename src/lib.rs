//! Client for a personal-finance tracking API.
//!
//! Browses items within a date range, page by page, alongside the range's
//! income/expense totals. The core is [`cache::RangeStore`], a range-scoped
//! cache of paginated result sets; [`summary::ItemSummary`] binds it to a
//! selected range.

pub mod api;
pub mod balance;
pub mod cache;
pub mod config;
pub mod logging;
pub mod range;
pub mod summary;

#[cfg(test)]
mod testing;
