pub mod api_types;
pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, HttpGet, QueryParams};
pub use error::FetchError;
pub use types::{Amount, Balance, Item, Tag, TagKind};
