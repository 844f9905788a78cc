//! Scale server API: domain types, typed HTTP client, session context,
//! and the caching wrapper that enforces the invalidation convention.

pub mod api_types;
mod cache;
mod cached_client;
mod client;
mod error;
mod session;
pub mod types;

pub use cached_client::{CachedScaleClient, DEFAULT_INTERVAL_MINUTES};
pub use client::ScaleClient;
pub use error::{flatten_detail, ApiError};
pub use session::Session;
