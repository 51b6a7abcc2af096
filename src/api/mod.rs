pub mod client;
pub mod models;

pub use client::{ApiClient, ApiError, FeedSource, MediaFetcher, Result};
pub use models::ClientConfig;
