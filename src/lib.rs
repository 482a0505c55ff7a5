//! Cachet credits library
//!
//! Fetches the Cachet credits feed through a cache-aside repository. Failed
//! fetches are cached too, and callers only ever see the payload or nothing.

pub mod cache;
pub mod cli;
pub mod credits;

pub use credits::{Credits, CreditsConfig, FetchResult};
