//! Cache module backing the credits fetcher
//!
//! A [`Store`] persists JSON values with an absolute expiry, either in memory
//! ([`MemoryStore`]) or as one file per key on disk ([`FileStore`]). The
//! [`Repository`] sits on top of a store and provides the `remember`
//! operation: read the key, or compute, store and return it on a miss, with
//! at most one computation in flight per key.

mod file;
mod memory;
mod repository;
mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use repository::Repository;
pub use store::{CacheError, Store};
