pub mod client;
pub mod durable;
pub mod key;

pub use client::{CacheClient, CacheNamespace, HttpError};
pub use durable::{DurableCache, FileDurableCache, InMemoryDurableCache};
pub use key::{cache_key, cache_key_with_body};
