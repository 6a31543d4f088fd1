// src/cache.rs
pub mod codec;
pub mod fs_store;
pub mod writer;

use crate::hash::{hash, HashInput};
use async_trait::async_trait;
use bytes::Bytes;
use codec::EntryMeta;
use thiserror::Error;

pub use fs_store::FsCacheStore;
pub use writer::{CacheWriter, WriteJob};

/// 磁盘布局或缓存键输入变化时递增，旧目录自然不会再被查到
pub const CACHE_FORMAT_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No file extension known for content type {0}")]
    UnknownContentType(String),
}

/// A live entry returned by a lookup.
#[derive(Debug, Clone)]
pub struct CachedImage {
    pub meta: EntryMeta,
    pub content_type: String,
    pub body: Bytes,
}

/// Payload handed to [`CacheStore::write`]. `expire_at` is computed by the
/// store at write time.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub max_age: u64,
    pub identity_tag: String,
    pub content_type: String,
    pub body: Bytes,
}

/// Key-value view of the cache. The orchestrator only talks to this trait,
/// so the backend can be swapped without touching request handling.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` covers a missing container, an empty one, undecodable
    /// names and an expired first entry.
    async fn read(&self, key: &str) -> Result<Option<CachedImage>, CacheError>;

    /// Adds a new entry next to whatever already lives under `key`.
    async fn write(&self, key: &str, entry: NewEntry) -> Result<(), CacheError>;
}

/// 基于请求参数哈希生成缓存目录名。
pub fn cache_key(url: &str, width: u32, quality: u8, media_type: &str) -> String {
    hash(&[
        HashInput::Integer(CACHE_FORMAT_VERSION),
        HashInput::Text(url),
        HashInput::Integer(i64::from(width)),
        HashInput::Integer(i64::from(quality)),
        HashInput::Text(media_type),
    ])
}

pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
