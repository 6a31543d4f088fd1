// src/cache/fs_store.rs
use super::codec::{self, EntryMeta};
use super::{now_unix, CacheError, CacheStore, CachedImage, NewEntry};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Filesystem backend: `<root>/<cache key>/<entry name>`.
///
/// There is no index and no sweeper. Expired entries are only removed when a
/// read stumbles over them.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn container(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Only the first decodable entry is considered. If it has expired the
    /// lookup is a miss even when a fresher sibling exists.
    pub async fn read_at(&self, key: &str, now: i64) -> Result<Option<CachedImage>, CacheError> {
        let dir = self.container(key);
        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = read_dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!("[CACHE] Skipping non UTF-8 entry in {:?}", dir);
                continue;
            };
            let meta = match codec::decode_name(name) {
                Ok(meta) => meta,
                Err(e) => {
                    debug!("[CACHE] Skipping entry {}: {}", name, e);
                    continue;
                }
            };

            let path = entry.path();
            if meta.expire_at < now {
                info!("[CACHE EVICT] Expired entry {:?}", path);
                tokio::spawn(async move {
                    if let Err(e) = fs::remove_file(&path).await {
                        debug!("[CACHE EVICT] Could not remove {:?}: {}", path, e);
                    }
                });
                return Ok(None);
            }

            let body = fs::read(&path).await?;
            let content_type = content_type_for(&meta);
            return Ok(Some(CachedImage {
                meta,
                content_type,
                body: Bytes::from(body),
            }));
        }

        Ok(None)
    }

    pub async fn write_at(&self, key: &str, entry: NewEntry, now: i64) -> Result<(), CacheError> {
        let extension = extension_for(&entry.content_type)
            .ok_or_else(|| CacheError::UnknownContentType(entry.content_type.clone()))?;
        let expire_at = now.saturating_add(i64::try_from(entry.max_age).unwrap_or(i64::MAX));
        let name = codec::encode_name(entry.max_age, expire_at, &entry.identity_tag, &extension);

        let dir = self.container(key);
        fs::create_dir_all(&dir).await?;

        // Written under a name the codec rejects, then renamed, so readers
        // never see a half-written entry.
        let staging = dir.join(format!("~{name}"));
        let target = dir.join(&name);
        let staged = match fs::write(&staging, &entry.body).await {
            Ok(()) => fs::rename(&staging, &target).await,
            Err(e) => Err(e),
        };
        if let Err(e) = staged {
            // 暂存文件不会被读路径淘汰，失败时必须自己清理
            if let Err(cleanup) = fs::remove_file(&staging).await {
                debug!("[CACHE SET] Could not remove staging file {:?}: {}", staging, cleanup);
            }
            return Err(e.into());
        }

        info!("[CACHE SET] Stored on disk: {}/{}", key, name);
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn read(&self, key: &str) -> Result<Option<CachedImage>, CacheError> {
        self.read_at(key, now_unix()).await
    }

    async fn write(&self, key: &str, entry: NewEntry) -> Result<(), CacheError> {
        self.write_at(key, entry, now_unix()).await
    }
}

/// `.webp` for `image/webp`. Prefers the subtype itself when it is a known
/// extension so `image/jpeg` maps to `.jpeg` rather than `.jpe`.
fn extension_for(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    let known = mime_guess::get_mime_extensions_str(essence)?;
    let subtype = essence.split('/').nth(1).unwrap_or_default();
    let ext = known
        .iter()
        .find(|ext| ext.eq_ignore_ascii_case(subtype))
        .or_else(|| known.first())?;
    Some(format!(".{ext}"))
}

fn content_type_for(meta: &EntryMeta) -> String {
    mime_guess::from_ext(meta.extension.trim_start_matches('.'))
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
