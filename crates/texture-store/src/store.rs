//! Per-kind texture directories: the writable cache and the read-only overrides

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::key::IdentityKey;
use crate::kind::{AssetKind, PerKind};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A directory holding one `<key>.png` file per identity
#[derive(Debug, Clone)]
struct TextureDir {
    root: PathBuf,
}

impl TextureDir {
    fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn entry_path(&self, key: &IdentityKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    async fn init(&self, label: &str) -> Result<()> {
        if fs::metadata(&self.root).await.is_err() {
            warn!(dir = ?self.root, "{label} directory does not exist, creating");
        }
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?;
        info!(dir = ?self.root, "{label} directory ready");
        Ok(())
    }

    async fn has(&self, key: &IdentityKey) -> bool {
        match fs::metadata(self.entry_path(key)).await {
            Ok(meta) => meta.is_file(),
            Err(_) => false,
        }
    }

    async fn read(&self, key: &IdentityKey) -> Result<Vec<u8>> {
        let path = self.entry_path(key);
        fs::read(&path).await.map_err(|e| StoreError::io(&path, e))
    }

    async fn count(&self) -> Result<usize> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?;

        let mut count = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.root, e))?
        {
            if !is_entry_name(&entry.file_name()) {
                continue;
            }
            if entry.file_type().await.is_ok_and(|t| t.is_file()) {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Texture files are `<key>.png`; in-progress writes are hidden dot files.
fn is_entry_name(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|n| !n.starts_with('.') && n.ends_with(".png"))
}

/// Write `data` to `path` and flush it to disk before returning.
async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}

/// The cache of textures fetched from upstream.
///
/// Writes are published with a rename so a reader sees either the previous
/// file, no file, or the complete new file.
#[derive(Debug, Clone)]
pub struct AssetStore {
    dirs: PerKind<TextureDir>,
}

impl AssetStore {
    pub fn new(dirs: PerKind<PathBuf>) -> Self {
        Self {
            dirs: dirs.map(TextureDir::new),
        }
    }

    /// Create the cache directories if they are missing
    pub async fn init(&self) -> Result<()> {
        self.dirs.skin.init("Skin cache").await?;
        self.dirs.cape.init("Cape cache").await
    }

    pub fn dir(&self, kind: AssetKind) -> &Path {
        &self.dirs.get(kind).root
    }

    pub fn path(&self, kind: AssetKind, key: &IdentityKey) -> PathBuf {
        self.dirs.get(kind).entry_path(key)
    }

    pub async fn has(&self, kind: AssetKind, key: &IdentityKey) -> bool {
        self.dirs.get(kind).has(key).await
    }

    pub async fn read(&self, kind: AssetKind, key: &IdentityKey) -> Result<Vec<u8>> {
        self.dirs.get(kind).read(key).await
    }

    /// Store `data` for `key`, replacing any previous entry. Returns the entry path.
    pub async fn write(&self, kind: AssetKind, key: &IdentityKey, data: &[u8]) -> Result<PathBuf> {
        let dir = self.dirs.get(kind);
        let target = dir.entry_path(key);
        let tmp = dir.root.join(format!(
            ".{}.{}-{}.tmp",
            key.file_name(),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = write_synced(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::io(&tmp, e));
        }

        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::io(&target, e));
        }

        debug!(kind = %kind, key = %key, size = data.len(), "Cached texture");
        Ok(target)
    }

    /// Remove everything in the kind's directory. Returns how many texture
    /// entries were removed; stray temp files and subdirectories are removed
    /// too but not counted.
    pub async fn clear(&self, kind: AssetKind) -> Result<usize> {
        let root = &self.dirs.get(kind).root;
        let mut entries = fs::read_dir(root)
            .await
            .map_err(|e| StoreError::io(root, e))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(root, e))?
        {
            let path = entry.path();
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            let result = if is_dir {
                fs::remove_dir_all(&path).await
            } else {
                fs::remove_file(&path).await
            };

            match result {
                Ok(()) => {
                    if !is_dir && is_entry_name(&entry.file_name()) {
                        removed += 1;
                    }
                }
                // A concurrent write may have renamed its temp file away
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = ?path, error = %e, "Failed to remove cache entry"),
            }
        }

        Ok(removed)
    }

    pub async fn count(&self, kind: AssetKind) -> Result<usize> {
        self.dirs.get(kind).count().await
    }
}

/// Operator-supplied textures that take precedence over the cache.
///
/// Populated outside this process; there is no write or clear.
#[derive(Debug, Clone)]
pub struct OverrideStore {
    dirs: PerKind<TextureDir>,
}

impl OverrideStore {
    pub fn new(dirs: PerKind<PathBuf>) -> Self {
        Self {
            dirs: dirs.map(TextureDir::new),
        }
    }

    /// Create the override directories if they are missing
    pub async fn init(&self) -> Result<()> {
        self.dirs.skin.init("Skin override").await?;
        self.dirs.cape.init("Cape override").await
    }

    pub fn path(&self, kind: AssetKind, key: &IdentityKey) -> PathBuf {
        self.dirs.get(kind).entry_path(key)
    }

    pub async fn has(&self, kind: AssetKind, key: &IdentityKey) -> bool {
        self.dirs.get(kind).has(key).await
    }

    pub async fn read(&self, kind: AssetKind, key: &IdentityKey) -> Result<Vec<u8>> {
        self.dirs.get(kind).read(key).await
    }

    pub async fn count(&self, kind: AssetKind) -> Result<usize> {
        self.dirs.get(kind).count().await
    }
}
