//! In-memory upstream used by the resolver, scheduler and router tests

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mojang_profile::{ProfileService, Result, TextureProfile, UpstreamError};
use tempfile::TempDir;
use texture_store::{AssetStore, OverrideStore, PerKind};

use crate::resolver::Resolver;

#[derive(Default)]
pub(crate) struct FakeProfileService {
    /// name -> profile
    players: HashMap<String, TextureProfile>,
    /// url -> bytes
    textures: HashMap<String, Vec<u8>>,
    delay: Duration,
    unavailable: bool,
    hang: bool,
    pub(crate) lookups: AtomicUsize,
    pub(crate) profile_fetches: AtomicUsize,
    pub(crate) downloads: AtomicUsize,
}

impl FakeProfileService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_player(mut self, name: &str, skin: &[u8], cape: Option<&[u8]>) -> Self {
        let skin_url = format!("https://textures.test/{name}/skin");
        self.textures.insert(skin_url.clone(), skin.to_vec());

        let cape_url = cape.map(|bytes| {
            let url = format!("https://textures.test/{name}/cape");
            self.textures.insert(url.clone(), bytes.to_vec());
            url
        });

        self.players.insert(
            name.to_string(),
            TextureProfile {
                id: format!("{name}-id"),
                skin_url,
                cape_url,
            },
        );
        self
    }

    /// Every lookup takes this long
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Lookups fail as if the service were down
    pub(crate) fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Lookups never complete
    pub(crate) fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileService for FakeProfileService {
    async fn lookup_identity(&self, name: &str) -> Result<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.unavailable {
            return Err(UpstreamError::Status(503));
        }
        self.players
            .get(name)
            .map(|p| p.id.clone())
            .ok_or_else(|| UpstreamError::NotFound(name.to_string()))
    }

    async fn fetch_profile(&self, id: &str) -> Result<TextureProfile> {
        self.profile_fetches.fetch_add(1, Ordering::SeqCst);
        self.players
            .values()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(UpstreamError::Status(204))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.textures
            .get(url)
            .cloned()
            .ok_or(UpstreamError::Status(404))
    }
}

/// Directory layout used by the tests, with default textures in place
pub(crate) struct TestDirs {
    pub(crate) root: TempDir,
}

impl TestDirs {
    pub(crate) fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("defaults")).unwrap();
        std::fs::write(root.path().join("defaults/default_skin.png"), b"default skin").unwrap();
        std::fs::write(root.path().join("defaults/default_cape.png"), b"default cape").unwrap();
        Self { root }
    }

    pub(crate) fn join(&self, path: &str) -> PathBuf {
        self.root.path().join(path)
    }

    pub(crate) fn defaults(&self) -> PerKind<PathBuf> {
        PerKind::new(
            self.join("defaults/default_skin.png"),
            self.join("defaults/default_cape.png"),
        )
    }

    pub(crate) async fn cache(&self) -> AssetStore {
        let store = AssetStore::new(PerKind::new(self.join("s_cache"), self.join("c_cache")));
        store.init().await.unwrap();
        store
    }

    pub(crate) async fn overrides(&self) -> OverrideStore {
        let store =
            OverrideStore::new(PerKind::new(self.join("s_override"), self.join("c_override")));
        store.init().await.unwrap();
        store
    }

    pub(crate) async fn resolver(&self, upstream: Arc<FakeProfileService>) -> Resolver {
        Resolver::new(
            self.overrides().await,
            self.cache().await,
            upstream,
            self.defaults(),
            Duration::from_secs(5),
        )
    }
}
