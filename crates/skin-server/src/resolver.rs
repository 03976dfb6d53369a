//! Override -> cache -> upstream texture resolution

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use mojang_profile::ProfileService;
use texture_store::{AssetKind, AssetStore, IdentityKey, OverrideStore, PerKind};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::ResolveError;
use crate::types::{AssetLocation, StoreCount};

type FlightKey = (AssetKind, IdentityKey);
type FlightOutcome = Result<AssetLocation, ResolveError>;
type FlightRegistry = std::sync::Mutex<HashMap<FlightKey, FlightSlot>>;

#[derive(Default)]
struct FlightSlot {
    outcome: Arc<OnceCell<FlightOutcome>>,
    members: usize,
}

/// Membership in the group of resolvers that missed the cache for one
/// (kind, key). The first member runs the fetch and every member receives its
/// outcome, failures included. The slot is removed when the last member
/// leaves, including on cancellation.
struct Flight<'a> {
    registry: &'a FlightRegistry,
    key: FlightKey,
    outcome: Arc<OnceCell<FlightOutcome>>,
}

impl<'a> Flight<'a> {
    fn join(registry: &'a FlightRegistry, key: FlightKey) -> Self {
        let mut slots = registry.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(key.clone()).or_default();
        slot.members += 1;
        let outcome = Arc::clone(&slot.outcome);
        Self {
            registry,
            key,
            outcome,
        }
    }

    /// Run `fetch` unless another member already has; if the running member
    /// is cancelled before it finishes, a waiting member takes over.
    async fn share<F, Fut>(&self, fetch: F) -> FlightOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FlightOutcome>,
    {
        self.outcome.get_or_init(fetch).await.clone()
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut slots = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.members -= 1;
            if slot.members == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

/// Resolves a player's texture to a file that can be served.
///
/// Lookup order is override, cache, then upstream; anything that goes wrong
/// yields the default texture for the kind.
pub struct Resolver {
    overrides: OverrideStore,
    cache: AssetStore,
    upstream: Arc<dyn ProfileService>,
    defaults: PerKind<PathBuf>,
    upstream_timeout: Duration,
    in_flight: FlightRegistry,
}

impl Resolver {
    pub fn new(
        overrides: OverrideStore,
        cache: AssetStore,
        upstream: Arc<dyn ProfileService>,
        defaults: PerKind<PathBuf>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            overrides,
            cache,
            upstream,
            defaults,
            upstream_timeout,
            in_flight: FlightRegistry::default(),
        }
    }

    /// Resolve the texture of `kind` for player `key`. Never fails.
    pub async fn resolve(&self, kind: AssetKind, key: &str) -> AssetLocation {
        match self.try_resolve(kind, key).await {
            Ok(location) => location,
            Err(e) => {
                if e.is_expected() {
                    debug!(kind = %kind, key, error = %e, "Serving default texture");
                } else {
                    warn!(kind = %kind, key, error = %e, "Serving default texture");
                }
                AssetLocation::Default(self.defaults.get(kind).clone())
            }
        }
    }

    pub async fn try_resolve(
        &self,
        kind: AssetKind,
        key: &str,
    ) -> Result<AssetLocation, ResolveError> {
        let key =
            IdentityKey::parse(key).map_err(|_| ResolveError::InvalidKey(key.to_string()))?;

        if self.overrides.has(kind, &key).await {
            return Ok(AssetLocation::Override(self.overrides.path(kind, &key)));
        }

        if self.cache.has(kind, &key).await {
            return Ok(AssetLocation::Cached(self.cache.path(kind, &key)));
        }

        let flight = Flight::join(&self.in_flight, (kind, key.clone()));

        // Deadline covers the shared fetch; waiting members get its timeout
        flight
            .share(|| async {
                tokio::time::timeout(self.upstream_timeout, self.fetch_and_store(kind, &key))
                    .await
                    .unwrap_or_else(|_| {
                        Err(ResolveError::UpstreamUnavailable(format!(
                            "no response within {:?}",
                            self.upstream_timeout
                        )))
                    })
            })
            .await
    }

    async fn fetch_and_store(&self, kind: AssetKind, key: &IdentityKey) -> FlightOutcome {
        // A flight that finished just before ours may have filled the cache
        if self.cache.has(kind, key).await {
            return Ok(AssetLocation::Cached(self.cache.path(kind, key)));
        }

        let data = self.fetch_upstream(kind, key).await?;

        let path = self
            .cache
            .write(kind, key, &data)
            .await
            .map_err(|e| ResolveError::StoreWriteFailure(Arc::new(e)))?;

        info!(kind = %kind, key = %key, "Fetched texture from upstream");
        Ok(AssetLocation::Fetched(path))
    }

    async fn fetch_upstream(
        &self,
        kind: AssetKind,
        key: &IdentityKey,
    ) -> Result<Vec<u8>, ResolveError> {
        let name = key.as_str();

        let id = self
            .upstream
            .lookup_identity(name)
            .await
            .map_err(|e| ResolveError::upstream(name, e))?;

        let profile = self
            .upstream
            .fetch_profile(&id)
            .await
            .map_err(|e| ResolveError::upstream(name, e))?;

        let url = match kind {
            AssetKind::Skin => profile.skin_url,
            AssetKind::Cape => profile
                .cape_url
                .ok_or(ResolveError::AssetKindAbsent(kind))?,
        };

        self.upstream
            .download(&url)
            .await
            .map_err(|e| ResolveError::upstream(name, e))
    }

    /// Number of cached and overridden textures of `kind`
    pub async fn store_count(&self, kind: AssetKind) -> texture_store::Result<StoreCount> {
        Ok(StoreCount {
            cached: self.cache.count(kind).await?,
            overridden: self.overrides.count(kind).await?,
        })
    }

    pub fn defaults(&self) -> &PerKind<PathBuf> {
        &self.defaults
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
