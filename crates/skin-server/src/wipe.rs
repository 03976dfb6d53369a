//! Periodic full wipes of the texture cache
//!
//! Each kind has its own timer. The cache is cleared once at startup, then
//! every interval after that. Each wipe records when it was due and when the
//! next one will run so the statistics endpoints can report both.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use texture_store::{AssetKind, AssetStore, PerKind};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Wipe bookkeeping for one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WipeState {
    pub next_wipe_at: DateTime<Utc>,
    pub previous_wipe_at: DateTime<Utc>,
}

impl WipeState {
    fn armed(now: DateTime<Utc>, interval: Duration) -> Self {
        Self {
            next_wipe_at: deadline(now, interval),
            previous_wipe_at: now,
        }
    }

    /// The wipe that was due at `next_wipe_at` has just run
    fn advance(self, now: DateTime<Utc>, interval: Duration) -> Self {
        Self {
            next_wipe_at: deadline(now, interval),
            previous_wipe_at: self.next_wipe_at,
        }
    }
}

fn deadline(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(interval)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

struct Shared {
    store: AssetStore,
    intervals: PerKind<Duration>,
    states: PerKind<RwLock<WipeState>>,
}

impl Shared {
    async fn wipe(&self, kind: AssetKind) {
        match self.store.clear(kind).await {
            Ok(removed) => info!(kind = %kind, removed, "Wiped texture cache"),
            Err(e) => error!(kind = %kind, error = %e, "Failed to wipe texture cache"),
        }

        let mut state = self.states.get(kind).write().await;
        *state = state.advance(Utc::now(), *self.intervals.get(kind));
        info!(kind = %kind, next_wipe_at = %state.next_wipe_at, "Scheduled next cache wipe");
    }
}

/// Owns the per-kind wipe timers. Dropping it stops them.
pub struct WipeScheduler {
    shared: Arc<Shared>,
    tasks: Vec<JoinHandle<()>>,
}

impl WipeScheduler {
    /// Clear every cache now and start one timer per kind
    pub async fn start(store: AssetStore, intervals: PerKind<Duration>) -> Self {
        for kind in AssetKind::ALL {
            match store.clear(kind).await {
                Ok(removed) => info!(kind = %kind, removed, "Cleared texture cache on startup"),
                Err(e) => error!(kind = %kind, error = %e, "Failed to clear texture cache on startup"),
            }
        }

        let now = Utc::now();
        let states = PerKind::new(
            RwLock::new(WipeState::armed(now, intervals.skin)),
            RwLock::new(WipeState::armed(now, intervals.cape)),
        );

        let shared = Arc::new(Shared {
            store,
            intervals,
            states,
        });

        let tasks = AssetKind::ALL
            .into_iter()
            .map(|kind| tokio::spawn(run_timer(Arc::clone(&shared), kind)))
            .collect();

        Self { shared, tasks }
    }

    pub async fn state(&self, kind: AssetKind) -> WipeState {
        *self.shared.states.get(kind).read().await
    }

    pub fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for WipeScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_timer(shared: Arc<Shared>, kind: AssetKind) {
    loop {
        let next = shared.states.get(kind).read().await.next_wipe_at;
        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(wait).await;
        shared.wipe(kind).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeProfileService, TestDirs};
    use crate::types::AssetLocation;

    async fn wait_for_wipe(scheduler: &WipeScheduler, kind: AssetKind, before: WipeState) -> WipeState {
        for _ in 0..200 {
            let state = scheduler.state(kind).await;
            if state != before {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} cache was never wiped", kind);
    }

    #[test]
    fn test_state_bookkeeping() {
        let t0 = Utc::now();
        let interval = Duration::from_secs(3600);

        let state = WipeState::armed(t0, interval);
        assert_eq!(state.previous_wipe_at, t0);
        assert_eq!(state.next_wipe_at, t0 + chrono::Duration::hours(1));

        let t1 = state.next_wipe_at + chrono::Duration::milliseconds(3);
        let advanced = state.advance(t1, interval);
        assert_eq!(advanced.previous_wipe_at, state.next_wipe_at);
        assert_eq!(advanced.next_wipe_at, t1 + chrono::Duration::hours(1));
    }

    #[test]
    fn test_deadline_saturates() {
        let now = Utc::now();
        assert_eq!(deadline(now, Duration::MAX), DateTime::<Utc>::MAX_UTC);
    }

    #[tokio::test]
    async fn test_startup_clears_caches() {
        let dirs = TestDirs::new();
        let store = dirs.cache().await;
        std::fs::write(dirs.join("s_cache/Alex.png"), b"stale").unwrap();
        std::fs::write(dirs.join("c_cache/Notch.png"), b"stale").unwrap();

        let before = Utc::now();
        let scheduler = WipeScheduler::start(
            store.clone(),
            PerKind::new(Duration::from_secs(3600), Duration::from_secs(7200)),
        )
        .await;

        assert_eq!(store.count(AssetKind::Skin).await.unwrap(), 0);
        assert_eq!(store.count(AssetKind::Cape).await.unwrap(), 0);

        let skin = scheduler.state(AssetKind::Skin).await;
        let cape = scheduler.state(AssetKind::Cape).await;
        assert!(skin.previous_wipe_at >= before);
        assert_eq!(
            skin.next_wipe_at - skin.previous_wipe_at,
            chrono::Duration::hours(1)
        );
        assert_eq!(
            cape.next_wipe_at - cape.previous_wipe_at,
            chrono::Duration::hours(2)
        );
    }

    #[tokio::test]
    async fn test_timer_wipes_and_next_request_refetches() {
        let dirs = TestDirs::new();
        let upstream = Arc::new(FakeProfileService::new().with_player("Alex", b"alex skin", None));
        let resolver = dirs.resolver(upstream.clone()).await;

        let scheduler = WipeScheduler::start(
            dirs.cache().await,
            PerKind::new(Duration::from_millis(200), Duration::from_secs(3600)),
        )
        .await;
        let initial = scheduler.state(AssetKind::Skin).await;

        assert!(matches!(
            resolver.resolve(AssetKind::Skin, "Alex").await,
            AssetLocation::Fetched(_)
        ));
        assert!(matches!(
            resolver.resolve(AssetKind::Skin, "Alex").await,
            AssetLocation::Cached(_)
        ));

        let wiped = wait_for_wipe(&scheduler, AssetKind::Skin, initial).await;
        assert_eq!(wiped.previous_wipe_at, initial.next_wipe_at);
        assert!(wiped.next_wipe_at > initial.next_wipe_at);
        assert!(!dirs.join("s_cache/Alex.png").exists());

        // The cape timer has not fired
        assert_eq!(scheduler.state(AssetKind::Cape).await.previous_wipe_at, initial.previous_wipe_at);

        assert!(matches!(
            resolver.resolve(AssetKind::Skin, "Alex").await,
            AssetLocation::Fetched(_)
        ));
        assert_eq!(upstream.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_wipe_still_advances() {
        let dirs = TestDirs::new();
        let store = dirs.cache().await;
        let scheduler = WipeScheduler::start(
            store,
            PerKind::new(Duration::from_millis(100), Duration::from_secs(3600)),
        )
        .await;
        let initial = scheduler.state(AssetKind::Skin).await;

        std::fs::remove_dir(dirs.join("s_cache")).unwrap();

        let wiped = wait_for_wipe(&scheduler, AssetKind::Skin, initial).await;
        assert_eq!(wiped.previous_wipe_at, initial.next_wipe_at);
    }

    #[tokio::test]
    async fn test_shutdown_stops_timers() {
        let dirs = TestDirs::new();
        let scheduler = WipeScheduler::start(
            dirs.cache().await,
            PerKind::new(Duration::from_millis(50), Duration::from_millis(50)),
        )
        .await;
        scheduler.shutdown();
        let stopped = scheduler.state(AssetKind::Skin).await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(scheduler.state(AssetKind::Skin).await, stopped);
    }
}
