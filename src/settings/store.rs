//! ==============================================================================
//! store.rs - the settings reconciler
//! ==============================================================================
//!
//! purpose:
//!     owns the single working copy of `UserSettings` for the process and keeps
//!     it in step with two sources: the durable local cache and the remote
//!     settings endpoint.
//!
//! lifecycle:
//!
//! ```text
//!     Uninitialized ──open()──> LocalOnly ──refresh() ok──> Reconciled
//!                                   │  ^                        │
//!                                   └──┘ refresh() fails        └─ stays
//!
//!     - LocalOnly: seeded from the cache, or defaults if the cache is empty
//!       or unparsable.
//!     - Reconciled: the remote value won; fields it omitted were filled from
//!       the compiled-in defaults, not from the cache.
//! ```
//!
//! guarantees:
//!     - reads never wait on the network.
//!     - cache failures are logged and swallowed; the in-memory value and the
//!       theme side effect still apply.
//!     - the lock is never held across an await; last write wins.
//!
//! relationships:
//!     - uses: storage.rs (cache), theme.rs (theme side effect),
//!             api/service.rs (`SettingsRemote`)
//!     - used by: main.rs
//!
//! ==============================================================================

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::api::{ApiError, SettingsRemote};

use super::model::{SettingsPatch, UserSettings};
use super::storage::SettingsStorage;
use super::theme::ThemeSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// no source consulted yet
    Uninitialized,
    /// seeded from the local cache (or defaults); remote pending or failed
    LocalOnly,
    /// the remote value has been adopted at least once
    Reconciled,
}

struct Inner {
    settings: UserSettings,
    state: SyncState,
}

pub struct SettingsStore<S, T> {
    storage: S,
    theme: T,
    inner: RwLock<Inner>,
}

impl<S: SettingsStorage, T: ThemeSink> SettingsStore<S, T> {
    /// Store holding the compiled-in defaults; nothing read yet.
    pub fn new(storage: S, theme: T) -> Self {
        Self {
            storage,
            theme,
            inner: RwLock::new(Inner {
                settings: UserSettings::default(),
                state: SyncState::Uninitialized,
            }),
        }
    }

    /// Store seeded from the local cache.
    pub fn open(storage: S, theme: T) -> Self {
        let store = Self::new(storage, theme);
        store.load_local();
        store
    }

    /// Seeds the working copy from the cache and moves to `LocalOnly`.
    ///
    /// Does nothing once the remote value has been adopted.
    pub fn load_local(&self) {
        let cached = self.read_cache();

        let mut inner = self.write_inner();
        if inner.state == SyncState::Reconciled {
            tracing::debug!("settings already reconciled; ignoring local cache");
            return;
        }
        inner.settings = cached.unwrap_or_default();
        inner.state = SyncState::LocalOnly;
    }

    pub fn current(&self) -> UserSettings {
        self.read_inner().settings.clone()
    }

    pub fn state(&self) -> SyncState {
        self.read_inner().state
    }

    /// Merges `patch` into the working copy and persists it.
    ///
    /// Top-level keys only: a nested object in `patch` replaces the current
    /// one entirely, so sibling fields the caller leaves out are dropped.
    /// Never fails; a cache write error is logged.
    pub fn update_settings(&self, patch: &SettingsPatch) -> UserSettings {
        let (merged, previous_theme) = {
            let mut inner = self.write_inner();
            let previous_theme = inner.settings.theme;
            inner.settings.apply(patch);
            (inner.settings.clone(), previous_theme)
        };

        self.persist(&merged);
        if merged.theme != previous_theme {
            self.theme.apply_theme(merged.theme);
        }
        tracing::debug!(?patch, "settings updated");
        merged
    }

    /// Adopts a remote value as authoritative and moves to `Reconciled`.
    pub fn reconcile(&self, remote: UserSettings) -> UserSettings {
        let adopted = remote.with_defaults();
        let previous_theme = {
            let mut inner = self.write_inner();
            let previous_theme = inner.settings.theme;
            inner.settings = adopted.clone();
            inner.state = SyncState::Reconciled;
            previous_theme
        };

        self.persist(&adopted);
        if adopted.theme != previous_theme {
            self.theme.apply_theme(adopted.theme);
        }
        tracing::info!(theme = adopted.theme.as_str(), "settings reconciled with remote");
        adopted
    }

    /// Fetches the remote settings and adopts them.
    ///
    /// An empty reply leaves the working copy as it is. On failure the
    /// working copy and state are untouched and the error is returned for
    /// the caller to show; it is safe to ignore.
    pub async fn refresh<R: SettingsRemote>(&self, remote: &R) -> Result<UserSettings, ApiError> {
        match remote.fetch_settings().await {
            Ok(Some(settings)) => Ok(self.reconcile(settings)),
            Ok(None) => {
                tracing::warn!(
                    state = ?self.state(),
                    "server sent no settings, keeping local value"
                );
                Ok(self.current())
            }
            Err(e) => {
                tracing::warn!(
                    state = ?self.state(),
                    code = ?e.code,
                    "settings fetch failed, keeping local value: {}",
                    e.message
                );
                Err(e)
            }
        }
    }

    /// Optimistic write: applies `patch` locally, then sends it.
    ///
    /// On success the server's echo is adopted like a refresh; an empty echo
    /// keeps the local merge. If the remote rejects it, the previous working
    /// copy is restored (cache and theme included) and the error is returned.
    pub async fn save_settings<R: SettingsRemote>(
        &self,
        remote: &R,
        patch: &SettingsPatch,
    ) -> Result<UserSettings, ApiError> {
        let snapshot = self.current();
        let merged = self.update_settings(patch);

        match remote.push_settings(patch).await {
            Ok(Some(echoed)) => {
                let adopted = self.reconcile(echoed);
                if adopted != merged {
                    tracing::debug!(?merged, ?adopted, "server echo differs from local merge");
                }
                Ok(adopted)
            }
            Ok(None) => {
                tracing::debug!("server accepted settings without an echo; keeping local merge");
                self.write_inner().state = SyncState::Reconciled;
                Ok(merged)
            }
            Err(e) => {
                tracing::warn!(code = ?e.code, "settings save failed, reverting: {}", e.message);
                self.restore(snapshot);
                Err(e)
            }
        }
    }

    fn restore(&self, snapshot: UserSettings) {
        let previous_theme = {
            let mut inner = self.write_inner();
            let previous_theme = inner.settings.theme;
            inner.settings = snapshot.clone();
            previous_theme
        };

        self.persist(&snapshot);
        if snapshot.theme != previous_theme {
            self.theme.apply_theme(snapshot.theme);
        }
    }

    fn read_cache(&self) -> Option<UserSettings> {
        let raw = match self.storage.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("no cached settings; using defaults");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "settings cache unreadable, using defaults");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => {
                tracing::debug!("loaded settings from cache");
                Some(settings)
            }
            Err(e) => {
                tracing::warn!(error = %e, "cached settings did not parse, using defaults");
                None
            }
        }
    }

    fn persist(&self, settings: &UserSettings) {
        let json = match serde_json::to_string(settings) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize settings");
                return;
            }
        };

        match self.storage.write(&json) {
            Ok(()) => tracing::debug!("settings cache written"),
            Err(e) => tracing::warn!(error = %e, "settings cache write failed"),
        }
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
