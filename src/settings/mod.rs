//! User settings: model, local cache, theme side effect, and the store that
//! reconciles the cache with the remote settings endpoint.

mod model;
mod storage;
mod store;
mod theme;

pub use model::{
    ChartType, Notifications, SettingsDocument, SettingsPatch, Theme, ThresholdError, Thresholds,
    UserSettings, DEFAULT_DANGER_PPM, DEFAULT_WARNING_PPM,
};
pub use storage::{FileStorage, MemoryStorage, SettingsStorage, StorageError, SETTINGS_KEY};
pub use store::{SettingsStore, SyncState};
pub use theme::{NoTheme, ThemeSink};
