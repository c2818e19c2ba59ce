//! ==============================================================================
//! aqms - air quality monitor dashboard core
//! ==============================================================================
//!
//! purpose:
//!     everything the dashboard needs between its screens and the remote AQMS
//!     api: typed endpoint access, envelope normalization, and the settings
//!     store that reconciles the local cache with the server.
//!
//! layout:
//!
//! ```text
//!     ┌──────────────┐   reads / updates   ┌──────────────────┐
//!     │  main.rs     │ ──────────────────> │ settings::       │
//!     │  (terminal   │                     │   SettingsStore  │
//!     │   dashboard) │ ──┐                 └────────┬─────────┘
//!     └──────────────┘   │                          │ SettingsRemote
//!                        │   fetches                ▼
//!                        └──────────────────> api::AqmsService
//!                                                   │
//!                                        api::normalize (envelope rules)
//!                                                   │
//!                                             remote REST api
//! ```
//!
//! ==============================================================================

pub mod aggregate;
pub mod api;
pub mod config;
pub mod dates;
pub mod domain;
pub mod logging;
pub mod settings;
pub mod status;

pub use api::{ApiClient, ApiError, AqmsService, SettingsRemote};
pub use config::DashboardConfig;
pub use settings::{SettingsPatch, SettingsStore, UserSettings};
