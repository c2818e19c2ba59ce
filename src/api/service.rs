//! ==============================================================================
//! service.rs - one method per aqms endpoint
//! ==============================================================================
//!
//! purpose:
//!     the only place that knows endpoint paths, query names, and the envelope
//!     shape each endpoint responds with.
//!
//! relationships:
//!     - uses: client.rs (transport), normalize.rs (`Shape`)
//!     - used by: settings/store.rs (through `SettingsRemote`), main.rs
//!
//! ==============================================================================

use std::future::Future;

use serde_json::Value;

use crate::domain::{
    ChartInterval, ChartRange, ChartSeries, ExportParams, HistoryFilters, HistoryPage, LiveRange,
    SensorData, SensorRangeData, SensorStatus, Statistics,
};
use crate::settings::{SettingsDocument, SettingsPatch, UserSettings};

use super::client::ApiClient;
use super::error::ApiError;
use super::normalize::Shape;

const LATEST: &str = "/api/v1/aqms/latest";
const SENSORS_CURRENT: &str = "/api/v1/aqms/sensors/current";
const SENSORS_RANGE: &str = "/api/v1/aqms/sensors/range";
const HISTORY: &str = "/api/v1/aqms/history";
const HISTORY_CHART: &str = "/api/v1/aqms/history/chart";
const HISTORY_STATS: &str = "/api/v1/aqms/history/stats";
const HISTORY_EXPORT: &str = "/api/v1/aqms/history/export";
const SETTINGS: &str = "/api/v1/aqms/settings";

/// Remote side of the settings reconciler.
///
/// `Ok(None)` means the server answered without a settings document
/// (an empty body, `{}` or `null`). Implemented by `AqmsService`; tests
/// substitute an in-process fake.
pub trait SettingsRemote {
    fn fetch_settings(
        &self,
    ) -> impl Future<Output = Result<Option<UserSettings>, ApiError>> + Send;
    fn push_settings(
        &self,
        patch: &SettingsPatch,
    ) -> impl Future<Output = Result<Option<UserSettings>, ApiError>> + Send;
}

#[derive(Clone, Debug)]
pub struct AqmsService {
    client: ApiClient,
}

impl AqmsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// most recent input, no server-side classification guaranteed
    pub async fn latest(&self) -> Result<SensorData, ApiError> {
        self.client.get(LATEST, &[], Shape::Plain).await
    }

    /// current reading with safe/warning/danger attached
    pub async fn current_status(&self) -> Result<SensorStatus, ApiError> {
        self.client.get(SENSORS_CURRENT, &[], Shape::Plain).await
    }

    pub async fn sensor_range(&self, range: LiveRange) -> Result<SensorRangeData, ApiError> {
        let params = [("range", Some(range.as_str().to_string()))];
        self.client.get(SENSORS_RANGE, &params, Shape::WithMetadata).await
    }

    pub async fn history(&self, filters: &HistoryFilters) -> Result<HistoryPage, ApiError> {
        let params = [
            ("startDate", filters.start_date.clone()),
            ("endDate", filters.end_date.clone()),
            ("status", filters.status.map(|s| s.as_str().to_string())),
            ("limit", filters.limit.map(|n| n.to_string())),
            ("offset", filters.offset.map(|n| n.to_string())),
        ];
        self.client.get(HISTORY, &params, Shape::WithMetadata).await
    }

    /// aggregated points; the server picks the interval when `None`
    pub async fn chart(
        &self,
        range: ChartRange,
        interval: Option<ChartInterval>,
    ) -> Result<ChartSeries, ApiError> {
        let params = [
            ("range", Some(range.as_str().to_string())),
            ("interval", interval.map(|i| i.as_str().to_string())),
        ];
        self.client.get(HISTORY_CHART, &params, Shape::WithMetadata).await
    }

    pub async fn statistics(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Statistics, ApiError> {
        let params = [
            ("startDate", start_date.map(str::to_string)),
            ("endDate", end_date.map(str::to_string)),
        ];
        self.client.get(HISTORY_STATS, &params, Shape::Plain).await
    }

    /// raw csv / json file contents
    pub async fn export(&self, params: &ExportParams) -> Result<Vec<u8>, ApiError> {
        let query = [
            ("format", Some(params.format.as_str().to_string())),
            ("startDate", Some(params.start_date.clone())),
            ("endDate", Some(params.end_date.clone())),
        ];
        self.client.download(HISTORY_EXPORT, &query).await
    }

    /// `None` when the server answers without a settings document
    pub async fn settings(&self) -> Result<Option<UserSettings>, ApiError> {
        let body: Value = self.client.get(SETTINGS, &[], Shape::Plain).await?;
        settings_from_body(body)
    }

    /// The server's echo of the saved settings; `None` for an empty reply
    /// such as `204 No Content`.
    pub async fn update_settings(
        &self,
        patch: &SettingsPatch,
    ) -> Result<Option<UserSettings>, ApiError> {
        let body: Value = self.client.put(SETTINGS, patch, Shape::Plain).await?;
        settings_from_body(body)
    }
}

/// Empty bodies carry no settings. Anything else must be a full document.
fn settings_from_body(body: Value) -> Result<Option<UserSettings>, ApiError> {
    match &body {
        Value::Null => return Ok(None),
        Value::Object(obj) if obj.is_empty() => return Ok(None),
        _ => {}
    }

    serde_json::from_value::<SettingsDocument>(body)
        .map(|doc| Some(doc.into()))
        .map_err(|e| ApiError::decode(format!("settings document: {}", e)))
}

impl SettingsRemote for AqmsService {
    async fn fetch_settings(&self) -> Result<Option<UserSettings>, ApiError> {
        self.settings().await
    }

    async fn push_settings(&self, patch: &SettingsPatch) -> Result<Option<UserSettings>, ApiError> {
        self.update_settings(patch).await
    }
}
