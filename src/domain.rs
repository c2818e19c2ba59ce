//! ==============================================================================
//! domain.rs - sensor data types returned by the aqms api
//! ==============================================================================
//!
//! purpose:
//!     typed shapes for every payload the dashboard reads.
//!     wire names are camelCase; rust names are snake_case.
//!
//! relationships:
//!     - produced by: api/service.rs (after api/normalize.rs unwraps the envelope)
//!     - consumed by: status.rs, aggregate.rs, main.rs
//!
//! ==============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// air quality classification of a co2 reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Safe,
    Warning,
    Danger,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Safe => "safe",
            Status::Warning => "warning",
            Status::Danger => "danger",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// a single reading as reported by /latest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<String>,
    /// co2 in ppm
    pub co2: f64,
    /// temperature in celsius
    pub temperature: f64,
    /// relative humidity (0-100%)
    pub humidity: f64,
    /// iso 8601 timestamp
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

/// a reading with the server-side classification attached (/sensors/current)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<String>,
    pub co2: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: String,
    pub status: Status,
}

/// live window accepted by /sensors/range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiveRange {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "8h")]
    EightHours,
    #[serde(rename = "24h")]
    OneDay,
}

/// window accepted by /history/chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartRange {
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
}

/// bucket width accepted by /history/chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartInterval {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl LiveRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveRange::OneHour => "1h",
            LiveRange::EightHours => "8h",
            LiveRange::OneDay => "24h",
        }
    }
}

impl ChartRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "24h",
            ChartRange::SevenDays => "7d",
            ChartRange::ThirtyDays => "30d",
        }
    }
}

impl ChartInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartInterval::OneHour => "1h",
            ChartInterval::FourHours => "4h",
            ChartInterval::OneDay => "1d",
        }
    }
}

fn unknown(kind: &str, value: &str, expected: &str) -> String {
    format!("unknown {} `{}`; expected {}", kind, value, expected)
}

impl FromStr for LiveRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(LiveRange::OneHour),
            "8h" => Ok(LiveRange::EightHours),
            "24h" => Ok(LiveRange::OneDay),
            other => Err(unknown("range", other, "1h|8h|24h")),
        }
    }
}

impl FromStr for ChartRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(ChartRange::OneDay),
            "7d" => Ok(ChartRange::SevenDays),
            "30d" => Ok(ChartRange::ThirtyDays),
            other => Err(unknown("range", other, "24h|7d|30d")),
        }
    }
}

impl FromStr for ChartInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(ChartInterval::OneHour),
            "4h" => Ok(ChartInterval::FourHours),
            "1d" => Ok(ChartInterval::OneDay),
            other => Err(unknown("interval", other, "1h|4h|1d")),
        }
    }
}

/// readings inside a live window (metadata envelope: range + count)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRangeData {
    pub range: LiveRange,
    pub count: u64,
    pub data: Vec<SensorData>,
}

/// one row of the history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// the api sends numbers for some rows and strings for others
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub sensor_id: String,
    pub co2: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub status: Status,
    pub timestamp: String,
}

/// paginated history (metadata envelope: total + limit + offset)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub data: Vec<HistoryItem>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: String,
    pub co2: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub status: Status,
}

/// aggregated chart points (metadata envelope: range + interval)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub data: Vec<ChartPoint>,
    pub range: ChartRange,
    pub interval: ChartInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDistribution {
    pub safe: u64,
    pub warning: u64,
    pub danger: u64,
}

/// summary statistics (/history/stats)
///
/// the nested `count` is why this endpoint is decoded with an explicit
/// plain shape rather than by sniffing for metadata keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub count: u64,
    pub co2: MetricSummary,
    pub temperature: MetricSummary,
    pub humidity: MetricSummary,
    pub status_distribution: StatusDistribution,
}

/// status filter for the history view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Safe,
    Warning,
    Danger,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Safe => "safe",
            StatusFilter::Warning => "warning",
            StatusFilter::Danger => "danger",
        }
    }

    pub fn matches(&self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Safe => status == Status::Safe,
            StatusFilter::Warning => status == Status::Warning,
            StatusFilter::Danger => status == Status::Danger,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "safe" => Ok(StatusFilter::Safe),
            "warning" => Ok(StatusFilter::Warning),
            "danger" => Ok(StatusFilter::Danger),
            other => Err(unknown("status", other, "all|safe|warning|danger")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilters {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<StatusFilter>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(unknown("format", other, "csv|json")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportParams {
    pub format: ExportFormat,
    pub start_date: String,
    pub end_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn statistics_reads_camel_case_payload() {
        let stats: Statistics = serde_json::from_value(json!({
            "count": 12,
            "co2": {"min": 400.0, "max": 1200.0, "avg": 650.5},
            "temperature": {"min": 21.0, "max": 26.0, "avg": 23.4},
            "humidity": {"min": 40.0, "max": 60.0, "avg": 51.0},
            "statusDistribution": {"safe": 6, "warning": 4, "danger": 2}
        }))
        .unwrap();

        assert_eq!(stats.count, 12);
        assert_eq!(stats.status_distribution.danger, 2);
        assert_eq!(stats.co2.avg, 650.5);
    }

    #[test]
    fn history_item_accepts_numeric_and_string_ids() {
        let numeric: HistoryItem = serde_json::from_value(json!({
            "id": 7, "sensorId": "aq-1", "co2": 500, "temperature": 22.0,
            "humidity": 50, "status": "safe", "timestamp": "2024-01-15T14:30:00Z"
        }))
        .unwrap();
        let text: HistoryItem = serde_json::from_value(json!({
            "id": "abc", "sensorId": "aq-1", "co2": 500, "temperature": 22.0,
            "humidity": 50, "status": "danger", "timestamp": "2024-01-15T14:30:00Z"
        }))
        .unwrap();

        assert_eq!(numeric.id, Some(json!(7)));
        assert_eq!(text.id, Some(json!("abc")));
        assert_eq!(text.status, Status::Danger);
    }

    #[test]
    fn range_enums_use_wire_spelling() {
        assert_eq!(serde_json::to_value(LiveRange::EightHours).unwrap(), json!("8h"));
        assert_eq!(serde_json::to_value(ChartRange::SevenDays).unwrap(), json!("7d"));
        assert_eq!(serde_json::to_value(ChartInterval::OneDay).unwrap(), json!("1d"));
        assert_eq!(LiveRange::OneDay.as_str(), "24h");
    }

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("8h".parse::<LiveRange>(), Ok(LiveRange::EightHours));
        assert_eq!("30d".parse::<ChartRange>(), Ok(ChartRange::ThirtyDays));
        assert_eq!("4h".parse::<ChartInterval>(), Ok(ChartInterval::FourHours));
        assert_eq!("danger".parse::<StatusFilter>(), Ok(StatusFilter::Danger));
        assert_eq!("csv".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("2h".parse::<LiveRange>().unwrap_err().contains("1h|8h|24h"));
    }

    #[test]
    fn status_filter_all_matches_everything() {
        assert!(StatusFilter::All.matches(Status::Danger));
        assert!(StatusFilter::Warning.matches(Status::Warning));
        assert!(!StatusFilter::Safe.matches(Status::Warning));
    }
}
