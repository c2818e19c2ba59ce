//! User settings as stored remotely and in the local cache.
//!
//! Sub-object fields are optional on the wire: a patch replaces a whole
//! sub-object, so a caller that sends `{"notifications": {"enabled": false}}`
//! leaves `pushEnabled` absent. Readers go through the effective-value
//! accessors, which fall back to the compiled-in defaults.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_WARNING_PPM: f64 = 600.0;
pub const DEFAULT_DANGER_PPM: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Area,
    Bar,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme `{}`; expected dark|light", other)),
        }
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "area" => Ok(ChartType::Area),
            "bar" => Ok(ChartType::Bar),
            other => Err(format!("unknown chart type `{}`; expected area|bar", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notifications {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_enabled: Option<bool>,
}

impl Notifications {
    pub fn new(enabled: bool, push_enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            push_enabled: Some(push_enabled),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danger: Option<f64>,
}

/// Rejected threshold write. Messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("Warning level must be below danger level ({danger} ppm)")]
    WarningNotBelowDanger { warning: f64, danger: f64 },
    #[error("Thresholds must be positive numbers")]
    NotPositive,
}

impl Thresholds {
    pub fn new(warning: f64, danger: f64) -> Self {
        Self {
            warning: Some(warning),
            danger: Some(danger),
        }
    }

    /// Effective (warning, danger) pair; absent values use the defaults.
    pub fn limits(&self) -> (f64, f64) {
        (
            self.warning.unwrap_or(DEFAULT_WARNING_PPM),
            self.danger.unwrap_or(DEFAULT_DANGER_PPM),
        )
    }

    /// Checks `warning < danger` on the effective values.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let (warning, danger) = self.limits();
        if !(warning.is_finite() && danger.is_finite()) || warning <= 0.0 || danger <= 0.0 {
            return Err(ThresholdError::NotPositive);
        }
        if warning >= danger {
            return Err(ThresholdError::WarningNotBelowDanger { warning, danger });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default)]
    pub notifications: Notifications,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notifications: Notifications::new(true, false),
            thresholds: Thresholds::new(DEFAULT_WARNING_PPM, DEFAULT_DANGER_PPM),
            theme: Theme::Dark,
            chart_type: Some(ChartType::Area),
        }
    }
}

impl UserSettings {
    /// Fills every absent field from the compiled-in defaults.
    ///
    /// A threshold pair that ends up out of order (say a lone remote
    /// `warning: 1200` next to the default danger of 1000) is replaced by
    /// the default pair.
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        let n = &mut self.notifications;
        n.enabled = n.enabled.or(defaults.notifications.enabled);
        n.push_enabled = n.push_enabled.or(defaults.notifications.push_enabled);
        let t = &mut self.thresholds;
        t.warning = t.warning.or(defaults.thresholds.warning);
        t.danger = t.danger.or(defaults.thresholds.danger);
        if let Err(e) = t.validate() {
            tracing::warn!(
                warning = ?t.warning,
                danger = ?t.danger,
                "{}; using default thresholds",
                e
            );
            *t = defaults.thresholds;
        }
        self.chart_type = self.chart_type.or(defaults.chart_type);
        self
    }

    /// Shallow merge: every top-level key present in `patch` replaces the
    /// current value wholesale, including nested objects.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(notifications) = patch.notifications {
            self.notifications = notifications;
        }
        if let Some(thresholds) = patch.thresholds {
            self.thresholds = thresholds;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(chart_type) = patch.chart_type {
            self.chart_type = Some(chart_type);
        }
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications.enabled.unwrap_or(true)
    }

    pub fn push_enabled(&self) -> bool {
        self.notifications.push_enabled.unwrap_or(false)
    }

    pub fn limits(&self) -> (f64, f64) {
        self.thresholds.limits()
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type.unwrap_or_default()
    }
}

/// A settings document as the server sends it: every top-level object is
/// required, `chartType` stays optional. Nested fields may still be absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDocument {
    pub notifications: Notifications,
    pub thresholds: Thresholds,
    pub theme: Theme,
    #[serde(default)]
    pub chart_type: Option<ChartType>,
}

impl From<SettingsDocument> for UserSettings {
    fn from(doc: SettingsDocument) -> Self {
        Self {
            notifications: doc.notifications,
            thresholds: doc.thresholds,
            theme: doc.theme,
            chart_type: doc.chart_type,
        }
    }
}

/// Partial update: only the top-level keys that are `Some` are sent / merged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Notifications>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
}

impl SettingsPatch {
    pub fn theme(theme: Theme) -> Self {
        Self {
            theme: Some(theme),
            ..Self::default()
        }
    }

    pub fn notifications(notifications: Notifications) -> Self {
        Self {
            notifications: Some(notifications),
            ..Self::default()
        }
    }

    pub fn thresholds(thresholds: Thresholds) -> Self {
        Self {
            thresholds: Some(thresholds),
            ..Self::default()
        }
    }

    pub fn chart_type(chart_type: ChartType) -> Self {
        Self {
            chart_type: Some(chart_type),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_wire_shape() {
        let value = serde_json::to_value(UserSettings::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "notifications": {"enabled": true, "pushEnabled": false},
                "thresholds": {"warning": 600.0, "danger": 1000.0},
                "theme": "dark",
                "chartType": "area"
            })
        );
    }

    #[test]
    fn json_round_trip_preserves_settings() {
        let samples = [
            UserSettings::default(),
            UserSettings {
                notifications: Notifications { enabled: Some(false), push_enabled: None },
                thresholds: Thresholds::new(450.0, 1800.5),
                theme: Theme::Light,
                chart_type: None,
            },
            UserSettings {
                notifications: Notifications::default(),
                thresholds: Thresholds { warning: None, danger: Some(1200.0) },
                theme: Theme::Dark,
                chart_type: Some(ChartType::Bar),
            },
        ];

        for settings in samples {
            let text = serde_json::to_string(&settings).unwrap();
            let back: UserSettings = serde_json::from_str(&text).unwrap();
            assert_eq!(back, settings);
        }
    }

    #[test]
    fn missing_chart_type_reads_as_area() {
        let settings: UserSettings = serde_json::from_value(json!({
            "notifications": {"enabled": true, "pushEnabled": true},
            "thresholds": {"warning": 700, "danger": 1100},
            "theme": "light"
        }))
        .unwrap();
        assert_eq!(settings.chart_type, None);
        assert_eq!(settings.chart_type(), ChartType::Area);
        assert_eq!(settings.limits(), (700.0, 1100.0));
    }

    #[test]
    fn with_defaults_fills_only_missing_fields() {
        let partial: UserSettings = serde_json::from_value(json!({
            "notifications": {"pushEnabled": true},
            "theme": "light"
        }))
        .unwrap();

        let filled = partial.with_defaults();
        assert_eq!(filled.notifications, Notifications::new(true, true));
        assert_eq!(filled.thresholds, Thresholds::new(600.0, 1000.0));
        assert_eq!(filled.theme, Theme::Light);
        assert_eq!(filled.chart_type, Some(ChartType::Area));
    }

    #[test]
    fn with_defaults_never_leaves_thresholds_out_of_order() {
        let lone_warning = UserSettings {
            thresholds: Thresholds { warning: Some(1200.0), danger: None },
            ..UserSettings::default()
        };
        assert_eq!(lone_warning.with_defaults().thresholds, Thresholds::new(600.0, 1000.0));

        let lone_danger = UserSettings {
            thresholds: Thresholds { warning: None, danger: Some(500.0) },
            ..UserSettings::default()
        };
        assert_eq!(lone_danger.with_defaults().thresholds, Thresholds::new(600.0, 1000.0));

        // an ordered partial pair is completed, not replaced
        let ordered = UserSettings {
            thresholds: Thresholds { warning: Some(800.0), danger: None },
            ..UserSettings::default()
        };
        assert_eq!(ordered.with_defaults().thresholds, Thresholds::new(800.0, 1000.0));
    }

    #[test]
    fn settings_document_requires_top_level_objects() {
        let doc: SettingsDocument = serde_json::from_value(json!({
            "notifications": {"enabled": false},
            "thresholds": {"warning": 700, "danger": 1100},
            "theme": "light"
        }))
        .unwrap();
        let settings = UserSettings::from(doc);
        assert_eq!(settings.notifications.push_enabled, None);
        assert_eq!(settings.chart_type, None);
        assert_eq!(settings.theme, Theme::Light);

        assert!(serde_json::from_value::<SettingsDocument>(json!({})).is_err());
        assert!(serde_json::from_value::<SettingsDocument>(json!({"theme": "light"})).is_err());
    }

    #[test]
    fn apply_replaces_nested_objects_wholesale() {
        let mut settings = UserSettings {
            notifications: Notifications::new(true, true),
            ..UserSettings::default()
        };
        settings.apply(&SettingsPatch::notifications(Notifications {
            enabled: Some(false),
            push_enabled: None,
        }));

        assert_eq!(settings.notifications.enabled, Some(false));
        assert_eq!(settings.notifications.push_enabled, None);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn patch_serializes_only_present_keys() {
        let patch = SettingsPatch::theme(Theme::Light);
        assert_eq!(serde_json::to_value(patch).unwrap(), json!({"theme": "light"}));
        assert!(SettingsPatch::default().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn threshold_validation() {
        assert!(Thresholds::new(600.0, 1000.0).validate().is_ok());
        assert_eq!(
            Thresholds::new(1000.0, 1000.0).validate(),
            Err(ThresholdError::WarningNotBelowDanger { warning: 1000.0, danger: 1000.0 })
        );
        assert_eq!(Thresholds::new(-5.0, 1000.0).validate(), Err(ThresholdError::NotPositive));

        // absent danger falls back to 1000
        let err = Thresholds { warning: Some(1200.0), danger: None }.validate().unwrap_err();
        assert_eq!(err.to_string(), "Warning level must be below danger level (1000 ppm)");
    }

    #[test]
    fn theme_toggle() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled().as_str(), "dark");
    }
}
