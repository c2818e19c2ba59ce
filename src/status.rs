//! ==============================================================================
//! status.rs - co2 classification against the user's thresholds
//! ==============================================================================
//!
//! the api already classifies readings with its own cutoffs; the dashboard
//! re-classifies locally so the user's thresholds win.
//!
//! ==============================================================================

use crate::domain::Status;
use crate::settings::UserSettings;

/// `co2 < warning` safe, `co2 < danger` warning, otherwise danger.
pub fn classify(co2: f64, warning: f64, danger: f64) -> Status {
    if co2 < warning {
        Status::Safe
    } else if co2 < danger {
        Status::Warning
    } else {
        Status::Danger
    }
}

/// Classifies with the effective thresholds from `settings`.
pub fn classify_with(co2: f64, settings: &UserSettings) -> Status {
    let (warning, danger) = settings.limits();
    classify(co2, warning, danger)
}

pub fn label(status: Status) -> &'static str {
    match status {
        Status::Safe => "Fresh Air",
        Status::Warning => "Moderate",
        Status::Danger => "Poor Quality",
    }
}

pub fn emoji(status: Status) -> &'static str {
    match status {
        Status::Safe => "🟢",
        Status::Warning => "🟡",
        Status::Danger => "🔴",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    Steady,
}

impl Trend {
    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Rising => "↗",
            Trend::Falling => "↘",
            Trend::Steady => "→",
        }
    }
}

/// More than 10% above `reference` is rising, more than 10% below is falling.
pub fn trend(current: f64, reference: f64) -> Trend {
    if current > reference * 1.1 {
        Trend::Rising
    } else if current < reference * 0.9 {
        Trend::Falling
    } else {
        Trend::Steady
    }
}
