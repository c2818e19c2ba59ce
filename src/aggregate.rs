//! Client-side aggregation over readings already returned by the api.

use std::collections::BTreeMap;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use crate::domain::{HistoryItem, SensorData, StatusFilter};

/// Mean of each metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub co2: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub samples: usize,
}

/// `None` when `readings` is empty.
pub fn average(readings: &[SensorData]) -> Option<Averages> {
    if readings.is_empty() {
        return None;
    }

    let n = readings.len() as f64;
    let (co2, temperature, humidity) = readings.iter().fold((0.0, 0.0, 0.0), |acc, r| {
        (acc.0 + r.co2, acc.1 + r.temperature, acc.2 + r.humidity)
    });

    Some(Averages {
        co2: co2 / n,
        temperature: temperature / n,
        humidity: humidity / n,
        samples: readings.len(),
    })
}

/// One hour of readings collapsed to its means.
#[derive(Debug, Clone, PartialEq)]
pub struct HourBucket {
    pub hour: DateTime<Utc>,
    pub averages: Averages,
}

/// Groups readings by the UTC hour they fall in, oldest first.
///
/// Readings whose timestamp does not parse are skipped.
pub fn hourly_buckets(readings: &[SensorData]) -> Vec<HourBucket> {
    let mut groups: BTreeMap<DateTime<Utc>, Vec<SensorData>> = BTreeMap::new();

    for reading in readings {
        let Ok(at) = DateTime::parse_from_rfc3339(&reading.timestamp) else {
            tracing::debug!(timestamp = %reading.timestamp, "skipping reading with bad timestamp");
            continue;
        };
        let Ok(hour) = at.with_timezone(&Utc).duration_trunc(TimeDelta::hours(1)) else {
            continue;
        };
        groups.entry(hour).or_default().push(reading.clone());
    }

    groups
        .into_iter()
        .filter_map(|(hour, rows)| average(&rows).map(|averages| HourBucket { hour, averages }))
        .collect()
}

/// History rows matching `filter`, order preserved.
pub fn filter_by_status(items: &[HistoryItem], filter: StatusFilter) -> Vec<HistoryItem> {
    items
        .iter()
        .filter(|item| filter.matches(item.status))
        .cloned()
        .collect()
}
