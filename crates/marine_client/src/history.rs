//! Historical wind archive with wind-derived wave context.
//!
//! Advisory only: failures produce an "unavailable" result instead of an error.

use chrono::{Duration, NaiveDate};
use common::{fields, Location, Provenance, SeriesBag};
use serde::{Deserialize, Serialize};

use crate::estimate::{estimate_wave_height, kmh_to_ms};

/// Hard cap on the archive window.
pub const MAX_HISTORY_DAYS: u32 = 92;
/// Windows longer than this work but are slow and rarely useful for trend context.
pub const RECOMMENDED_HISTORY_DAYS: u32 = 7;

/// Archive window ending yesterday: `(start, end)` inclusive, `days` clamped to `1..=92`.
pub fn history_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let days = days.clamp(1, MAX_HISTORY_DAYS);
    let end = today - Duration::days(1);
    let start = end - Duration::days(i64::from(days) - 1);
    (start, end)
}

/// Aggregates over the archive window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSummary {
    pub samples: usize,
    pub mean_wind_speed: Option<f64>,
    pub max_wind_speed: Option<f64>,
    pub mean_estimated_wave_height: Option<f64>,
    pub max_estimated_wave_height: Option<f64>,
    pub mean_surface_pressure: Option<f64>,
}

/// Result of a historical lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalData {
    pub available: bool,
    pub provenance: Provenance,
    pub location: Location,
    pub days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Archive series plus `estimated_wave_height`.
    pub hourly: SeriesBag,
    pub summary: Option<HistoricalSummary>,
    /// Why the data is unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HistoricalData {
    pub fn unavailable(
        location: Location,
        days: u32,
        window: (NaiveDate, NaiveDate),
        reason: impl Into<String>,
    ) -> Self {
        Self {
            available: false,
            provenance: Provenance::ArchiveEstimate,
            location,
            days,
            start_date: window.0,
            end_date: window.1,
            hourly: SeriesBag::default(),
            summary: None,
            message: Some(reason.into()),
        }
    }

    /// Attach wave estimates to an archive bag and summarize it.
    pub fn from_archive(
        location: Location,
        days: u32,
        window: (NaiveDate, NaiveDate),
        mut hourly: SeriesBag,
    ) -> Self {
        let estimated: Vec<Option<f64>> = (0..hourly.len())
            .map(|idx| {
                hourly
                    .value(fields::WIND_SPEED, idx)
                    .map(|kmh| estimate_wave_height(kmh_to_ms(kmh)))
            })
            .collect();
        hourly.insert(fields::ESTIMATED_WAVE_HEIGHT, estimated);

        let summary = summarize(&hourly);
        Self {
            available: true,
            provenance: Provenance::ArchiveEstimate,
            location,
            days,
            start_date: window.0,
            end_date: window.1,
            hourly,
            summary: Some(summary),
            message: None,
        }
    }
}

fn present(bag: &SeriesBag, name: &str) -> Vec<f64> {
    bag.get(name)
        .map(|values| values.iter().flatten().copied().filter(|v| !v.is_nan()).collect())
        .unwrap_or_default()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn summarize(hourly: &SeriesBag) -> HistoricalSummary {
    let wind = present(hourly, fields::WIND_SPEED);
    let waves = present(hourly, fields::ESTIMATED_WAVE_HEIGHT);
    let pressure = present(hourly, fields::SURFACE_PRESSURE);

    HistoricalSummary {
        samples: hourly.len(),
        mean_wind_speed: mean(&wind),
        max_wind_speed: max(&wind),
        mean_estimated_wave_height: mean(&waves),
        max_estimated_wave_height: max(&waves),
        mean_surface_pressure: mean(&pressure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_window_clamps_days() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

        let (start, end) = history_window(today, 7);
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());

        let (start, end) = history_window(today, 500);
        assert_eq!((end - start).num_days() + 1, 92);

        let (start, end) = history_window(today, 0);
        assert_eq!(start, end);
    }

    #[test]
    fn test_from_archive_estimates_and_summarizes() {
        let mut bag = SeriesBag::new(vec![
            "2026-03-09T00:00".into(),
            "2026-03-09T01:00".into(),
            "2026-03-09T02:00".into(),
        ]);
        bag.insert(fields::WIND_SPEED, vec![Some(36.0), None, Some(7.2)]);
        bag.insert(fields::SURFACE_PRESSURE, vec![Some(1010.0), Some(1012.0), None]);

        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let data = HistoricalData::from_archive(
            Location::default(),
            1,
            history_window(today, 1),
            bag,
        );

        assert!(data.available);
        assert_eq!(data.hourly.value(fields::ESTIMATED_WAVE_HEIGHT, 0), Some(1.5));
        assert_eq!(data.hourly.value(fields::ESTIMATED_WAVE_HEIGHT, 1), None);

        let summary = data.summary.expect("summary");
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.max_wind_speed, Some(36.0));
        assert!((summary.mean_wind_speed.unwrap() - 21.6).abs() < 1e-9);
        assert_eq!(summary.max_estimated_wave_height, Some(1.5));
        assert_eq!(summary.mean_surface_pressure, Some(1011.0));
    }

    #[test]
    fn test_unavailable_carries_reason() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let data = HistoricalData::unavailable(
            Location::default(),
            3,
            history_window(today, 3),
            "archive down",
        );
        assert!(!data.available);
        assert!(data.summary.is_none());
        assert_eq!(data.message.as_deref(), Some("archive down"));
    }
}
