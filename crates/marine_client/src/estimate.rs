//! Wind-based wave estimation.
//!
//! Used when a point lies outside direct marine-model coverage and for the
//! historical feed, which only carries wind. Heights follow a Beaufort-style
//! step function of wind speed; periods use the fully-developed-sea
//! approximation `T ≈ 3.5·√H`.

use std::collections::HashMap;

use chrono::NaiveDate;
use common::{fields, SeriesBag};

/// Upper wind bound (m/s, exclusive) and the wave height (m) for speeds below it.
const WIND_WAVE_STEPS: [(f64, f64); 9] = [
    (2.0, 0.1),
    (4.0, 0.2),
    (6.0, 0.6),
    (8.0, 1.0),
    (11.0, 1.5),
    (14.0, 2.0),
    (17.0, 2.5),
    (21.0, 3.25),
    (25.0, 4.0),
];
const STORM_WAVE_HEIGHT: f64 = 5.0;

const PERIOD_COEFFICIENT: f64 = 3.5;
const WIND_WAVE_SHARE: f64 = 0.7;
const SWELL_SHARE: f64 = 0.3;

pub fn kmh_to_ms(kmh: f64) -> f64 {
    kmh / 3.6
}

/// Estimated significant wave height (m) for a wind speed in m/s.
///
/// Monotonic non-decreasing; NaN and negative speeds count as calm.
pub fn estimate_wave_height(wind_ms: f64) -> f64 {
    let wind_ms = if wind_ms.is_nan() { 0.0 } else { wind_ms };
    WIND_WAVE_STEPS
        .iter()
        .find(|(limit, _)| wind_ms < *limit)
        .map(|(_, height)| *height)
        .unwrap_or(STORM_WAVE_HEIGHT)
}

/// Estimated wave period (s) for a wave height (m).
pub fn estimate_wave_period(height_m: f64) -> f64 {
    PERIOD_COEFFICIENT * height_m.max(0.0).sqrt()
}

/// Wave state synthesized from one wind reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveEstimate {
    pub height: f64,
    pub period: f64,
    pub wind_wave_height: f64,
    pub wind_wave_period: f64,
    pub swell_height: f64,
    pub swell_period: f64,
}

pub fn estimate_from_wind_kmh(wind_kmh: f64) -> WaveEstimate {
    let height = estimate_wave_height(kmh_to_ms(wind_kmh));
    let wind_wave_height = height * WIND_WAVE_SHARE;
    let swell_height = height * SWELL_SHARE;

    WaveEstimate {
        height,
        period: estimate_wave_period(height),
        wind_wave_height,
        wind_wave_period: estimate_wave_period(wind_wave_height),
        swell_height,
        swell_period: estimate_wave_period(swell_height),
    }
}

/// Build a marine-shaped hourly bag from an atmospheric one.
///
/// Hours without a wind reading get null estimates. Wave direction follows
/// the wind direction.
pub fn synthesize_marine_hourly(weather: &SeriesBag) -> SeriesBag {
    let rows = weather.len();
    let estimates: Vec<Option<WaveEstimate>> = (0..rows)
        .map(|idx| weather.value(fields::WIND_SPEED, idx).map(estimate_from_wind_kmh))
        .collect();

    let column = |pick: fn(&WaveEstimate) -> f64| -> Vec<Option<f64>> {
        estimates.iter().map(|e| e.as_ref().map(pick)).collect()
    };

    let mut bag = SeriesBag::new(weather.time.clone());
    bag.insert(fields::WAVE_HEIGHT, column(|e| e.height));
    bag.insert(fields::WAVE_PERIOD, column(|e| e.period));
    bag.insert(fields::WIND_WAVE_HEIGHT, column(|e| e.wind_wave_height));
    bag.insert(fields::WIND_WAVE_PERIOD, column(|e| e.wind_wave_period));
    bag.insert(fields::SWELL_WAVE_HEIGHT, column(|e| e.swell_height));
    bag.insert(fields::SWELL_WAVE_PERIOD, column(|e| e.swell_period));
    bag.insert(
        fields::WAVE_DIRECTION,
        (0..rows)
            .map(|idx| weather.value(fields::WIND_DIRECTION, idx))
            .collect(),
    );
    bag
}

// ── Daily Aggregation ─────────────────────────────────────────────────

/// Picks one direction (degrees) to represent a day's hourly directions.
pub type DominantDirectionFn = fn(&[Option<f64>]) -> Option<f64>;

/// The day's first hourly direction, even when later hours disagree.
///
/// This is what the daily fallback has always reported; see
/// [`modal_direction`] for a frequency-based alternative.
pub fn first_sample_direction(values: &[Option<f64>]) -> Option<f64> {
    values.first().copied().flatten()
}

/// Centre of the most frequent 45° compass sector; ties go to the sector seen first.
pub fn modal_direction(values: &[Option<f64>]) -> Option<f64> {
    let mut counts: HashMap<u32, (usize, usize)> = HashMap::new();
    for (order, deg) in values.iter().flatten().enumerate() {
        let sector = ((deg.rem_euclid(360.0) + 22.5) / 45.0).floor() as u32 % 8;
        let slot = counts.entry(sector).or_insert((0, order));
        slot.0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(sector, _)| sector as f64 * 45.0)
}

const DAILY_MAXIMA: [(&str, &str); 4] = [
    (fields::WAVE_HEIGHT, fields::WAVE_HEIGHT_MAX),
    (fields::WAVE_PERIOD, fields::WAVE_PERIOD_MAX),
    (fields::WIND_WAVE_HEIGHT, fields::WIND_WAVE_HEIGHT_MAX),
    (fields::SWELL_WAVE_HEIGHT, fields::SWELL_WAVE_HEIGHT_MAX),
];

/// Group hourly rows by calendar date and reduce each day.
///
/// Each field becomes its daily maximum (null when the whole day is null);
/// direction is reduced with `dominant`. Rows without a parseable timestamp
/// are skipped.
pub fn aggregate_daily(hourly: &SeriesBag, dominant: DominantDirectionFn) -> SeriesBag {
    let mut days: Vec<(NaiveDate, Vec<usize>)> = Vec::new();
    for idx in 0..hourly.len() {
        let Some(date) = hourly.timestamp(idx).map(|ts| ts.date()) else {
            continue;
        };
        match days.last_mut() {
            Some((day, rows)) if *day == date => rows.push(idx),
            _ => days.push((date, vec![idx])),
        }
    }

    let mut daily = SeriesBag::new(
        days.iter()
            .map(|(date, _)| date.format("%Y-%m-%d").to_string())
            .collect(),
    );

    for (source, target) in DAILY_MAXIMA {
        let maxima = days
            .iter()
            .map(|(_, rows)| {
                rows.iter()
                    .filter_map(|&idx| hourly.value(source, idx))
                    .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
            })
            .collect();
        daily.insert(target, maxima);
    }

    let directions = days
        .iter()
        .map(|(_, rows)| {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|&idx| hourly.value(fields::WAVE_DIRECTION, idx))
                .collect();
            dominant(&values)
        })
        .collect();
    daily.insert(fields::WAVE_DIRECTION_DOMINANT, directions);

    daily
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_bag(winds_kmh: &[Option<f64>], dirs: &[Option<f64>]) -> SeriesBag {
        let time = (0..winds_kmh.len())
            .map(|h| format!("2026-02-{:02}T{:02}:00", 13 + h / 24, h % 24))
            .collect();
        let mut bag = SeriesBag::new(time);
        bag.insert(fields::WIND_SPEED, winds_kmh.to_vec());
        bag.insert(fields::WIND_DIRECTION, dirs.to_vec());
        bag
    }

    #[test]
    fn test_wave_height_monotonic_in_wind() {
        let mut previous = estimate_wave_height(0.0);
        for step in 0..=400 {
            let wind = step as f64 * 0.1;
            let height = estimate_wave_height(wind);
            assert!(
                height >= previous,
                "height dropped from {} to {} at {} m/s",
                previous,
                height,
                wind
            );
            previous = height;
        }
    }

    #[test]
    fn test_wave_height_step_edges() {
        assert_eq!(estimate_wave_height(0.0), 0.1);
        assert_eq!(estimate_wave_height(1.99), 0.1);
        assert_eq!(estimate_wave_height(2.0), 0.2);
        assert_eq!(estimate_wave_height(10.9), 1.5);
        assert_eq!(estimate_wave_height(24.9), 4.0);
        assert_eq!(estimate_wave_height(25.0), 5.0);
        assert_eq!(estimate_wave_height(60.0), 5.0);
        assert_eq!(estimate_wave_height(-3.0), 0.1);
        assert_eq!(estimate_wave_height(f64::NAN), 0.1);
    }

    #[test]
    fn test_estimate_components_split_70_30() {
        // 36 km/h = 10 m/s → 1.5 m
        let est = estimate_from_wind_kmh(36.0);
        assert!((est.height - 1.5).abs() < 1e-9);
        assert!((est.period - 3.5 * 1.5f64.sqrt()).abs() < 1e-9);
        assert!((est.wind_wave_height - 1.05).abs() < 1e-9);
        assert!((est.swell_height - 0.45).abs() < 1e-9);
        assert!((est.swell_period - 3.5 * 0.45f64.sqrt()).abs() < 1e-9);
        assert!(est.wind_wave_period > est.swell_period);
    }

    #[test]
    fn test_synthesize_keeps_nulls_and_uses_wind_direction() {
        let weather = weather_bag(&[Some(36.0), None], &[Some(90.0), Some(180.0)]);
        let marine = synthesize_marine_hourly(&weather);

        assert_eq!(marine.time, weather.time);
        assert_eq!(marine.value(fields::WAVE_HEIGHT, 0), Some(1.5));
        assert_eq!(marine.value(fields::WAVE_HEIGHT, 1), None);
        assert_eq!(marine.value(fields::WAVE_DIRECTION, 1), Some(180.0));
    }

    #[test]
    fn test_aggregate_daily_groups_by_date() {
        let mut winds = vec![Some(10.0); 24];
        winds[5] = Some(50.0); // 13.9 m/s → 2.0 m
        winds.extend(vec![Some(5.0); 3]);
        winds.push(None);
        let mut dirs = vec![Some(270.0); 24];
        dirs[0] = Some(10.0);
        dirs.extend(vec![None, Some(90.0), Some(90.0), Some(90.0)]);

        let marine = synthesize_marine_hourly(&weather_bag(&winds, &dirs));
        let daily = aggregate_daily(&marine, first_sample_direction);

        assert_eq!(daily.time, vec!["2026-02-13", "2026-02-14"]);
        assert_eq!(daily.value(fields::WAVE_HEIGHT_MAX, 0), Some(2.0));
        assert_eq!(daily.value(fields::WAVE_HEIGHT_MAX, 1), Some(0.1));
        assert_eq!(daily.value(fields::WAVE_DIRECTION_DOMINANT, 0), Some(10.0));
        assert_eq!(
            daily.value(fields::WAVE_DIRECTION_DOMINANT, 1),
            None,
            "first sample of the day is null"
        );
    }

    #[test]
    fn test_modal_direction_picks_most_frequent_sector() {
        let values = [Some(10.0), Some(270.0), Some(265.0), None, Some(280.0)];
        assert_eq!(modal_direction(&values), Some(270.0));
        assert_eq!(modal_direction(&[Some(350.0), Some(5.0)]), Some(0.0));
        assert_eq!(modal_direction(&[None, None]), None);
    }

    #[test]
    fn test_modal_direction_tie_prefers_first_seen() {
        let values = [Some(90.0), Some(180.0), Some(180.0), Some(90.0)];
        assert_eq!(modal_direction(&values), Some(90.0));
    }

    #[test]
    fn test_aggregate_daily_with_modal_policy() {
        let dirs = [Some(10.0), Some(270.0), Some(270.0)];
        let marine = synthesize_marine_hourly(&weather_bag(&[Some(5.0); 3], &dirs));
        let daily = aggregate_daily(&marine, modal_direction);
        assert_eq!(daily.value(fields::WAVE_DIRECTION_DOMINANT, 0), Some(270.0));
    }
}
