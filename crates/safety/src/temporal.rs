//! Forecast horizon analysis: fixed-length periods, worst period, trend,
//! and the blended overall score.

use chrono::{Duration, NaiveDateTime};
use common::ForecastSample;
use serde::{Deserialize, Serialize};

use crate::aggregator::{assess_sample, round2, CompositeAssessment, ParameterEvaluations};
use crate::thresholds::ThresholdProfile;

/// Share of the overall score taken from current conditions.
pub const CURRENT_WEIGHT: f64 = 0.6;
/// Share taken from the mean of the period scores.
pub const FORECAST_WEIGHT: f64 = 0.4;
/// First-to-last period score delta beyond which the trend is not stable.
pub const TREND_DELTA: f64 = 10.0;

const CONFIDENCE_START: f64 = 100.0;
const CONFIDENCE_PER_UNKNOWN: f64 = 15.0;
const CONFIDENCE_DETERIORATING: f64 = 10.0;
const CONFIDENCE_FLOOR: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Deteriorating,
}

/// One fixed-length slice of the forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub index: usize,
    pub start: Option<NaiveDateTime>,
    /// Exclusive end: one hour past the last sample.
    pub end: Option<NaiveDateTime>,
    pub hours: usize,
    /// Averaged conditions over the period.
    pub conditions: ForecastSample,
    pub evaluations: ParameterEvaluations,
    pub assessment: CompositeAssessment,
}

/// Horizon analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalAnalysis {
    pub periods: Vec<ForecastPeriod>,
    pub worst_period: Option<ForecastPeriod>,
    pub trend: Trend,
    pub overall: CompositeAssessment,
}

fn field_mean<F>(samples: &[ForecastSample], field: F) -> f64
where
    F: Fn(&ForecastSample) -> Option<f64>,
{
    let present: Vec<f64> = samples
        .iter()
        .filter_map(&field)
        .filter(|v| !v.is_nan())
        .collect();
    if present.is_empty() {
        0.0
    } else {
        present.iter().sum::<f64>() / present.len() as f64
    }
}

/// Average every field over its non-null values. A field with no values in
/// the slice averages to 0, so every averaged field is present.
pub fn average_conditions(samples: &[ForecastSample]) -> ForecastSample {
    ForecastSample {
        timestamp: samples.first().and_then(|s| s.timestamp),
        wave_height: Some(field_mean(samples, |s| s.wave_height)),
        wave_period: Some(field_mean(samples, |s| s.wave_period)),
        wind_speed: Some(field_mean(samples, |s| s.wind_speed)),
        wind_gusts: Some(field_mean(samples, |s| s.wind_gusts)),
        visibility: Some(field_mean(samples, |s| s.visibility)),
        weather_code: Some(field_mean(samples, |s| s.weather_code.map(f64::from)).round() as i32),
        precipitation: Some(field_mean(samples, |s| s.precipitation)),
    }
}

/// Split up to `horizon_hours` samples into consecutive `period_hours` slices and score each.
pub fn build_periods(
    samples: &[ForecastSample],
    profile: &ThresholdProfile,
    period_hours: usize,
    horizon_hours: usize,
) -> Vec<ForecastPeriod> {
    let period_hours = period_hours.max(1);
    let horizon = samples.len().min(horizon_hours);

    samples[..horizon]
        .chunks(period_hours)
        .enumerate()
        .map(|(index, chunk)| {
            let conditions = average_conditions(chunk);
            let (evaluations, assessment) = assess_sample(&conditions, profile);
            let start = chunk.first().and_then(|s| s.timestamp);
            let end = chunk
                .last()
                .and_then(|s| s.timestamp)
                .map(|ts| ts + Duration::hours(1));
            ForecastPeriod {
                index,
                start,
                end,
                hours: chunk.len(),
                conditions,
                evaluations,
                assessment,
            }
        })
        .collect()
}

/// Lowest-scoring period; the earliest wins a tie.
pub fn worst_period(periods: &[ForecastPeriod]) -> Option<&ForecastPeriod> {
    periods.iter().reduce(|worst, period| {
        if period.assessment.score < worst.assessment.score {
            period
        } else {
            worst
        }
    })
}

/// Compare the first and last period scores.
pub fn trend(periods: &[ForecastPeriod]) -> Trend {
    let (Some(first), Some(last)) = (periods.first(), periods.last()) else {
        return Trend::Stable;
    };
    let delta = last.assessment.score - first.assessment.score;
    if delta > TREND_DELTA {
        Trend::Improving
    } else if delta < -TREND_DELTA {
        Trend::Deteriorating
    } else {
        Trend::Stable
    }
}

/// `0.6·current + 0.4·mean(periods)`; with no periods the current score stands alone.
pub fn blend(current: &CompositeAssessment, periods: &[ForecastPeriod]) -> CompositeAssessment {
    if periods.is_empty() {
        return *current;
    }
    let mean = periods.iter().map(|p| p.assessment.score).sum::<f64>() / periods.len() as f64;
    CompositeAssessment::from_score(current.score * CURRENT_WEIGHT + mean * FORECAST_WEIGHT)
}

/// Penalty-based trust estimate for an assessment.
pub fn confidence(current: &ParameterEvaluations, trend: Trend) -> f64 {
    let mut value = CONFIDENCE_START - CONFIDENCE_PER_UNKNOWN * current.unknown_count() as f64;
    if trend == Trend::Deteriorating {
        value -= CONFIDENCE_DETERIORATING;
    }
    round2(value.max(CONFIDENCE_FLOOR))
}

/// Full horizon analysis for an already-scored current sample.
pub fn analyze(
    current: &CompositeAssessment,
    samples: &[ForecastSample],
    profile: &ThresholdProfile,
    period_hours: usize,
    horizon_hours: usize,
) -> TemporalAnalysis {
    let periods = build_periods(samples, profile, period_hours, horizon_hours);
    let worst = worst_period(&periods).cloned();
    let trend = trend(&periods);
    let overall = blend(current, &periods);
    TemporalAnalysis {
        periods,
        worst_period: worst,
        trend,
        overall,
    }
}
