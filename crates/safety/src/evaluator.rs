//! Single-parameter scoring against a threshold.
//!
//! Scores fall in fixed bands per status so a status can always be read
//! back from a score: dangerous `[0, 50)`, moderate `[50, 80)`, safe
//! `[80, 100]`. Missing data is `unknown` and scores exactly 50.

use serde::{Deserialize, Serialize};

pub const UNKNOWN_SCORE: f64 = 50.0;

/// "Below" limits are safe up to 70% of the threshold.
pub const BELOW_SAFE_RATIO: f64 = 0.7;
/// "Above" limits are safe from 130% of the threshold.
pub const ABOVE_SAFE_RATIO: f64 = 1.3;

/// Precipitation intensity (mm/h) at or above which conditions are dangerous.
pub const HEAVY_PRECIPITATION: f64 = 10.0;
/// Precipitation intensity (mm/h) at or above which conditions are moderate.
pub const MODERATE_PRECIPITATION: f64 = 2.5;

const CATEGORICAL_SAFE: f64 = 100.0;
const CATEGORICAL_MODERATE: f64 = 60.0;
const CATEGORICAL_DANGEROUS: f64 = 20.0;

/// Thunderstorms, heavy rain/snow, violent showers.
const DANGEROUS_WEATHER_CODES: [i32; 8] = [65, 67, 75, 82, 86, 95, 96, 99];
/// Drizzle, light/moderate rain, snow and showers.
const MODERATE_WEATHER_CODES: [i32; 14] = [51, 53, 55, 56, 57, 61, 63, 66, 71, 73, 77, 80, 81, 85];

/// Which side of the threshold is safer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smaller is safer (wave height, wind speed).
    Below,
    /// Larger is safer (visibility, wave period).
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterStatus {
    Safe,
    Moderate,
    Dangerous,
    Unknown,
}

/// Outcome of scoring one physical quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterEvaluation {
    pub status: ParameterStatus,
    /// 0 (worst) to 100 (best).
    pub score: f64,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
}

impl ParameterEvaluation {
    pub fn unknown(threshold: Option<f64>) -> Self {
        Self {
            status: ParameterStatus::Unknown,
            score: UNKNOWN_SCORE,
            value: None,
            threshold,
        }
    }

    pub fn is_known(&self) -> bool {
        self.status != ParameterStatus::Unknown
    }

    pub fn is_dangerous(&self) -> bool {
        self.status == ParameterStatus::Dangerous
    }
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Score `value` against `threshold`.
///
/// Below: safe ≤ 0.7·t < moderate ≤ t < dangerous.
/// Above: dangerous < t ≤ moderate < 1.3·t ≤ safe.
/// A missing/NaN value, or a non-positive threshold, is unknown.
pub fn evaluate(value: Option<f64>, threshold: f64, direction: Direction) -> ParameterEvaluation {
    let Some(v) = usable(value) else {
        return ParameterEvaluation::unknown(Some(threshold));
    };
    if threshold.is_nan() || threshold <= 0.0 {
        return ParameterEvaluation {
            value: Some(v),
            ..ParameterEvaluation::unknown(Some(threshold))
        };
    }

    let ratio = v / threshold;
    let (status, score) = match direction {
        Direction::Below => {
            if v <= BELOW_SAFE_RATIO * threshold {
                let r = ratio.max(0.0) / BELOW_SAFE_RATIO;
                (ParameterStatus::Safe, 100.0 - 20.0 * r)
            } else if v <= threshold {
                let r = (ratio - BELOW_SAFE_RATIO) / (1.0 - BELOW_SAFE_RATIO);
                (ParameterStatus::Moderate, 80.0 - 30.0 * r)
            } else {
                // Bottoms out at twice the threshold.
                let excess = (ratio - 1.0).min(1.0);
                (ParameterStatus::Dangerous, 50.0 * (1.0 - excess))
            }
        }
        Direction::Above => {
            if v >= ABOVE_SAFE_RATIO * threshold {
                // Tops out at twice the safe ratio.
                let r = ((ratio - ABOVE_SAFE_RATIO) / ABOVE_SAFE_RATIO).min(1.0);
                (ParameterStatus::Safe, 80.0 + 20.0 * r)
            } else if v >= threshold {
                let r = (ratio - 1.0) / (ABOVE_SAFE_RATIO - 1.0);
                (ParameterStatus::Moderate, 50.0 + 30.0 * r)
            } else {
                (ParameterStatus::Dangerous, 50.0 * ratio.max(0.0))
            }
        }
    };

    ParameterEvaluation {
        status,
        score: score.clamp(0.0, 100.0),
        value: Some(v),
        threshold: Some(threshold),
    }
}

fn categorical(status: ParameterStatus, value: f64) -> ParameterEvaluation {
    let score = match status {
        ParameterStatus::Safe => CATEGORICAL_SAFE,
        ParameterStatus::Moderate => CATEGORICAL_MODERATE,
        ParameterStatus::Dangerous => CATEGORICAL_DANGEROUS,
        ParameterStatus::Unknown => UNKNOWN_SCORE,
    };
    ParameterEvaluation {
        status,
        score,
        value: Some(value),
        threshold: None,
    }
}

pub fn weather_code_status(code: i32) -> ParameterStatus {
    if DANGEROUS_WEATHER_CODES.contains(&code) {
        ParameterStatus::Dangerous
    } else if MODERATE_WEATHER_CODES.contains(&code) {
        ParameterStatus::Moderate
    } else {
        ParameterStatus::Safe
    }
}

/// Classify a WMO weather code.
pub fn evaluate_weather_code(code: Option<i32>) -> ParameterEvaluation {
    match code {
        Some(code) => categorical(weather_code_status(code), f64::from(code)),
        None => ParameterEvaluation::unknown(None),
    }
}

/// Classify precipitation intensity (mm/h).
pub fn evaluate_precipitation(mm_per_hour: Option<f64>) -> ParameterEvaluation {
    let Some(v) = usable(mm_per_hour) else {
        return ParameterEvaluation::unknown(Some(HEAVY_PRECIPITATION));
    };
    let status = if v >= HEAVY_PRECIPITATION {
        ParameterStatus::Dangerous
    } else if v >= MODERATE_PRECIPITATION {
        ParameterStatus::Moderate
    } else {
        ParameterStatus::Safe
    };
    ParameterEvaluation {
        threshold: Some(HEAVY_PRECIPITATION),
        ..categorical(status, v)
    }
}

/// Indonesian description of a WMO weather code.
pub fn describe_weather_code(code: i32) -> &'static str {
    match code {
        0 => "cerah",
        1..=3 => "berawan",
        45 | 48 => "berkabut",
        51..=57 => "gerimis",
        61 | 63 | 66 => "hujan ringan hingga sedang",
        65 | 67 => "hujan lebat",
        71 | 73 | 77 => "salju",
        75 => "salju lebat",
        80 | 81 => "hujan lokal",
        82 => "hujan lokal sangat lebat",
        85 | 86 => "hujan salju lokal",
        95 => "badai petir",
        96 | 99 => "badai petir disertai hujan es",
        _ => "kondisi cuaca tidak dikenal",
    }
}
