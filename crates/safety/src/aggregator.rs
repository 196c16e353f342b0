//! Weighted composite scoring across all evaluated parameters.

use common::{ForecastSample, SafetyLevel};
use serde::{Deserialize, Serialize};

use crate::evaluator::{
    evaluate, evaluate_precipitation, evaluate_weather_code, Direction, ParameterEvaluation,
    UNKNOWN_SCORE,
};
use crate::thresholds::ThresholdProfile;

/// The six parameters that contribute to a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    WaveHeight,
    WindSpeed,
    WavePeriod,
    Visibility,
    Weather,
    Precipitation,
}

impl Parameter {
    pub const ALL: [Parameter; 6] = [
        Parameter::WaveHeight,
        Parameter::WindSpeed,
        Parameter::WavePeriod,
        Parameter::Visibility,
        Parameter::Weather,
        Parameter::Precipitation,
    ];

    /// Weights sum to 1.
    pub fn weight(&self) -> f64 {
        match self {
            Parameter::WaveHeight => 0.25,
            Parameter::WindSpeed => 0.25,
            Parameter::WavePeriod => 0.15,
            Parameter::Visibility => 0.10,
            Parameter::Weather => 0.15,
            Parameter::Precipitation => 0.10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::WaveHeight => "wave_height",
            Parameter::WindSpeed => "wind_speed",
            Parameter::WavePeriod => "wave_period",
            Parameter::Visibility => "visibility",
            Parameter::Weather => "weather",
            Parameter::Precipitation => "precipitation",
        }
    }
}

/// Per-parameter evaluations of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterEvaluations {
    pub wave_height: ParameterEvaluation,
    pub wind_speed: ParameterEvaluation,
    pub wave_period: ParameterEvaluation,
    pub visibility: ParameterEvaluation,
    pub weather: ParameterEvaluation,
    pub precipitation: ParameterEvaluation,
}

impl ParameterEvaluations {
    pub fn get(&self, parameter: Parameter) -> &ParameterEvaluation {
        match parameter {
            Parameter::WaveHeight => &self.wave_height,
            Parameter::WindSpeed => &self.wind_speed,
            Parameter::WavePeriod => &self.wave_period,
            Parameter::Visibility => &self.visibility,
            Parameter::Weather => &self.weather,
            Parameter::Precipitation => &self.precipitation,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Parameter, &ParameterEvaluation)> + '_ {
        Parameter::ALL.into_iter().map(move |p| (p, self.get(p)))
    }

    pub fn unknown_count(&self) -> usize {
        self.iter().filter(|(_, eval)| !eval.is_known()).count()
    }
}

/// Composite score and its level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeAssessment {
    pub score: f64,
    pub level: SafetyLevel,
}

impl CompositeAssessment {
    pub fn from_score(score: f64) -> Self {
        let score = round2(score.clamp(0.0, 100.0));
        Self {
            score,
            level: SafetyLevel::from_score(score),
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Evaluate every parameter of `sample` against `profile`.
pub fn evaluate_sample(sample: &ForecastSample, profile: &ThresholdProfile) -> ParameterEvaluations {
    ParameterEvaluations {
        wave_height: evaluate(sample.wave_height, profile.wave_height_max, Direction::Below),
        wind_speed: evaluate(sample.wind_speed, profile.wind_speed_max, Direction::Below),
        wave_period: evaluate(sample.wave_period, profile.wave_period_min, Direction::Above),
        visibility: evaluate(sample.visibility, profile.visibility_min, Direction::Above),
        weather: evaluate_weather_code(sample.weather_code),
        precipitation: evaluate_precipitation(sample.precipitation),
    }
}

/// Weighted mean over known parameters, re-normalized by the weights used.
/// Nothing evaluable yields the neutral midpoint.
pub fn aggregate(evaluations: &ParameterEvaluations) -> CompositeAssessment {
    let (weighted, weights) = evaluations
        .iter()
        .filter(|(_, eval)| eval.is_known())
        .fold((0.0, 0.0), |(sum, total), (parameter, eval)| {
            let w = parameter.weight();
            (sum + eval.score * w, total + w)
        });

    if weights > 0.0 {
        CompositeAssessment::from_score(weighted / weights)
    } else {
        CompositeAssessment::from_score(UNKNOWN_SCORE)
    }
}

/// Evaluate and aggregate in one step.
pub fn assess_sample(
    sample: &ForecastSample,
    profile: &ThresholdProfile,
) -> (ParameterEvaluations, CompositeAssessment) {
    let evaluations = evaluate_sample(sample, profile);
    let composite = aggregate(&evaluations);
    (evaluations, composite)
}
