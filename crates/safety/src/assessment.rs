//! Full safety assessment of one forecast for one vessel class.

use common::config::ForecastConfig;
use common::{Error, Forecast, ForecastSample, Location, Provenance, Result, SafetyLevel, VesselClass};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::aggregator::{assess_sample, ParameterEvaluations};
use crate::recommendations::{generate_recommendations, Recommendation};
use crate::temporal::{analyze, confidence, ForecastPeriod, Trend};
use crate::thresholds::{profile_for, ThresholdProfile};

/// Horizon settings for an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssessOptions {
    pub horizon_hours: usize,
    pub period_hours: usize,
}

impl Default for AssessOptions {
    fn default() -> Self {
        Self {
            horizon_hours: 24,
            period_hours: 6,
        }
    }
}

impl From<&ForecastConfig> for AssessOptions {
    fn from(cfg: &ForecastConfig) -> Self {
        Self {
            horizon_hours: cfg.horizon_hours,
            period_hours: cfg.period_hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub score: f64,
    pub level: SafetyLevel,
    pub conditions: ForecastSample,
    pub evaluations: ParameterEvaluations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastOutlook {
    pub periods: Vec<ForecastPeriod>,
    pub worst_period: Option<ForecastPeriod>,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallSafety {
    pub score: f64,
    pub level: SafetyLevel,
    pub confidence: f64,
}

/// Root assessment result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAssessment {
    pub vessel_class: VesselClass,
    pub provenance: Provenance,
    pub location: Location,
    pub current_conditions: CurrentConditions,
    pub forecast_24h: ForecastOutlook,
    pub overall_safety: OverallSafety,
    pub recommendations: Vec<Recommendation>,
    pub thresholds_used: ThresholdProfile,
}

/// `{success, data}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SafetyAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssessmentOutcome {
    pub fn ok(data: SafetyAssessment) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
        }
    }
}

impl From<Result<SafetyAssessment>> for AssessmentOutcome {
    fn from(result: Result<SafetyAssessment>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(&e),
        }
    }
}

/// Assess a forecast. Missing fields degrade to unknown evaluations, never errors.
pub fn assess_forecast(
    forecast: &Forecast,
    vessel: VesselClass,
    options: &AssessOptions,
) -> SafetyAssessment {
    let profile = profile_for(vessel);

    let current_sample = forecast.current_sample();
    let (evaluations, current) = assess_sample(&current_sample, &profile);

    let upcoming = forecast.upcoming_samples(options.horizon_hours);
    let analysis = analyze(
        &current,
        &upcoming,
        &profile,
        options.period_hours,
        options.horizon_hours,
    );

    let recommendations = generate_recommendations(
        &current,
        &evaluations,
        analysis.worst_period.as_ref(),
        vessel,
        &profile,
    );

    let overall_safety = OverallSafety {
        score: analysis.overall.score,
        level: analysis.overall.level,
        confidence: confidence(&evaluations, analysis.trend),
    };

    debug!(
        vessel = %vessel,
        provenance = %forecast.provenance,
        current = current.score,
        overall = overall_safety.score,
        level = %overall_safety.level,
        periods = analysis.periods.len(),
        "Assessment complete"
    );

    SafetyAssessment {
        vessel_class: vessel,
        provenance: forecast.provenance,
        location: forecast.location.clone(),
        current_conditions: CurrentConditions {
            score: current.score,
            level: current.level,
            conditions: current_sample,
            evaluations,
        },
        forecast_24h: ForecastOutlook {
            periods: analysis.periods,
            worst_period: analysis.worst_period,
            trend: analysis.trend,
        },
        overall_safety,
        recommendations,
        thresholds_used: profile,
    }
}

/// Like [`assess_forecast`], but an absent forecast is an error.
pub fn try_assess(
    forecast: Option<&Forecast>,
    vessel: VesselClass,
    options: &AssessOptions,
) -> Result<SafetyAssessment> {
    let forecast = forecast.ok_or(Error::MissingForecast)?;
    Ok(assess_forecast(forecast, vessel, options))
}

/// Assess a possibly absent forecast, reporting failure in the outcome instead of erroring.
pub fn assess_safety(
    forecast: Option<&Forecast>,
    vessel: VesselClass,
    options: &AssessOptions,
) -> AssessmentOutcome {
    try_assess(forecast, vessel, options).into()
}

/// Assess a raw JSON forecast payload. `vessel` names fall back to the fishing boat.
pub fn assess_payload(payload: &Value, vessel: &str, options: &AssessOptions) -> AssessmentOutcome {
    let vessel = VesselClass::parse_or_default(vessel);
    let parsed: Result<Option<Forecast>> = if payload.is_null() {
        Ok(None)
    } else {
        serde_json::from_value(payload.clone()).map(Some).map_err(Error::from)
    };
    match parsed {
        Ok(forecast) => assess_safety(forecast.as_ref(), vessel, options),
        Err(e) => AssessmentOutcome::failure(&e),
    }
}
