//! Sailing-safety scoring: per-vessel thresholds, parameter evaluation,
//! weighted aggregation, forecast horizon analysis and recommendations.
//!
//! Everything here is a pure function of its inputs; network access lives
//! in `marine_client`.

pub mod aggregator;
pub mod assessment;
pub mod evaluator;
pub mod recommendations;
pub mod temporal;
pub mod thresholds;

pub use aggregator::{aggregate, assess_sample, evaluate_sample, CompositeAssessment, ParameterEvaluations};
pub use assessment::{
    assess_forecast, assess_payload, assess_safety, try_assess, AssessOptions, AssessmentOutcome,
    SafetyAssessment,
};
pub use evaluator::{evaluate, Direction, ParameterEvaluation, ParameterStatus};
pub use recommendations::{Priority, Recommendation};
pub use temporal::{ForecastPeriod, Trend};
pub use thresholds::{profile_for, ThresholdProfile};
