//! Rule-based sailing recommendations (Indonesian).
//!
//! Rules are applied in a fixed order:
//! 1. directive for the current safety level
//! 2. warning when the worst forecast period is dangerous
//! 3. one vessel-class note
//! 4. one warning per dangerous wave height, wind speed or weather code

use common::{SafetyLevel, VesselClass};
use serde::{Deserialize, Serialize};

use crate::aggregator::{CompositeAssessment, ParameterEvaluations};
use crate::evaluator::describe_weather_code;
use crate::temporal::ForecastPeriod;
use crate::thresholds::ThresholdProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Safety,
    Forecast,
    Vessel,
    WaveHeight,
    WindSpeed,
    Weather,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: Category,
    pub message: String,
}

impl Recommendation {
    fn new(priority: Priority, category: Category, message: impl Into<String>) -> Self {
        Self {
            priority,
            category,
            message: message.into(),
        }
    }
}

fn level_directive(level: SafetyLevel, vessel: VesselClass) -> Recommendation {
    let label = vessel.label().to_lowercase();
    match level {
        SafetyLevel::Berbahaya => Recommendation::new(
            Priority::Critical,
            Category::Safety,
            format!("JANGAN BERLAYAR. Kondisi laut saat ini berbahaya untuk {label}."),
        ),
        SafetyLevel::Berisiko => Recommendation::new(
            Priority::High,
            Category::Safety,
            format!(
                "Sangat berhati-hati. Tunda pelayaran jika memungkinkan, kondisi berisiko untuk {label}."
            ),
        ),
        SafetyLevel::HatiHati => Recommendation::new(
            Priority::Medium,
            Category::Safety,
            "Berlayar dengan hati-hati dan pantau perubahan cuaca secara berkala.",
        ),
        SafetyLevel::Aman | SafetyLevel::Unknown => Recommendation::new(
            Priority::Info,
            Category::Safety,
            "Kondisi laut saat ini aman untuk berlayar. Tetap bawa perlengkapan keselamatan.",
        ),
    }
}

fn vessel_note(vessel: VesselClass, profile: &ThresholdProfile) -> Recommendation {
    match vessel {
        VesselClass::SmallBoat => Recommendation::new(
            Priority::High,
            Category::Vessel,
            format!(
                "Perahu kecil: jangan berlayar jika tinggi gelombang melebihi {} m atau kecepatan angin melebihi {} km/jam.",
                profile.wave_height_max, profile.wind_speed_max
            ),
        ),
        VesselClass::FishingBoat => Recommendation::new(
            Priority::Medium,
            Category::Vessel,
            format!(
                "Kapal nelayan: batas aman gelombang {} m dan angin {} km/jam. Pastikan radio komunikasi aktif.",
                profile.wave_height_max, profile.wind_speed_max
            ),
        ),
        VesselClass::LargeVessel => Recommendation::new(
            Priority::Info,
            Category::Vessel,
            "Kapal besar: perhatikan gelombang swell dan jarak pandang saat mendekati pelabuhan.",
        ),
    }
}

fn parameter_warnings(evaluations: &ParameterEvaluations) -> Vec<Recommendation> {
    let mut out = Vec::new();

    let wave = &evaluations.wave_height;
    if let (true, Some(value), Some(limit)) = (wave.is_dangerous(), wave.value, wave.threshold) {
        out.push(Recommendation::new(
            Priority::Critical,
            Category::WaveHeight,
            format!("Tinggi gelombang {value:.1} m melebihi batas aman {limit} m."),
        ));
    }

    let wind = &evaluations.wind_speed;
    if let (true, Some(value), Some(limit)) = (wind.is_dangerous(), wind.value, wind.threshold) {
        out.push(Recommendation::new(
            Priority::Critical,
            Category::WindSpeed,
            format!("Kecepatan angin {value:.0} km/jam melebihi batas aman {limit} km/jam."),
        ));
    }

    let weather = &evaluations.weather;
    if let (true, Some(code)) = (weather.is_dangerous(), weather.value) {
        let code = code.round() as i32;
        out.push(Recommendation::new(
            Priority::Critical,
            Category::Weather,
            format!(
                "Cuaca berbahaya: {} (kode {code}). Hindari berlayar sampai cuaca membaik.",
                describe_weather_code(code)
            ),
        ));
    }

    out
}

/// Build the ordered recommendation list for one assessment.
pub fn generate_recommendations(
    current: &CompositeAssessment,
    evaluations: &ParameterEvaluations,
    worst_period: Option<&ForecastPeriod>,
    vessel: VesselClass,
    profile: &ThresholdProfile,
) -> Vec<Recommendation> {
    let mut out = vec![level_directive(current.level, vessel)];

    if let Some(period) = worst_period.filter(|p| p.assessment.level == SafetyLevel::Berbahaya) {
        let when = period
            .start
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "periode mendatang".to_string());
        out.push(Recommendation::new(
            Priority::High,
            Category::Forecast,
            format!("Prakiraan kondisi berbahaya mulai {when}. Rencanakan untuk kembali sebelum waktu tersebut."),
        ));
    }

    out.push(vessel_note(vessel, profile));
    out.extend(parameter_warnings(evaluations));
    out
}
