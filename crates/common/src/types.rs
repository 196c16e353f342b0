//! Domain types shared across the service.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::Error;

// ── Series Field Names ────────────────────────────────────────────────

/// Upstream series names, as requested from and returned by the forecast endpoints.
pub mod fields {
    pub const WAVE_HEIGHT: &str = "wave_height";
    pub const WAVE_PERIOD: &str = "wave_period";
    pub const WAVE_DIRECTION: &str = "wave_direction";
    pub const WIND_WAVE_HEIGHT: &str = "wind_wave_height";
    pub const WIND_WAVE_PERIOD: &str = "wind_wave_period";
    pub const SWELL_WAVE_HEIGHT: &str = "swell_wave_height";
    pub const SWELL_WAVE_PERIOD: &str = "swell_wave_period";

    pub const WIND_SPEED: &str = "wind_speed_10m";
    pub const WIND_GUSTS: &str = "wind_gusts_10m";
    pub const WIND_DIRECTION: &str = "wind_direction_10m";
    pub const VISIBILITY: &str = "visibility";
    pub const WEATHER_CODE: &str = "weather_code";
    pub const PRECIPITATION: &str = "precipitation";
    pub const TEMPERATURE: &str = "temperature_2m";
    pub const SURFACE_PRESSURE: &str = "surface_pressure";

    pub const WAVE_HEIGHT_MAX: &str = "wave_height_max";
    pub const WAVE_PERIOD_MAX: &str = "wave_period_max";
    pub const WAVE_DIRECTION_DOMINANT: &str = "wave_direction_dominant";
    pub const WIND_WAVE_HEIGHT_MAX: &str = "wind_wave_height_max";
    pub const SWELL_WAVE_HEIGHT_MAX: &str = "swell_wave_height_max";

    /// Wave height derived from wind speed (historical feed).
    pub const ESTIMATED_WAVE_HEIGHT: &str = "estimated_wave_height";
}

// ── Timestamps ────────────────────────────────────────────────────────

const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parse an upstream timestamp.
///
/// Accepts the minute-resolution local time the forecast endpoints return
/// (`2026-02-13T10:00`), seconds resolution, RFC 3339, and bare dates
/// (interpreted as midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, MINUTE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Format a timestamp the way the forecast endpoints do.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(MINUTE_FORMAT).to_string()
}

mod lenient_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&super::format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_timestamp))
    }
}

/// Weather codes arrive as integers from the API but as floats from
/// re-serialized documents; both round to the nearest code.
mod lenient_code {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<f64> = Option::deserialize(deserializer)?;
        Ok(raw.filter(|c| c.is_finite()).map(|c| c.round() as i32))
    }
}

// ── Forecast Types ────────────────────────────────────────────────────

/// One point-in-time set of marine/atmospheric conditions. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    #[serde(default, with = "lenient_timestamp", alias = "time")]
    pub timestamp: Option<NaiveDateTime>,
    /// Significant wave height (m).
    #[serde(default)]
    pub wave_height: Option<f64>,
    /// Wave period (s).
    #[serde(default)]
    pub wave_period: Option<f64>,
    /// Wind speed at 10 m (km/h).
    #[serde(default, alias = "wind_speed_10m")]
    pub wind_speed: Option<f64>,
    /// Wind gusts at 10 m (km/h).
    #[serde(default, alias = "wind_gusts_10m")]
    pub wind_gusts: Option<f64>,
    /// Visibility (m).
    #[serde(default)]
    pub visibility: Option<f64>,
    /// WMO weather interpretation code.
    #[serde(default, deserialize_with = "lenient_code::deserialize")]
    pub weather_code: Option<i32>,
    /// Precipitation (mm/h).
    #[serde(default)]
    pub precipitation: Option<f64>,
}

impl ForecastSample {
    /// Build a sample by looking up each upstream series name.
    pub fn from_lookup<F>(timestamp: Option<NaiveDateTime>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<f64>,
    {
        Self {
            timestamp,
            wave_height: lookup(fields::WAVE_HEIGHT),
            wave_period: lookup(fields::WAVE_PERIOD),
            wind_speed: lookup(fields::WIND_SPEED),
            wind_gusts: lookup(fields::WIND_GUSTS),
            visibility: lookup(fields::VISIBILITY),
            weather_code: lookup(fields::WEATHER_CODE).map(|c| c.round() as i32),
            precipitation: lookup(fields::PRECIPITATION),
        }
    }

    /// Fill fields missing here from `other`, keeping our own values.
    pub fn or(self, other: &ForecastSample) -> Self {
        Self {
            timestamp: self.timestamp.or(other.timestamp),
            wave_height: self.wave_height.or(other.wave_height),
            wave_period: self.wave_period.or(other.wave_period),
            wind_speed: self.wind_speed.or(other.wind_speed),
            wind_gusts: self.wind_gusts.or(other.wind_gusts),
            visibility: self.visibility.or(other.visibility),
            weather_code: self.weather_code.or(other.weather_code),
            precipitation: self.precipitation.or(other.precipitation),
        }
    }
}

/// Column-oriented time series keyed by upstream field name.
///
/// Mirrors the `hourly` / `daily` blocks of the forecast endpoints: a `time`
/// axis plus one array per requested field, any element of which may be null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesBag {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(flatten)]
    pub series: BTreeMap<String, Vec<Option<f64>>>,
}

impl SeriesBag {
    pub fn new(time: Vec<String>) -> Self {
        Self {
            time,
            series: BTreeMap::new(),
        }
    }

    /// Number of rows; the time axis when present, otherwise the longest series.
    pub fn len(&self) -> usize {
        if !self.time.is_empty() {
            return self.time.len();
        }
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series.get(name).map(Vec::as_slice)
    }

    /// Value of `name` at row `idx`; NaN is treated as missing.
    pub fn value(&self, name: &str, idx: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|values| values.get(idx).copied().flatten())
            .filter(|v| !v.is_nan())
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.series.insert(name.into(), values);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    /// True when the series is missing or every element is null.
    pub fn is_all_null(&self, name: &str) -> bool {
        self.get(name)
            .map(|values| values.iter().all(|v| v.is_none()))
            .unwrap_or(true)
    }

    pub fn timestamp(&self, idx: usize) -> Option<NaiveDateTime> {
        self.time.get(idx).and_then(|raw| parse_timestamp(raw))
    }

    pub fn sample_at(&self, idx: usize) -> ForecastSample {
        ForecastSample::from_lookup(self.timestamp(idx), |name| self.value(name, idx))
    }

    pub fn samples(&self) -> Vec<ForecastSample> {
        (0..self.len()).map(|idx| self.sample_at(idx)).collect()
    }

    /// Copy series from `other` that this bag lacks, aligning rows by timestamp.
    ///
    /// Rows of `other` with no matching time in `self` are dropped; rows of
    /// `self` with no counterpart get nulls. An empty bag adopts `other` wholesale.
    pub fn merge_missing(&mut self, other: &SeriesBag) {
        if self.is_empty() {
            *self = other.clone();
            return;
        }

        let index: HashMap<&str, usize> = other
            .time
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.as_str(), idx))
            .collect();

        for (name, values) in &other.series {
            if self.series.contains_key(name) {
                continue;
            }
            let aligned = self
                .time
                .iter()
                .map(|t| {
                    index
                        .get(t.as_str())
                        .and_then(|&idx| values.get(idx).copied().flatten())
                })
                .collect();
            self.series.insert(name.clone(), aligned);
        }
    }
}

/// Geographic position of a forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Where a sample's numbers came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Direct marine model output.
    #[default]
    Marine,
    /// Direct atmospheric model output.
    Weather,
    /// Wave values estimated from the atmospheric wind forecast.
    WeatherFallback,
    /// Wave values estimated from archived wind observations.
    ArchiveEstimate,
    /// Degraded placeholder after a failed lookup.
    Error,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Marine => "marine",
            Provenance::Weather => "weather",
            Provenance::WeatherFallback => "weather_fallback",
            Provenance::ArchiveEstimate => "archive_estimate",
            Provenance::Error => "error",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized forecast for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub provenance: Provenance,
    /// Explicit "now" sample, when the upstream reported one.
    #[serde(default)]
    pub current: Option<ForecastSample>,
    #[serde(default)]
    pub hourly: SeriesBag,
    #[serde(default)]
    pub daily: SeriesBag,
}

impl Forecast {
    pub fn new(location: Location, provenance: Provenance) -> Self {
        Self {
            location,
            provenance,
            current: None,
            hourly: SeriesBag::default(),
            daily: SeriesBag::default(),
        }
    }

    /// Row of the hourly series that the current sample falls into.
    ///
    /// Zero when there is no explicit current sample, no timestamps, or the
    /// current time lies outside the hourly axis.
    pub fn current_index(&self) -> usize {
        let Some(now) = self.current.as_ref().and_then(|c| c.timestamp) else {
            return 0;
        };
        (0..self.hourly.len())
            .find(|&idx| {
                self.hourly
                    .timestamp(idx)
                    .map(|ts| ts <= now && now < ts + Duration::hours(1))
                    .unwrap_or(false)
            })
            .unwrap_or(0)
    }

    /// Current conditions: the explicit current sample, topped up from the
    /// matching hourly row for any field it lacks.
    pub fn current_sample(&self) -> ForecastSample {
        let hourly = if self.hourly.is_empty() {
            ForecastSample::default()
        } else {
            self.hourly.sample_at(self.current_index())
        };
        match &self.current {
            Some(current) => current.clone().or(&hourly),
            None => hourly,
        }
    }

    /// Up to `limit` hourly samples starting at the current hour.
    pub fn upcoming_samples(&self, limit: usize) -> Vec<ForecastSample> {
        let start = self.current_index();
        (start..self.hourly.len())
            .take(limit)
            .map(|idx| self.hourly.sample_at(idx))
            .collect()
    }

    /// Fold another forecast for the same location into this one.
    ///
    /// Series and current-sample fields already present here win; provenance is kept.
    pub fn merge(&mut self, other: &Forecast) {
        self.hourly.merge_missing(&other.hourly);
        self.daily.merge_missing(&other.daily);
        self.current = match (self.current.take(), &other.current) {
            (Some(mine), Some(theirs)) => Some(mine.or(theirs)),
            (Some(mine), None) => Some(mine),
            (None, theirs) => theirs.clone(),
        };
        if self.location.timezone.is_none() {
            self.location.timezone = other.location.timezone.clone();
        }
    }
}

// ── Spatial Types ─────────────────────────────────────────────────────

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Reject NaN and out-of-range coordinates.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidInput(format!(
                "latitude {} must be within [-90, 90]",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(Error::InvalidInput(format!(
                "longitude {} must be within [-180, 180]",
                self.lon
            )));
        }
        Ok(())
    }
}

// ── Vessel & Safety Types ─────────────────────────────────────────────

/// Safety-tolerance tier, ordered by increasing tolerance.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VesselClass {
    #[serde(alias = "perahu_kecil")]
    SmallBoat,
    #[default]
    #[serde(alias = "kapal_nelayan")]
    FishingBoat,
    #[serde(alias = "kapal_besar")]
    LargeVessel,
}

impl VesselClass {
    pub const ALL: [VesselClass; 3] = [
        VesselClass::SmallBoat,
        VesselClass::FishingBoat,
        VesselClass::LargeVessel,
    ];

    /// Parse a vessel class, falling back to the fishing-boat tier.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VesselClass::SmallBoat => "small_boat",
            VesselClass::FishingBoat => "fishing_boat",
            VesselClass::LargeVessel => "large_vessel",
        }
    }

    /// Human-readable (Indonesian) label.
    pub fn label(&self) -> &'static str {
        match self {
            VesselClass::SmallBoat => "Perahu Kecil",
            VesselClass::FishingBoat => "Kapal Nelayan",
            VesselClass::LargeVessel => "Kapal Besar",
        }
    }
}

impl FromStr for VesselClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "small_boat" | "perahu_kecil" | "small" => Ok(VesselClass::SmallBoat),
            "fishing_boat" | "kapal_nelayan" | "fishing" => Ok(VesselClass::FishingBoat),
            "large_vessel" | "kapal_besar" | "large" => Ok(VesselClass::LargeVessel),
            _ => Err(Error::InvalidInput(format!("unknown vessel class: {s}"))),
        }
    }
}

impl fmt::Display for VesselClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const AMAN_MIN_SCORE: f64 = 80.0;
pub const HATI_HATI_MIN_SCORE: f64 = 60.0;
pub const BERISIKO_MIN_SCORE: f64 = 40.0;

/// Ordered classification of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SafetyLevel {
    /// Safe.
    #[serde(rename = "AMAN")]
    Aman,
    /// Caution.
    #[serde(rename = "HATI-HATI")]
    HatiHati,
    /// Risky.
    #[serde(rename = "BERISIKO")]
    Berisiko,
    /// Dangerous.
    #[serde(rename = "BERBAHAYA")]
    Berbahaya,
    /// Placeholder for points that could not be assessed. Never produced by scoring.
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl SafetyLevel {
    /// Scored levels from safest to most dangerous.
    pub const SCORED: [SafetyLevel; 4] = [
        SafetyLevel::Aman,
        SafetyLevel::HatiHati,
        SafetyLevel::Berisiko,
        SafetyLevel::Berbahaya,
    ];

    pub fn from_score(score: f64) -> Self {
        if score >= AMAN_MIN_SCORE {
            SafetyLevel::Aman
        } else if score >= HATI_HATI_MIN_SCORE {
            SafetyLevel::HatiHati
        } else if score >= BERISIKO_MIN_SCORE {
            SafetyLevel::Berisiko
        } else {
            SafetyLevel::Berbahaya
        }
    }

    /// 0 (most dangerous) to 3 (safe); `None` for the placeholder level.
    pub fn rank(&self) -> Option<u8> {
        match self {
            SafetyLevel::Berbahaya => Some(0),
            SafetyLevel::Berisiko => Some(1),
            SafetyLevel::HatiHati => Some(2),
            SafetyLevel::Aman => Some(3),
            SafetyLevel::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyLevel::Aman => "AMAN",
            SafetyLevel::HatiHati => "HATI-HATI",
            SafetyLevel::Berisiko => "BERISIKO",
            SafetyLevel::Berbahaya => "BERBAHAYA",
            SafetyLevel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
