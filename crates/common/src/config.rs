//! Service configuration types.

use serde::{Deserialize, Serialize};

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Upstream forecast endpoints and HTTP behaviour.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Response cache parameters.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Forecast request and analysis parameters.
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Grid/route scan throttling.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Vessel class used when a request does not name one.
    #[serde(default = "default_vessel")]
    pub default_vessel: String,
}

/// Forecast provider endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Marine forecast endpoint (waves, swell).
    #[serde(default = "default_marine_url")]
    pub marine_url: String,

    /// General atmospheric forecast endpoint (wind, visibility, weather code).
    #[serde(default = "default_weather_url")]
    pub weather_url: String,

    /// Historical archive endpoint.
    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Max network requests per second across all endpoints. Cache hits are not counted.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Response cache parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry lifetime (seconds). An entry expires once its age reaches this value.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

/// Forecast request and analysis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Days of forecast requested from the upstream endpoints.
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,

    /// Timezone passed upstream ("auto" resolves from coordinates).
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Hours of forecast analyzed for trend and worst-period detection.
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: usize,

    /// Length of each analyzed forecast period (hours).
    #[serde(default = "default_period_hours")]
    pub period_hours: usize,
}

/// Scan throttling. These limits exist to stay under the upstream rate limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Concurrent point evaluations per grid batch.
    #[serde(default = "default_grid_concurrency")]
    pub grid_concurrency: usize,

    /// Pause between grid batches (milliseconds).
    #[serde(default = "default_grid_batch_pause")]
    pub grid_batch_pause_ms: u64,

    /// Delay between sequential route waypoint evaluations (milliseconds).
    #[serde(default = "default_route_delay")]
    pub route_delay_ms: u64,

    /// Multiplier applied to the pause after every batch; 1.0 keeps it fixed.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound for a backed-off pause (milliseconds).
    #[serde(default = "default_max_pause")]
    pub max_pause_ms: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_vessel() -> String {
    "fishing_boat".into()
}

fn default_marine_url() -> String {
    "https://marine-api.open-meteo.com/v1/marine".into()
}
fn default_weather_url() -> String {
    "https://api.open-meteo.com/v1/forecast".into()
}
fn default_archive_url() -> String {
    "https://archive-api.open-meteo.com/v1/archive".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_requests_per_second() -> u32 {
    10
}
fn default_user_agent() -> String {
    "sailing-safety/0.1 (marine safety assessment)".into()
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_forecast_days() -> u8 {
    3
}
fn default_timezone() -> String {
    "auto".into()
}
fn default_horizon_hours() -> usize {
    24
}
fn default_period_hours() -> usize {
    6
}

fn default_grid_concurrency() -> usize {
    3
}
fn default_grid_batch_pause() -> u64 {
    100
}
fn default_backoff_factor() -> f64 {
    1.0
}
fn default_max_pause() -> u64 {
    2_000
}
fn default_route_delay() -> u64 {
    50
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            marine_url: default_marine_url(),
            weather_url: default_weather_url(),
            archive_url: default_archive_url(),
            timeout_secs: default_timeout(),
            requests_per_second: default_requests_per_second(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            forecast_days: default_forecast_days(),
            timezone: default_timezone(),
            horizon_hours: default_horizon_hours(),
            period_hours: default_period_hours(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            grid_concurrency: default_grid_concurrency(),
            grid_batch_pause_ms: default_grid_batch_pause(),
            route_delay_ms: default_route_delay(),
            backoff_factor: default_backoff_factor(),
            max_pause_ms: default_max_pause(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
            forecast: ForecastConfig::default(),
            scan: ScanConfig::default(),
            default_vessel: default_vessel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.upstream.timeout_secs, 10);
        assert_eq!(cfg.cache.ttl_secs, 300);
        assert_eq!(cfg.scan.grid_concurrency, 3);
        assert_eq!(cfg.scan.grid_batch_pause_ms, 100);
        assert_eq!(cfg.scan.route_delay_ms, 50);
        assert_eq!(cfg.scan.backoff_factor, 1.0);
        assert_eq!(cfg.forecast.horizon_hours, 24);
        assert_eq!(cfg.forecast.period_hours, 6);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let cfg: ServiceConfig =
            serde_json::from_str(r#"{"cache": {"ttl_secs": 60}}"#).expect("partial config");
        assert_eq!(cfg.cache.ttl_secs, 60);
        assert_eq!(cfg.default_vessel, "fishing_boat");
        assert_eq!(cfg.scan.grid_concurrency, 3);
    }
}
