//! Marine and atmospheric forecast acquisition.
//!
//! Fetches hourly/daily series from the marine endpoint, falls back to
//! wind-derived wave estimates when the point is outside marine coverage,
//! and caches every raw upstream response per client instance.

pub mod cache;
pub mod estimate;
pub mod history;
pub mod rate_limit;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use common::config::{ForecastConfig, ServiceConfig, UpstreamConfig};
use common::{fields, Error, Forecast, ForecastSample, Location, Provenance, SeriesBag};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

pub use cache::{CacheStats, ResponseCache};
pub use estimate::{first_sample_direction, modal_direction, DominantDirectionFn};
pub use history::{HistoricalData, HistoricalSummary};
pub use rate_limit::UpstreamLimiter;
pub use transport::{ForecastTransport, HttpTransport};

const MARINE_HOURLY: [&str; 7] = [
    fields::WAVE_HEIGHT,
    fields::WAVE_DIRECTION,
    fields::WAVE_PERIOD,
    fields::WIND_WAVE_HEIGHT,
    fields::WIND_WAVE_PERIOD,
    fields::SWELL_WAVE_HEIGHT,
    fields::SWELL_WAVE_PERIOD,
];
const MARINE_DAILY: [&str; 5] = [
    fields::WAVE_HEIGHT_MAX,
    fields::WAVE_DIRECTION_DOMINANT,
    fields::WAVE_PERIOD_MAX,
    fields::WIND_WAVE_HEIGHT_MAX,
    fields::SWELL_WAVE_HEIGHT_MAX,
];
const MARINE_CURRENT: [&str; 3] = [fields::WAVE_HEIGHT, fields::WAVE_DIRECTION, fields::WAVE_PERIOD];

const WEATHER_HOURLY: [&str; 7] = [
    fields::WIND_SPEED,
    fields::WIND_GUSTS,
    fields::WIND_DIRECTION,
    fields::VISIBILITY,
    fields::WEATHER_CODE,
    fields::PRECIPITATION,
    fields::TEMPERATURE,
];
const WEATHER_CURRENT: [&str; 6] = [
    fields::WIND_SPEED,
    fields::WIND_GUSTS,
    fields::WIND_DIRECTION,
    fields::VISIBILITY,
    fields::WEATHER_CODE,
    fields::PRECIPITATION,
];

const ARCHIVE_HOURLY: [&str; 4] = [
    fields::WIND_SPEED,
    fields::WIND_DIRECTION,
    fields::TEMPERATURE,
    fields::SURFACE_PRESSURE,
];

/// Upstream endpoint kinds. Part of every cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Marine,
    Weather,
    Archive,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Marine => "marine",
            Endpoint::Weather => "weather",
            Endpoint::Archive => "archive",
        }
    }

    /// Indonesian description used in user-facing error messages.
    fn label(&self) -> &'static str {
        match self {
            Endpoint::Marine => "prakiraan laut",
            Endpoint::Weather => "prakiraan cuaca",
            Endpoint::Archive => "data historis cuaca",
        }
    }
}

/// Per-request options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub forecast_days: u8,
    pub timezone: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&ForecastConfig::default())
    }
}

impl From<&ForecastConfig> for FetchOptions {
    fn from(cfg: &ForecastConfig) -> Self {
        Self {
            forecast_days: cfg.forecast_days,
            timezone: cfg.timezone.clone(),
        }
    }
}

/// Raw forecast response shape shared by the marine, weather and archive endpoints.
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    current: Option<ForecastSample>,
    #[serde(default)]
    hourly: Option<SeriesBag>,
    #[serde(default)]
    daily: Option<SeriesBag>,
}

fn parse_forecast(
    payload: &Value,
    lat: f64,
    lon: f64,
    provenance: Provenance,
) -> Result<Forecast, Error> {
    let resp = ForecastResponse::deserialize(payload)?;
    Ok(Forecast {
        location: Location {
            latitude: resp.latitude.unwrap_or(lat),
            longitude: resp.longitude.unwrap_or(lon),
            timezone: resp.timezone,
        },
        provenance,
        current: resp.current,
        hourly: resp.hourly.unwrap_or_default(),
        daily: resp.daily.unwrap_or_default(),
    })
}

fn coordinate_params(lat: f64, lon: f64) -> Vec<(String, String)> {
    vec![
        ("latitude".to_string(), lat.to_string()),
        ("longitude".to_string(), lon.to_string()),
    ]
}

/// Forecast acquisition client with its own response cache.
#[derive(Clone)]
pub struct MarineClient {
    transport: Arc<dyn ForecastTransport>,
    cache: ResponseCache,
    limiter: UpstreamLimiter,
    endpoints: UpstreamConfig,
    options: FetchOptions,
    dominant_direction: DominantDirectionFn,
}

impl std::fmt::Debug for MarineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarineClient")
            .field("cache", &self.cache.stats())
            .field("marine_url", &self.endpoints.marine_url)
            .field("weather_url", &self.endpoints.weather_url)
            .finish()
    }
}

impl MarineClient {
    /// Client backed by real HTTP.
    pub fn new(config: &ServiceConfig) -> Result<Self, Error> {
        let transport = HttpTransport::new(&config.upstream)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Client backed by any transport (tests, proxies).
    pub fn with_transport(transport: Arc<dyn ForecastTransport>, config: &ServiceConfig) -> Self {
        Self {
            transport,
            cache: ResponseCache::new(Duration::from_secs(config.cache.ttl_secs)),
            limiter: UpstreamLimiter::per_second(config.upstream.requests_per_second),
            endpoints: config.upstream.clone(),
            options: FetchOptions::from(&config.forecast),
            dominant_direction: first_sample_direction,
        }
    }

    /// Swap the policy used to pick a day's wave direction in fallback mode.
    pub fn with_dominant_direction(mut self, policy: DominantDirectionFn) -> Self {
        self.dominant_direction = policy;
        self
    }

    /// Options used when a caller does not pass its own.
    pub fn default_options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn url_for(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Marine => &self.endpoints.marine_url,
            Endpoint::Weather => &self.endpoints.weather_url,
            Endpoint::Archive => &self.endpoints.archive_url,
        }
    }

    /// Cached GET. Upstream failures are wrapped once in a localized message; never retried.
    async fn get_cached(
        &self,
        endpoint: Endpoint,
        params: Vec<(String, String)>,
    ) -> Result<Arc<Value>, Error> {
        let key = cache::cache_key(endpoint.as_str(), &params);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Cache hit for {} request", endpoint.as_str());
            return Ok(hit);
        }

        self.limiter.wait().await;
        let url = self.url_for(endpoint).to_string();
        let payload = self
            .transport
            .get_json(&url, &params)
            .await
            .map_err(|e| Error::UpstreamUnavailable {
                endpoint: endpoint.as_str().to_string(),
                message: format!("Gagal mengambil {}: {}", endpoint.label(), e),
            })?;

        debug!("Cache miss for {} request; stored fresh payload", endpoint.as_str());
        Ok(self.cache.set(key, payload))
    }

    /// Fetch the atmospheric forecast: wind, gusts, visibility, weather code, precipitation.
    pub async fn fetch_weather(
        &self,
        lat: f64,
        lon: f64,
        opts: &FetchOptions,
    ) -> Result<Forecast, Error> {
        let mut params = coordinate_params(lat, lon);
        params.push(("hourly".into(), WEATHER_HOURLY.join(",")));
        params.push(("current".into(), WEATHER_CURRENT.join(",")));
        params.push(("timezone".into(), opts.timezone.clone()));
        params.push(("forecast_days".into(), opts.forecast_days.to_string()));

        let payload = self.get_cached(Endpoint::Weather, params).await?;
        parse_forecast(&payload, lat, lon, Provenance::Weather)
    }

    /// Fetch the marine forecast, estimating waves from wind when the
    /// marine model has no wave heights for this point.
    pub async fn fetch_marine(
        &self,
        lat: f64,
        lon: f64,
        opts: &FetchOptions,
    ) -> Result<Forecast, Error> {
        let mut params = coordinate_params(lat, lon);
        params.push(("hourly".into(), MARINE_HOURLY.join(",")));
        params.push(("daily".into(), MARINE_DAILY.join(",")));
        params.push(("current".into(), MARINE_CURRENT.join(",")));
        params.push(("timezone".into(), opts.timezone.clone()));
        params.push(("forecast_days".into(), opts.forecast_days.to_string()));

        let payload = self.get_cached(Endpoint::Marine, params).await?;
        let forecast = parse_forecast(&payload, lat, lon, Provenance::Marine)?;

        if !forecast.hourly.is_all_null(fields::WAVE_HEIGHT) {
            debug!(
                "Marine data for ({lat},{lon}): {} hourly rows",
                forecast.hourly.len()
            );
            return Ok(forecast);
        }

        warn!("No marine wave data for ({lat},{lon}); estimating from wind forecast");
        self.wind_fallback(lat, lon, opts).await
    }

    async fn wind_fallback(
        &self,
        lat: f64,
        lon: f64,
        opts: &FetchOptions,
    ) -> Result<Forecast, Error> {
        let weather = self.fetch_weather(lat, lon, opts).await?;

        let hourly = estimate::synthesize_marine_hourly(&weather.hourly);
        let daily = estimate::aggregate_daily(&hourly, self.dominant_direction);
        let current = weather.current.as_ref().map(|c| {
            let est = c.wind_speed.map(estimate::estimate_from_wind_kmh);
            ForecastSample {
                timestamp: c.timestamp,
                wave_height: est.map(|e| e.height),
                wave_period: est.map(|e| e.period),
                ..Default::default()
            }
        });

        Ok(Forecast {
            location: weather.location,
            provenance: Provenance::WeatherFallback,
            current,
            hourly,
            daily,
        })
    }

    /// Marine forecast merged with the atmospheric forecast for the same point.
    ///
    /// Provenance is the marine side's (`marine` or `weather_fallback`).
    pub async fn fetch_conditions(
        &self,
        lat: f64,
        lon: f64,
        opts: &FetchOptions,
    ) -> Result<Forecast, Error> {
        let mut forecast = self.fetch_marine(lat, lon, opts).await?;
        let weather = self.fetch_weather(lat, lon, opts).await?;
        forecast.merge(&weather);
        Ok(forecast)
    }

    /// Archived wind/temperature/pressure for the last `days` days (max 92).
    pub async fn fetch_historical(&self, lat: f64, lon: f64, days: u32) -> HistoricalData {
        self.fetch_historical_until(lat, lon, days, Utc::now().date_naive())
            .await
    }

    /// As [`fetch_historical`](Self::fetch_historical), with the window ending the day before `today`.
    pub async fn fetch_historical_until(
        &self,
        lat: f64,
        lon: f64,
        days: u32,
        today: NaiveDate,
    ) -> HistoricalData {
        let days = days.clamp(1, history::MAX_HISTORY_DAYS);
        if days > history::RECOMMENDED_HISTORY_DAYS {
            debug!("Historical window of {} days requested for ({lat},{lon})", days);
        }
        let window = history::history_window(today, days);
        let location = Location {
            latitude: lat,
            longitude: lon,
            timezone: None,
        };

        let mut params = coordinate_params(lat, lon);
        params.push(("start_date".into(), window.0.format("%Y-%m-%d").to_string()));
        params.push(("end_date".into(), window.1.format("%Y-%m-%d").to_string()));
        params.push(("hourly".into(), ARCHIVE_HOURLY.join(",")));
        params.push(("timezone".into(), self.options.timezone.clone()));

        let payload = match self.get_cached(Endpoint::Archive, params).await {
            Ok(p) => p,
            Err(e) => {
                warn!("Historical data unavailable for ({lat},{lon}): {}", e);
                return HistoricalData::unavailable(location, days, window, e.to_string());
            }
        };

        match parse_forecast(&payload, lat, lon, Provenance::ArchiveEstimate) {
            Ok(archive) if !archive.hourly.is_empty() => {
                HistoricalData::from_archive(archive.location, days, window, archive.hourly)
            }
            Ok(_) => HistoricalData::unavailable(
                location,
                days,
                window,
                "Data historis tidak tersedia untuk lokasi ini",
            ),
            Err(e) => {
                warn!("Historical payload for ({lat},{lon}) unreadable: {}", e);
                HistoricalData::unavailable(location, days, window, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves canned payloads per endpoint URL and records every call.
    struct MockTransport {
        marine: Option<Value>,
        weather: Option<Value>,
        archive: Option<Value>,
        calls: Mutex<Vec<String>>,
    }

    impl MockTransport {
        fn new(marine: Option<Value>, weather: Option<Value>, archive: Option<Value>) -> Self {
            Self {
                marine,
                weather,
                archive,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls_to(&self, fragment: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|url| url.contains(fragment))
                .count()
        }

        fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ForecastTransport for MockTransport {
        async fn get_json(&self, url: &str, _query: &[(String, String)]) -> Result<Value, Error> {
            self.calls.lock().unwrap().push(url.to_string());
            let payload = if url.contains("marine") {
                &self.marine
            } else if url.contains("archive") {
                &self.archive
            } else {
                &self.weather
            };
            payload
                .clone()
                .ok_or_else(|| Error::Http(format!("{} returned 503: unavailable", url)))
        }
    }

    fn marine_payload() -> Value {
        json!({
            "latitude": -6.1,
            "longitude": 106.8,
            "timezone": "Asia/Jakarta",
            "current": {"time": "2026-02-13T00:15", "interval": 900, "wave_height": 0.6},
            "hourly": {
                "time": ["2026-02-13T00:00", "2026-02-13T01:00"],
                "wave_height": [0.6, 0.7],
                "wave_period": [5.0, 5.5],
                "wave_direction": [120.0, 125.0]
            },
            "daily": {
                "time": ["2026-02-13"],
                "wave_height_max": [0.7]
            }
        })
    }

    fn offshore_gap_payload() -> Value {
        json!({
            "latitude": -7.5,
            "longitude": 110.0,
            "hourly": {
                "time": ["2026-02-13T00:00", "2026-02-13T01:00"],
                "wave_height": [null, null],
                "wave_period": [null, null]
            }
        })
    }

    fn weather_payload() -> Value {
        json!({
            "latitude": -6.1,
            "longitude": 106.8,
            "current": {"time": "2026-02-13T00:15", "wind_speed_10m": 36.0, "weather_code": 2},
            "hourly": {
                "time": ["2026-02-13T00:00", "2026-02-13T01:00"],
                "wind_speed_10m": [36.0, 54.0],
                "wind_direction_10m": [200.0, 210.0],
                "visibility": [24000.0, 20000.0],
                "weather_code": [2, 61],
                "precipitation": [0.0, 1.2]
            }
        })
    }

    fn archive_payload() -> Value {
        json!({
            "latitude": -6.1,
            "longitude": 106.8,
            "hourly": {
                "time": ["2026-02-12T00:00", "2026-02-12T01:00"],
                "wind_speed_10m": [18.0, 90.0],
                "surface_pressure": [1008.0, 1004.0]
            }
        })
    }

    fn client_for(transport: Arc<MockTransport>, ttl_secs: u64) -> MarineClient {
        let mut config = ServiceConfig::default();
        config.cache.ttl_secs = ttl_secs;
        config.upstream.requests_per_second = 1000;
        MarineClient::with_transport(transport, &config)
    }

    #[tokio::test]
    async fn test_identical_requests_within_ttl_hit_upstream_once() {
        let transport = Arc::new(MockTransport::new(Some(marine_payload()), None, None));
        let client = client_for(transport.clone(), 300);
        let opts = FetchOptions::default();

        let first = client.fetch_marine(-6.1, 106.8, &opts).await.expect("first fetch");
        let second = client.fetch_marine(-6.1, 106.8, &opts).await.expect("second fetch");

        assert_eq!(transport.total_calls(), 1, "second call must be served from cache");
        assert_eq!(first, second);
        assert_eq!(client.cache_stats().size, 1);

        client.clear_cache();
        assert_eq!(client.cache_stats().size, 0);

        client.fetch_marine(-6.1, 106.8, &opts).await.expect("refetch");
        assert_eq!(transport.total_calls(), 2, "cleared cache must refetch");
    }

    #[tokio::test]
    async fn test_different_options_are_cached_separately() {
        let transport = Arc::new(MockTransport::new(Some(marine_payload()), None, None));
        let client = client_for(transport.clone(), 300);

        let three_days = FetchOptions::default();
        let one_day = FetchOptions {
            forecast_days: 1,
            ..FetchOptions::default()
        };
        client.fetch_marine(-6.1, 106.8, &three_days).await.unwrap();
        client.fetch_marine(-6.1, 106.8, &one_day).await.unwrap();
        client.fetch_marine(-6.2, 106.8, &three_days).await.unwrap();

        assert_eq!(transport.total_calls(), 3);
        assert_eq!(client.cache_stats().size, 3);
    }

    #[tokio::test]
    async fn test_zero_ttl_never_serves_from_cache() {
        let transport = Arc::new(MockTransport::new(Some(marine_payload()), None, None));
        let client = client_for(transport.clone(), 0);
        let opts = FetchOptions::default();

        client.fetch_marine(-6.1, 106.8, &opts).await.unwrap();
        client.fetch_marine(-6.1, 106.8, &opts).await.unwrap();
        assert_eq!(transport.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_marine_payload_parsed_with_marine_provenance() {
        let transport = Arc::new(MockTransport::new(Some(marine_payload()), None, None));
        let client = client_for(transport, 300);

        let forecast = client
            .fetch_marine(-6.1, 106.8, &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(forecast.provenance, Provenance::Marine);
        assert_eq!(forecast.location.timezone.as_deref(), Some("Asia/Jakarta"));
        assert_eq!(forecast.hourly.value(fields::WAVE_HEIGHT, 1), Some(0.7));
        assert_eq!(forecast.daily.value(fields::WAVE_HEIGHT_MAX, 0), Some(0.7));
        assert_eq!(forecast.current.as_ref().unwrap().wave_height, Some(0.6));
    }

    #[tokio::test]
    async fn test_null_wave_series_falls_back_to_wind_estimate() {
        let transport = Arc::new(MockTransport::new(
            Some(offshore_gap_payload()),
            Some(weather_payload()),
            None,
        ));
        let client = client_for(transport.clone(), 300);

        let forecast = client
            .fetch_marine(-7.5, 110.0, &FetchOptions::default())
            .await
            .expect("fallback should succeed");

        assert_eq!(forecast.provenance, Provenance::WeatherFallback);
        // 36 km/h = 10 m/s → 1.5 m; 54 km/h = 15 m/s → 2.5 m
        assert_eq!(forecast.hourly.value(fields::WAVE_HEIGHT, 0), Some(1.5));
        assert_eq!(forecast.hourly.value(fields::WAVE_HEIGHT, 1), Some(2.5));
        assert_eq!(forecast.hourly.value(fields::WAVE_DIRECTION, 0), Some(200.0));
        assert_eq!(forecast.daily.value(fields::WAVE_HEIGHT_MAX, 0), Some(2.5));
        assert_eq!(
            forecast.daily.value(fields::WAVE_DIRECTION_DOMINANT, 0),
            Some(200.0)
        );
        assert_eq!(forecast.current.as_ref().unwrap().wave_height, Some(1.5));
        assert_eq!(transport.calls_to("marine"), 1);
        assert_eq!(transport.calls_to("/v1/forecast"), 1);
    }

    #[tokio::test]
    async fn test_fetch_conditions_merges_and_reuses_cached_weather() {
        let transport = Arc::new(MockTransport::new(
            Some(offshore_gap_payload()),
            Some(weather_payload()),
            None,
        ));
        let client = client_for(transport.clone(), 300);

        let forecast = client
            .fetch_conditions(-7.5, 110.0, &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(forecast.provenance, Provenance::WeatherFallback);
        assert_eq!(forecast.hourly.value(fields::WIND_SPEED, 1), Some(54.0));
        assert_eq!(forecast.hourly.value(fields::WEATHER_CODE, 1), Some(61.0));
        let current = forecast.current_sample();
        assert_eq!(current.wave_height, Some(1.5));
        assert_eq!(current.wind_speed, Some(36.0));
        assert_eq!(current.weather_code, Some(2));
        assert_eq!(
            transport.total_calls(),
            2,
            "fallback and merge share one cached weather response"
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_is_localized_and_not_retried() {
        let transport = Arc::new(MockTransport::new(None, None, None));
        let client = client_for(transport.clone(), 300);

        let err = client
            .fetch_marine(-6.1, 106.8, &FetchOptions::default())
            .await
            .expect_err("marine endpoint is down");

        match &err {
            Error::UpstreamUnavailable { endpoint, message } => {
                assert_eq!(endpoint, "marine");
                assert!(message.starts_with("Gagal mengambil prakiraan laut"), "{}", message);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_upstream());
        assert_eq!(transport.total_calls(), 1);
        assert_eq!(client.cache_stats().size, 0, "failures are not cached");
    }

    #[tokio::test]
    async fn test_historical_failure_returns_unavailable() {
        let transport = Arc::new(MockTransport::new(None, None, None));
        let client = client_for(transport, 300);
        let today = NaiveDate::from_ymd_opt(2026, 2, 13).unwrap();

        let data = client.fetch_historical_until(-6.1, 106.8, 7, today).await;

        assert!(!data.available);
        assert!(data.message.unwrap().contains("data historis"));
    }

    #[tokio::test]
    async fn test_historical_success_estimates_waves() {
        let transport = Arc::new(MockTransport::new(None, None, Some(archive_payload())));
        let client = client_for(transport, 300);
        let today = NaiveDate::from_ymd_opt(2026, 2, 13).unwrap();

        let data = client.fetch_historical_until(-6.1, 106.8, 365, today).await;

        assert!(data.available);
        assert_eq!(data.days, 92);
        assert_eq!(data.end_date, NaiveDate::from_ymd_opt(2026, 2, 12).unwrap());
        // 90 km/h = 25 m/s → storm bucket
        assert_eq!(data.hourly.value(fields::ESTIMATED_WAVE_HEIGHT, 1), Some(5.0));
        assert_eq!(data.summary.unwrap().max_estimated_wave_height, Some(5.0));
    }
}
