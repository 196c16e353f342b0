//! Safety service: point assessments plus grid and route scans.

use common::config::{ScanConfig, ServiceConfig};
use common::{Coordinate, Error, Forecast, Result, VesselClass};
use marine_client::{CacheStats, FetchOptions, HistoricalData, MarineClient};
use safety::{assess_forecast, assess_sample, profile_for, AssessOptions, SafetyAssessment};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::geo::{generate_grid, haversine_km, interpolate_route, round2};
use crate::stats::{GridPoint, PointSafety, RouteStats, Waypoint, ZoneStats};
use crate::throttle::{run_throttled, ScanPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyGrid {
    pub center: Coordinate,
    pub radius_km: f64,
    pub grid_size: usize,
    pub vessel_class: VesselClass,
    #[serde(rename = "zones")]
    pub points: Vec<GridPoint>,
    pub statistics: ZoneStats,
}

/// Route geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub start: Coordinate,
    pub end: Coordinate,
    /// Great-circle distance start to end, rounded to 2 decimals.
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRoute {
    pub route: RouteSegment,
    pub vessel_class: VesselClass,
    pub waypoints: Vec<Waypoint>,
    pub overall_safety: RouteStats,
}

/// Entry point for every safety query. Owns one client and therefore one cache.
#[derive(Debug, Clone)]
pub struct SafetyService {
    client: MarineClient,
    scan: ScanConfig,
    assess: AssessOptions,
}

impl SafetyService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Ok(Self::with_client(MarineClient::new(config)?, config))
    }

    pub fn with_client(client: MarineClient, config: &ServiceConfig) -> Self {
        Self {
            client,
            scan: config.scan.clone(),
            assess: AssessOptions::from(&config.forecast),
        }
    }

    pub fn client(&self) -> &MarineClient {
        &self.client
    }

    fn fetch_options(&self) -> FetchOptions {
        self.client.default_options().clone()
    }

    /// Merged marine + atmospheric forecast for a coordinate.
    pub async fn forecast(&self, at: Coordinate) -> Result<Forecast> {
        at.validate()?;
        self.client
            .fetch_conditions(at.lat, at.lon, &self.fetch_options())
            .await
    }

    /// Full assessment (current, horizon, recommendations) for one point.
    pub async fn assess_point(&self, at: Coordinate, vessel: VesselClass) -> Result<SafetyAssessment> {
        let forecast = self.forecast(at).await?;
        Ok(assess_forecast(&forecast, vessel, &self.assess))
    }

    /// Current-conditions verdict for one scan point. Never fails: a failed
    /// lookup becomes a neutral placeholder.
    async fn scan_point(&self, at: Coordinate, vessel: VesselClass) -> PointSafety {
        match self.forecast(at).await {
            Ok(forecast) => {
                let sample = forecast.current_sample();
                let (_, composite) = assess_sample(&sample, &profile_for(vessel));
                PointSafety {
                    coordinate: at,
                    score: composite.score,
                    level: composite.level,
                    provenance: forecast.provenance,
                    wave_height: sample.wave_height,
                    wind_speed: sample.wind_speed,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Scan point ({},{}) degraded to placeholder: {}", at.lat, at.lon, e);
                PointSafety::placeholder(at, e.to_string())
            }
        }
    }

    /// Score an N×N grid around `center`.
    pub async fn generate_safety_grid(
        &self,
        center: Coordinate,
        radius_km: f64,
        grid_size: usize,
        vessel: VesselClass,
    ) -> Result<SafetyGrid> {
        let cells = generate_grid(center, radius_km, grid_size)?;
        let policy = ScanPolicy::grid(&self.scan);
        debug!(
            "Grid scan of {} points around ({},{}), {} at a time",
            cells.len(),
            center.lat,
            center.lon,
            policy.concurrency
        );

        let points = run_throttled(cells, policy, |cell| async move {
            GridPoint {
                row: cell.row,
                col: cell.col,
                safety: self.scan_point(cell.coordinate, vessel).await,
            }
        })
        .await;

        let statistics = ZoneStats::from_points(&points);
        info!(
            "Grid scan done: {} points, {} failed, mean score {:?}",
            statistics.total_points, statistics.failed_points, statistics.mean_score
        );

        Ok(SafetyGrid {
            center,
            radius_km,
            grid_size,
            vessel_class: vessel,
            points,
            statistics,
        })
    }

    /// Score `waypoints + 1` points along the straight line from `start` to `end`, in order.
    pub async fn generate_safety_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        waypoints: usize,
        vessel: VesselClass,
    ) -> Result<SafetyRoute> {
        let coords = interpolate_route(start, end, waypoints)?;
        let indexed: Vec<(usize, Coordinate)> = coords.into_iter().enumerate().collect();

        let scanned = run_throttled(indexed, ScanPolicy::route(&self.scan), |(index, at)| async move {
            Waypoint {
                index,
                safety: self.scan_point(at, vessel).await,
            }
        })
        .await;

        let route = RouteSegment {
            start,
            end,
            distance_km: round2(haversine_km(start, end)),
        };
        let overall_safety = RouteStats::from_waypoints(&scanned);
        info!(
            "Route scan done: {} waypoints over {} km, min {:?}",
            overall_safety.waypoint_count, route.distance_km, overall_safety.min
        );

        Ok(SafetyRoute {
            route,
            vessel_class: vessel,
            waypoints: scanned,
            overall_safety,
        })
    }

    /// Archived conditions for context. Unavailable data is reported, not raised.
    pub async fn history(&self, at: Coordinate, days: u32) -> Result<HistoricalData> {
        at.validate()?;
        if days == 0 {
            return Err(Error::InvalidInput("days must be at least 1".into()));
        }
        Ok(self.client.fetch_historical(at.lat, at.lon, days).await)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.client.cache_stats()
    }

    pub fn clear_cache(&self) {
        self.client.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::{Provenance, SafetyLevel};
    use marine_client::ForecastTransport;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Calm seas everywhere, except that latitudes north of `fail_above` error out.
    struct MockSea {
        fail_above: f64,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MockSea {
        fn new(fail_above: f64) -> Self {
            Self {
                fail_above,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    fn param<'a>(query: &'a [(String, String)], name: &str) -> &'a str {
        query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    #[async_trait]
    impl ForecastTransport for MockSea {
        async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let lat: f64 = param(query, "latitude").parse().unwrap_or_default();
            if lat > self.fail_above {
                return Err(Error::Http(format!("{url} returned 500")));
            }

            let time = json!(["2026-05-01T00:00", "2026-05-01T01:00"]);
            if url.contains("marine") {
                Ok(json!({
                    "latitude": lat,
                    "longitude": 0.0,
                    "hourly": {"time": time, "wave_height": [0.5, 0.6], "wave_period": [9.0, 9.0]}
                }))
            } else {
                Ok(json!({
                    "latitude": lat,
                    "longitude": 0.0,
                    "hourly": {
                        "time": time,
                        "wind_speed_10m": [10.0, 12.0],
                        "visibility": [20000.0, 20000.0],
                        "weather_code": [0, 1],
                        "precipitation": [0.0, 0.0]
                    }
                }))
            }
        }
    }

    fn make_service(sea: Arc<MockSea>) -> SafetyService {
        let mut config = ServiceConfig::default();
        config.upstream.requests_per_second = 10_000;
        config.scan.grid_batch_pause_ms = 1;
        config.scan.route_delay_ms = 1;
        let client = MarineClient::with_transport(sea, &config);
        SafetyService::with_client(client, &config)
    }

    #[tokio::test]
    async fn test_assess_point_runs_full_pipeline() {
        let sea = Arc::new(MockSea::new(90.0));
        let service = make_service(sea.clone());

        let data = service
            .assess_point(Coordinate::new(-6.1, 106.8), VesselClass::FishingBoat)
            .await
            .expect("assessment");

        assert_eq!(data.provenance, Provenance::Marine);
        assert_eq!(data.current_conditions.level, SafetyLevel::Aman);
        assert_eq!(sea.calls.load(Ordering::SeqCst), 2, "one marine and one weather call");

        assert!(service
            .assess_point(Coordinate::new(120.0, 0.0), VesselClass::FishingBoat)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_grid_scan_degrades_failed_points() {
        let sea = Arc::new(MockSea::new(0.05));
        let service = make_service(sea.clone());

        let grid = service
            .generate_safety_grid(Coordinate::new(0.0, 0.0), 11.1, 3, VesselClass::SmallBoat)
            .await
            .expect("grid");

        assert_eq!(grid.points.len(), 9);
        // Top row (lat +0.1) fails, the rest are calm.
        for point in &grid.points {
            if point.row == 2 {
                assert_eq!(point.safety.level, SafetyLevel::Unknown);
                assert_eq!(point.safety.score, 50.0);
                assert_eq!(point.safety.provenance, Provenance::Error);
            } else {
                assert_eq!(point.safety.level, SafetyLevel::Aman, "row {}", point.row);
            }
        }
        assert_eq!(grid.statistics.failed_points, 3);
        assert_eq!(grid.statistics.counts.aman, 6);
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json["zones"].as_array().map(Vec::len), Some(9));
        assert!(
            sea.peak.load(Ordering::SeqCst) <= 3,
            "grid scan must not exceed its batch concurrency"
        );
    }

    #[tokio::test]
    async fn test_grid_rejects_bad_parameters_before_fetching() {
        let sea = Arc::new(MockSea::new(90.0));
        let service = make_service(sea.clone());

        let err = service
            .generate_safety_grid(Coordinate::new(0.0, 0.0), 500.0, 3, VesselClass::SmallBoat)
            .await;
        assert!(matches!(err, Err(Error::InvalidInput(_))));
        assert_eq!(sea.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_route_scan_is_ordered_and_sequential() {
        let sea = Arc::new(MockSea::new(90.0));
        let service = make_service(sea.clone());
        let start = Coordinate::new(-6.1, 106.8);
        let end = Coordinate::new(-5.9, 107.2);

        let route = service
            .generate_safety_route(start, end, 4, VesselClass::FishingBoat)
            .await
            .expect("route");

        assert_eq!(route.waypoints.len(), 5);
        let indices: Vec<usize> = route.waypoints.iter().map(|w| w.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(route.waypoints[0].safety.coordinate, start);
        assert_eq!(route.waypoints[4].safety.coordinate, end);
        assert_eq!(sea.peak.load(Ordering::SeqCst), 1, "route waypoints run one at a time");
        assert_eq!(route.overall_safety.overall_level, Some(SafetyLevel::Aman));
        assert!(route.route.distance_km > 0.0);

        let json = serde_json::to_value(&route).unwrap();
        assert!(json["route"]["distance_km"].is_number());
        assert_eq!(json["waypoints"].as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn test_cache_shared_across_queries_and_clearable() {
        let sea = Arc::new(MockSea::new(90.0));
        let service = make_service(sea.clone());
        let at = Coordinate::new(-6.1, 106.8);

        service.assess_point(at, VesselClass::SmallBoat).await.unwrap();
        service.assess_point(at, VesselClass::LargeVessel).await.unwrap();
        assert_eq!(sea.calls.load(Ordering::SeqCst), 2, "second vessel class reuses cache");
        assert_eq!(service.cache_stats().size, 2);

        service.clear_cache();
        assert_eq!(service.cache_stats().size, 0);
    }

    #[tokio::test]
    async fn test_history_validates_and_never_raises_upstream_errors() {
        let sea = Arc::new(MockSea::new(0.0));
        let service = make_service(sea);

        assert!(service.history(Coordinate::new(0.0, 0.0), 0).await.is_err());

        let data = service
            .history(Coordinate::new(10.0, 0.0), 7)
            .await
            .expect("unavailable data is not an error");
        assert!(!data.available);
    }
}
