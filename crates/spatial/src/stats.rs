//! Scan result types and their summary statistics.

use common::{Coordinate, Provenance, SafetyLevel};
use serde::{Deserialize, Serialize};

use crate::geo::round2;

/// Neutral score given to points that could not be assessed.
pub const PLACEHOLDER_SCORE: f64 = 50.0;

/// Safety verdict for a single scanned coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSafety {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub score: f64,
    pub level: SafetyLevel,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PointSafety {
    /// Stand-in for a point whose lookup failed.
    pub fn placeholder(coordinate: Coordinate, error: impl Into<String>) -> Self {
        Self {
            coordinate,
            score: PLACEHOLDER_SCORE,
            level: SafetyLevel::Unknown,
            provenance: Provenance::Error,
            wave_height: None,
            wind_speed: None,
            error: Some(error.into()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.level == SafetyLevel::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub row: usize,
    pub col: usize,
    #[serde(flatten)]
    pub safety: PointSafety,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub index: usize,
    #[serde(flatten)]
    pub safety: PointSafety,
}

/// One value per safety level, keyed by the level's wire name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelTally<T> {
    #[serde(rename = "AMAN")]
    pub aman: T,
    #[serde(rename = "HATI-HATI")]
    pub hati_hati: T,
    #[serde(rename = "BERISIKO")]
    pub berisiko: T,
    #[serde(rename = "BERBAHAYA")]
    pub berbahaya: T,
    #[serde(rename = "UNKNOWN")]
    pub unknown: T,
}

impl<T: Copy> LevelTally<T> {
    pub fn get(&self, level: SafetyLevel) -> T {
        match level {
            SafetyLevel::Aman => self.aman,
            SafetyLevel::HatiHati => self.hati_hati,
            SafetyLevel::Berisiko => self.berisiko,
            SafetyLevel::Berbahaya => self.berbahaya,
            SafetyLevel::Unknown => self.unknown,
        }
    }

    fn map<U>(&self, f: impl Fn(T) -> U) -> LevelTally<U> {
        LevelTally {
            aman: f(self.aman),
            hati_hati: f(self.hati_hati),
            berisiko: f(self.berisiko),
            berbahaya: f(self.berbahaya),
            unknown: f(self.unknown),
        }
    }
}

impl LevelTally<usize> {
    pub fn count<'a>(points: impl IntoIterator<Item = &'a PointSafety>) -> Self {
        let mut tally = Self::default();
        for point in points {
            let slot = match point.level {
                SafetyLevel::Aman => &mut tally.aman,
                SafetyLevel::HatiHati => &mut tally.hati_hati,
                SafetyLevel::Berisiko => &mut tally.berisiko,
                SafetyLevel::Berbahaya => &mut tally.berbahaya,
                SafetyLevel::Unknown => &mut tally.unknown,
            };
            *slot += 1;
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.aman + self.hati_hati + self.berisiko + self.berbahaya + self.unknown
    }

    /// Share of each level in percent, rounded to 2 decimals.
    pub fn percentages(&self) -> LevelTally<f64> {
        let total = self.total();
        if total == 0 {
            return LevelTally::default();
        }
        self.map(|n| round2(n as f64 * 100.0 / total as f64))
    }
}

fn mean_score<'a>(points: impl IntoIterator<Item = &'a PointSafety>) -> Option<f64> {
    let (sum, n) = points
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), p| (sum + p.score, n + 1));
    (n > 0).then(|| round2(sum / n as f64))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStats {
    pub total_points: usize,
    pub assessed_points: usize,
    pub failed_points: usize,
    pub counts: LevelTally<usize>,
    pub percentages: LevelTally<f64>,
    /// Mean over all points, placeholders included at their neutral score.
    pub mean_score: Option<f64>,
    pub mean_level: Option<SafetyLevel>,
}

impl ZoneStats {
    pub fn from_points(points: &[GridPoint]) -> Self {
        let safety: Vec<&PointSafety> = points.iter().map(|p| &p.safety).collect();
        let counts = LevelTally::count(safety.iter().copied());
        let mean = mean_score(safety.iter().copied());
        let failed = safety.iter().filter(|p| p.is_placeholder()).count();
        Self {
            total_points: points.len(),
            assessed_points: points.len() - failed,
            failed_points: failed,
            counts,
            percentages: counts.percentages(),
            mean_score: mean,
            mean_level: mean.map(SafetyLevel::from_score),
        }
    }
}

/// A score and the waypoint it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaypointScore {
    pub index: usize,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStats {
    pub waypoint_count: usize,
    pub mean_score: Option<f64>,
    /// Lowest score; the earliest waypoint wins a tie.
    pub min: Option<WaypointScore>,
    pub max: Option<WaypointScore>,
    /// Level of the mean score.
    pub overall_level: Option<SafetyLevel>,
    pub counts: LevelTally<usize>,
}

impl RouteStats {
    pub fn from_waypoints(waypoints: &[Waypoint]) -> Self {
        let mean = mean_score(waypoints.iter().map(|w| &w.safety));
        let scored = waypoints.iter().map(|w| WaypointScore {
            index: w.index,
            score: w.safety.score,
        });
        let min = scored
            .clone()
            .reduce(|lo, w| if w.score < lo.score { w } else { lo });
        let max = scored.reduce(|hi, w| if w.score > hi.score { w } else { hi });

        Self {
            waypoint_count: waypoints.len(),
            mean_score: mean,
            min,
            max,
            overall_level: mean.map(SafetyLevel::from_score),
            counts: LevelTally::count(waypoints.iter().map(|w| &w.safety)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_point(score: f64, level: SafetyLevel) -> PointSafety {
        PointSafety {
            coordinate: Coordinate::new(-6.0, 106.0),
            score,
            level,
            provenance: Provenance::Marine,
            wave_height: Some(0.5),
            wind_speed: Some(10.0),
            error: None,
        }
    }

    fn make_grid(points: Vec<PointSafety>) -> Vec<GridPoint> {
        points
            .into_iter()
            .enumerate()
            .map(|(i, safety)| GridPoint { row: i / 2, col: i % 2, safety })
            .collect()
    }

    #[test]
    fn test_zone_stats_counts_and_percentages() {
        let grid = make_grid(vec![
            make_point(90.0, SafetyLevel::Aman),
            make_point(85.0, SafetyLevel::Aman),
            make_point(30.0, SafetyLevel::Berbahaya),
            PointSafety::placeholder(Coordinate::new(0.0, 0.0), "timeout"),
        ]);

        let stats = ZoneStats::from_points(&grid);
        assert_eq!(stats.total_points, 4);
        assert_eq!(stats.failed_points, 1);
        assert_eq!(stats.assessed_points, 3);
        assert_eq!(stats.counts.get(SafetyLevel::Aman), 2);
        assert_eq!(stats.percentages.aman, 50.0);
        assert_eq!(stats.percentages.unknown, 25.0);
        assert_eq!(stats.mean_score, Some(63.75));
        assert_eq!(stats.mean_level, Some(SafetyLevel::HatiHati));
    }

    #[test]
    fn test_empty_zone_stats() {
        let stats = ZoneStats::from_points(&[]);
        assert_eq!(stats.mean_score, None);
        assert_eq!(stats.percentages, LevelTally::default());
    }

    #[test]
    fn test_route_stats_min_max_and_level() {
        let waypoints: Vec<Waypoint> = [82.0, 35.0, 35.0, 91.0]
            .into_iter()
            .enumerate()
            .map(|(index, score)| Waypoint {
                index,
                safety: make_point(score, SafetyLevel::from_score(score)),
            })
            .collect();

        let stats = RouteStats::from_waypoints(&waypoints);
        assert_eq!(stats.waypoint_count, 4);
        assert_eq!(stats.min, Some(WaypointScore { index: 1, score: 35.0 }), "earliest minimum");
        assert_eq!(stats.max, Some(WaypointScore { index: 3, score: 91.0 }));
        assert_eq!(stats.mean_score, Some(60.75));
        assert_eq!(stats.overall_level, Some(SafetyLevel::HatiHati));
        assert_eq!(stats.counts.berbahaya, 2);
    }

    #[test]
    fn test_placeholder_serializes_with_error_provenance() {
        let point = PointSafety::placeholder(Coordinate::new(1.5, 2.5), "upstream down");
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["lat"], 1.5);
        assert_eq!(json["score"], 50.0);
        assert_eq!(json["level"], "UNKNOWN");
        assert_eq!(json["provenance"], "error");
        assert!(json.get("wave_height").is_none());
    }
}
