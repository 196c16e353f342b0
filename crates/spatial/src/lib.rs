//! Spatial safety scans: grids around a point and routes between two points.

pub mod geo;
pub mod service;
pub mod stats;
pub mod throttle;

pub use geo::{generate_grid, haversine_km, interpolate_route, GridCell};
pub use service::{RouteSegment, SafetyGrid, SafetyRoute, SafetyService};
pub use stats::{GridPoint, LevelTally, PointSafety, RouteStats, Waypoint, ZoneStats};
pub use throttle::{run_throttled, ScanPolicy};
