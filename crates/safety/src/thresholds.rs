//! Per-vessel-class safety limits.

use common::VesselClass;
use serde::{Deserialize, Serialize};

/// Safe/unsafe limits for one vessel class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    /// Max significant wave height (m).
    pub wave_height_max: f64,
    /// Max sustained wind speed (km/h).
    pub wind_speed_max: f64,
    /// Min wave period (s); shorter periods mean steeper, choppier seas.
    pub wave_period_min: f64,
    /// Min visibility (m).
    pub visibility_min: f64,
}

const SMALL_BOAT: ThresholdProfile = ThresholdProfile {
    wave_height_max: 1.25,
    wind_speed_max: 25.0,
    wave_period_min: 6.0,
    visibility_min: 2000.0,
};

const FISHING_BOAT: ThresholdProfile = ThresholdProfile {
    wave_height_max: 2.5,
    wind_speed_max: 40.0,
    wave_period_min: 5.0,
    visibility_min: 1000.0,
};

const LARGE_VESSEL: ThresholdProfile = ThresholdProfile {
    wave_height_max: 4.0,
    wind_speed_max: 60.0,
    wave_period_min: 4.0,
    visibility_min: 500.0,
};

pub fn profile_for(class: VesselClass) -> ThresholdProfile {
    match class {
        VesselClass::SmallBoat => SMALL_BOAT,
        VesselClass::FishingBoat => FISHING_BOAT,
        VesselClass::LargeVessel => LARGE_VESSEL,
    }
}

/// Profile for a vessel class name; unrecognized names get the fishing-boat profile.
pub fn profile_for_name(raw: &str) -> ThresholdProfile {
    profile_for(VesselClass::parse_or_default(raw))
}
