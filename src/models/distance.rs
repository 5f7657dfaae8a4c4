use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance in kilometers, the unit of every planner-facing value
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DistanceKm(pub f64);

impl DistanceKm {
    pub const ZERO: DistanceKm = DistanceKm(0.0);

    pub fn as_km(self) -> f64 {
        self.0
    }

    pub fn to_meters(self) -> DistanceMeters {
        DistanceMeters(self.0 * 1000.0)
    }
}

impl fmt::Display for DistanceKm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}km", self.0)
    }
}

/// Distance in meters
/// Graph edges and shortest-path lengths are stored in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DistanceMeters(pub f64);

impl DistanceMeters {
    pub fn to_km(self) -> DistanceKm {
        DistanceKm(self.0 / 1000.0)
    }
}

impl fmt::Display for DistanceMeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}m", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_conversion() {
        assert_eq!(DistanceKm(5.0).to_meters(), DistanceMeters(5000.0));
        assert_eq!(DistanceMeters(250.0).to_km().as_km(), 0.25);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", DistanceKm(5.123)), "5.12km");
        assert_eq!(format!("{}", DistanceMeters(150.5)), "150.5m");
    }
}
