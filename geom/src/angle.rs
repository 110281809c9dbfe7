use std::{f64, fmt};

use serde::{Deserialize, Serialize};

/// An angle, stored in radians. Following the y-down convention, 90 degrees
/// points down the screen.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new_rads(rads: f64) -> Angle {
        Angle(rads)
    }

    pub fn degrees(degs: f64) -> Angle {
        Angle(degs.to_radians())
    }

    pub fn opposite(self) -> Angle {
        Angle(self.0 + f64::consts::PI)
    }

    pub fn rotate_degs(self, degrees: f64) -> Angle {
        Angle(self.0 + degrees.to_radians())
    }

    /// The angle in [0, 2pi).
    pub fn normalized_radians(self) -> f64 {
        self.0.rem_euclid(2.0 * f64::consts::PI)
    }

    pub fn normalized_degrees(self) -> f64 {
        self.normalized_radians().to_degrees()
    }

    /// Rounds to the nearest multiple of `step_degs`.
    pub fn snap_to_degs(self, step_degs: f64) -> Angle {
        Angle::degrees((self.normalized_degrees() / step_degs).round() * step_degs)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}
