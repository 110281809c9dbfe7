use std::fmt;

use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::{deserialize_f64, serialize_f64, trim_f64, Angle, Distance};

/// This represents world-space in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    x: f64,
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        if !x.is_finite() || !y.is_finite() {
            panic!("Bad Pt2D {}, {}", x, y);
        }

        Pt2D {
            x: trim_f64(x),
            y: trim_f64(y),
        }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn offset(self, dx: f64, dy: f64) -> Pt2D {
        Pt2D::new(self.x() + dx, self.y() + dy)
    }

    // If negative, caller should use theta.opposite()
    pub fn project_away(self, dist: Distance, theta: Angle) -> Pt2D {
        assert!(dist >= Distance::ZERO);

        let (sin, cos) = theta.normalized_radians().sin_cos();
        Pt2D::new(
            self.x() + dist.inner_meters() * cos,
            self.y() + dist.inner_meters() * sin,
        )
    }

    pub fn angle_to(self, to: Pt2D) -> Angle {
        // DON'T invert y here
        Angle::new_rads((to.y() - self.y()).atan2(to.x() - self.x()))
    }

    pub fn dist_to(self, to: Pt2D) -> Distance {
        Distance::meters(((self.x() - to.x()).powi(2) + (self.y() - to.y()).powi(2)).sqrt())
    }

    pub fn approx_eq(self, other: Pt2D, threshold: Distance) -> bool {
        self.dist_to(other) <= threshold
    }

    /// The average of the given points.
    pub fn center(pts: &[Pt2D]) -> Pt2D {
        if pts.is_empty() {
            panic!("Can't find center of 0 points");
        }
        let mut x = 0.0;
        let mut y = 0.0;
        for pt in pts {
            x += pt.x();
            y += pt.y();
        }
        let len = pts.len() as f64;
        Pt2D::new(x / len, y / len)
    }

    pub fn to_hashable(self) -> HashablePt2D {
        HashablePt2D {
            x_nan: NotNan::new(self.x()).unwrap(),
            y_nan: NotNan::new(self.y()).unwrap(),
        }
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({0}, {1})", self.x(), self.y())
    }
}

/// This represents world space, NOT LonLat.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct HashablePt2D {
    x_nan: NotNan<f64>,
    y_nan: NotNan<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_precision() {
        let pt = Pt2D::new(1.000049, 2.0);
        assert_eq!(pt.x(), 1.0);
        assert_eq!(pt.y(), 2.0);
    }

    #[test]
    fn project_away() {
        let pt = Pt2D::new(10.0, 10.0);
        let moved = pt.project_away(Distance::meters(5.0), Angle::degrees(90.0));
        assert!(moved.approx_eq(Pt2D::new(10.0, 15.0), Distance::meters(0.001)));
    }

    #[test]
    fn stable_serialization() {
        let pt = Pt2D::new(1.00005, 2.0);
        assert_eq!(
            serde_json::to_string(&pt).unwrap(),
            "{\"x\":1.0001,\"y\":2.0}"
        );
    }

    #[test]
    fn center() {
        let center = Pt2D::center(&[Pt2D::new(0.0, 0.0), Pt2D::new(4.0, 2.0)]);
        assert_eq!(center, Pt2D::new(2.0, 1.0));
    }
}
