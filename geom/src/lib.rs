//! Geometry primitives for the street generator. Everything lives in
//! world-space meters, with positive y pointing down the screen.

use serde::{Deserialize, Deserializer, Serializer};

pub use crate::angle::Angle;
pub use crate::bounds::Bounds;
pub use crate::distance::Distance;
pub use crate::line::{InfiniteLine, Line};
pub use crate::pt::{HashablePt2D, Pt2D};
pub use crate::ring::Ring;

mod angle;
mod bounds;
mod distance;
mod line;
mod pt;
mod ring;

/// About 0.1 mm, below the precision kept through serialization.
pub const EPSILON_DIST: Distance = Distance::const_meters(0.0001);

/// Reduce the precision of an f64. This helps ensure serialization is
/// stable, and that two runs from the same seed stay byte-identical.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

pub(crate) fn serialize_f64<S: Serializer>(x: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(trim_f64(*x))
}

pub(crate) fn deserialize_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    f64::deserialize(d)
}
