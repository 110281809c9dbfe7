//! Procedurally generates a city-like road network for a simulated world: an
//! irregular grid of streets laid out as rotated "patches", stitched together
//! with short connector roads, frayed at the world boundary for visual
//! irregularity, and merged into polygonal intersections wherever segments
//! cross.
//!
//! The pipeline runs leaves-first and is resumable; see [`LayoutGenerator`].
//! All randomness comes from an injected `XorShiftRng`, so a fixed seed
//! reproduces an identical layout.

#[macro_use]
extern crate log;

use std::fmt;

use rand::Rng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};

use geom::{Angle, Bounds, Distance, Pt2D, Ring};

pub use crate::generate::{DiscardProgress, GeneratedWorld, LayoutGenerator, ProgressSink};
pub use crate::segments::{EdgeKey, RawSegment, SegmentSet};

mod connectors;
mod fray;
mod generate;
mod intersections;
mod patch;
mod segments;

/// Identifies one of the rotated grid patches making up the layout.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PatchID(pub usize);

impl fmt::Display for PatchID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Patch #{}", self.0)
    }
}

/// Arterial roads occur periodically according to a patch's arterial
/// phase/period; everything else is a local road.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RoadClass {
    Arterial,
    Local,
}

/// One finished road segment, after trimming and fraying.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub pt1: Pt2D,
    pub pt2: Pt2D,
    pub width: Distance,
    pub class: RoadClass,
}

/// The contact point between a road and an intersection: a point on the
/// visual polygon's edge, the outward normal, and the road's width.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionConnector {
    pub pt: Pt2D,
    pub normal: Angle,
    pub width: Distance,
}

/// The visible shape of one intersection, with one connector per polygon
/// edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionData {
    pub polygon: Ring,
    pub connectors: Vec<IntersectionConnector>,
}

/// Everything the rest of the world reads about the layout, except the roads
/// themselves. Plain data; serialization and rendering are external
/// collaborators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldLayout {
    pub bounds: Bounds,
    pub park: Bounds,
    pub intersections: Vec<IntersectionData>,
}

/// All the tunables for one generation run. Distances are in meters. The
/// caller is responsible for supplying sane dimensions; nothing here is
/// validated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// The buildable rectangle.
    pub bounds: Bounds,
    /// A central rectangle kept free of roads.
    pub park: Bounds,

    pub patch_rows: usize,
    pub patch_cols: usize,
    /// How far a patch center may wander from its grid slot, as a fraction of
    /// the slot's extent.
    pub jitter: f64,
    /// Patch rotations snap to multiples of this.
    pub angle_step_degs: f64,
    /// Every Nth grid line is an arterial road, for a per-patch N in this
    /// inclusive range.
    pub period_min: usize,
    pub period_max: usize,
    /// Grid cell spacing within a patch.
    pub cell_min: Distance,
    pub cell_max: Distance,
    /// Grid lines extend this far past the world rectangle's rotated extents.
    pub extent_margin: Distance,
    /// Cell corner samples are inset by this fraction of the cell's extent
    /// before the validity test.
    pub corner_inset: f64,

    pub arterial_width: Distance,
    pub local_width: Distance,
    pub sidewalk_width: Distance,
    /// Extra room past the sidewalk before a road is trimmed back from an
    /// intersection.
    pub clearance: Distance,
    /// How far the visual polygon sits back from the road's edge.
    pub visual_setback: Distance,

    /// A connector must travel at least this far...
    pub min_reach: Distance,
    /// ...and at most this far to reach another patch.
    pub max_reach: Distance,
    /// No two connector endpoints may be closer than this.
    pub min_connector_spacing: Distance,
    /// Along a boundary stripe, try a connector every N cells.
    pub stripe_sample_every: usize,
    /// A stripe only gets connectors if none exists within this many
    /// max-sized cells of it.
    pub stripe_clearance_cells: f64,

    /// Segment endpoints within this distance of the world boundary get
    /// frayed.
    pub fray_radius: Distance,
    /// Fray adjustments are drawn from this range; negative retracts.
    pub fray_min: Distance,
    pub fray_max: Distance,
}

impl Config {
    /// Reasonable defaults for a square world with a centered square park.
    pub fn new(world_size: Distance, park_size: Distance) -> Config {
        let bounds = Bounds::rect(world_size, world_size);
        let park = if park_size > Distance::ZERO {
            Bounds::rect_centered_on(bounds.center(), park_size, park_size)
        } else {
            Bounds::new()
        };
        Config {
            bounds,
            park,
            patch_rows: 3,
            patch_cols: 3,
            jitter: 0.35,
            angle_step_degs: 15.0,
            period_min: 3,
            period_max: 5,
            cell_min: Distance::meters(18.0),
            cell_max: Distance::meters(35.0),
            extent_margin: Distance::meters(10.0),
            corner_inset: 0.15,
            arterial_width: Distance::meters(8.0),
            local_width: Distance::meters(5.5),
            sidewalk_width: Distance::meters(2.0),
            clearance: Distance::meters(1.0),
            visual_setback: Distance::meters(0.6),
            min_reach: Distance::meters(4.0),
            max_reach: Distance::meters(60.0),
            min_connector_spacing: Distance::meters(20.0),
            stripe_sample_every: 3,
            stripe_clearance_cells: 2.5,
            fray_radius: Distance::meters(15.0),
            fray_min: Distance::meters(-8.0),
            fray_max: Distance::meters(10.0),
        }
    }

    pub fn width(&self, class: RoadClass) -> Distance {
        match class {
            RoadClass::Arterial => self.arterial_width,
            RoadClass::Local => self.local_width,
        }
    }

    /// Crossing points closer together than this collapse into one
    /// intersection. Tied to the physical road and sidewalk geometry.
    pub fn merge_distance(&self) -> Distance {
        self.arterial_width.max(self.local_width)
            + (self.sidewalk_width + self.clearance) * 2.0
    }
}

pub(crate) fn rand_dist(rng: &mut XorShiftRng, low: Distance, high: Distance) -> Distance {
    Distance::meters(rng.gen_range(low.inner_meters()..high.inner_meters()))
}
