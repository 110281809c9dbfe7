use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Pt2D, EPSILON_DIST};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    /// Creates a line segment between two points, which must not be the same.
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Result<Line> {
        if pt1.dist_to(pt2) <= EPSILON_DIST {
            bail!("Line from {} to {} too small", pt1, pt2);
        }
        Ok(Line(pt1, pt2))
    }

    /// Equivalent to `Line::new(pt1, pt2).unwrap()`. Use this to effectively document an assertion
    /// at the call-site.
    pub fn must_new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line::new(pt1, pt2).unwrap()
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> Distance {
        self.pt1().dist_to(self.pt2())
    }

    pub fn angle(&self) -> Angle {
        self.pt1().angle_to(self.pt2())
    }

    /// An unbounded point along the line, by fraction of its length. 0 is `pt1`, 1 is `pt2`.
    pub fn percent_along(&self, percent: f64) -> Pt2D {
        Pt2D::new(
            self.pt1().x() + percent * (self.pt2().x() - self.pt1().x()),
            self.pt1().y() + percent * (self.pt2().y() - self.pt1().y()),
        )
    }

    /// Does this line strictly cross the other? Two segments that only touch at an endpoint of
    /// both don't count; an endpoint of one lying in the interior of the other does.
    pub fn crosses(&self, other: &Line) -> bool {
        // The orientation test below degenerates for collinear triples, so settle shared
        // endpoints first. Points are trimmed, so exact comparison works.
        if self.pt1() == other.pt1()
            || self.pt1() == other.pt2()
            || self.pt2() == other.pt1()
            || self.pt2() == other.pt2()
        {
            return false;
        }
        // From http://bryceboe.com/2006/10/23/line-segment-intersection-algorithm/
        is_counter_clockwise(self.pt1(), other.pt1(), other.pt2())
            != is_counter_clockwise(self.pt2(), other.pt1(), other.pt2())
            && is_counter_clockwise(self.pt1(), self.pt2(), other.pt1())
                != is_counter_clockwise(self.pt1(), self.pt2(), other.pt2())
    }

    /// The crossing point of two segments, if they strictly cross.
    pub fn intersection(&self, other: &Line) -> Option<Pt2D> {
        if !self.crosses(other) {
            return None;
        }
        self.infinite().intersection(&other.infinite())
    }

    pub fn infinite(&self) -> InfiniteLine {
        InfiniteLine(self.pt1(), self.angle())
    }

    /// The closest point on this segment to the given point.
    pub fn project_pt(&self, pt: Pt2D) -> Pt2D {
        let dx = self.pt2().x() - self.pt1().x();
        let dy = self.pt2().y() - self.pt1().y();
        let t = ((pt.x() - self.pt1().x()) * dx + (pt.y() - self.pt1().y()) * dy)
            / (dx * dx + dy * dy);
        self.percent_along(t.clamp(0.0, 1.0))
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line({}, {})", self.pt1(), self.pt2())
    }
}

fn is_counter_clockwise(pt1: Pt2D, pt2: Pt2D, pt3: Pt2D) -> bool {
    (pt3.y() - pt1.y()) * (pt2.x() - pt1.x()) > (pt2.y() - pt1.y()) * (pt3.x() - pt1.x())
}

/// A line of infinite length, in point-direction form.
#[derive(Clone, Copy, Debug)]
pub struct InfiniteLine(Pt2D, Angle);

impl InfiniteLine {
    pub fn from_pt_angle(pt: Pt2D, angle: Angle) -> InfiniteLine {
        InfiniteLine(pt, angle)
    }

    /// None if the two lines are parallel.
    pub fn intersection(&self, other: &InfiniteLine) -> Option<Pt2D> {
        let (sin1, cos1) = self.1.normalized_radians().sin_cos();
        let (sin2, cos2) = other.1.normalized_radians().sin_cos();
        let denom = cos1 * sin2 - sin1 * cos2;
        if denom.abs() < 1e-9 {
            return None;
        }
        let wx = other.0.x() - self.0.x();
        let wy = other.0.y() - self.0.y();
        let t = (wx * sin2 - wy * cos2) / denom;
        Some(self.0.offset(t * cos1, t * sin1))
    }
}
