use serde::{Deserialize, Serialize};

use crate::{Distance, Line, Pt2D};

/// Represents a rectangular boundary of a map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new() -> Bounds {
        Bounds {
            min_x: f64::MAX,
            min_y: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
        }
    }

    /// A rectangle from (0, 0) to (width, height).
    pub fn rect(width: Distance, height: Distance) -> Bounds {
        Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: width.inner_meters(),
            max_y: height.inner_meters(),
        }
    }

    /// A rectangle of the given size, centered on a point.
    pub fn rect_centered_on(center: Pt2D, width: Distance, height: Distance) -> Bounds {
        Bounds {
            min_x: center.x() - width.inner_meters() / 2.0,
            min_y: center.y() - height.inner_meters() / 2.0,
            max_x: center.x() + width.inner_meters() / 2.0,
            max_y: center.y() + height.inner_meters() / 2.0,
        }
    }

    pub fn from(pts: &[Pt2D]) -> Bounds {
        let mut b = Bounds::new();
        for pt in pts {
            b.update(*pt);
        }
        b
    }

    pub fn update(&mut self, pt: Pt2D) {
        self.min_x = self.min_x.min(pt.x());
        self.max_x = self.max_x.max(pt.x());
        self.min_y = self.min_y.min(pt.y());
        self.max_y = self.max_y.max(pt.y());
    }

    pub fn contains(&self, pt: Pt2D) -> bool {
        pt.x() >= self.min_x && pt.x() <= self.max_x && pt.y() >= self.min_y && pt.y() <= self.max_y
    }

    pub fn get_corners(&self) -> Vec<Pt2D> {
        vec![
            Pt2D::new(self.min_x, self.min_y),
            Pt2D::new(self.max_x, self.min_y),
            Pt2D::new(self.max_x, self.max_y),
            Pt2D::new(self.min_x, self.max_y),
        ]
    }

    pub fn center(&self) -> Pt2D {
        Pt2D::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn width(&self) -> Distance {
        Distance::meters(self.max_x - self.min_x)
    }

    pub fn height(&self) -> Distance {
        Distance::meters(self.max_y - self.min_y)
    }

    /// The piece of the segment inside the rectangle, using Liang-Barsky clipping. None if the
    /// segment lies entirely outside, or if the clipped piece is degenerate.
    pub fn clip_line(&self, line: &Line) -> Option<Line> {
        let (x1, y1) = (line.pt1().x(), line.pt1().y());
        let dx = line.pt2().x() - x1;
        let dy = line.pt2().y() - y1;

        let mut t0: f64 = 0.0;
        let mut t1: f64 = 1.0;
        for (p, q) in [
            (-dx, x1 - self.min_x),
            (dx, self.max_x - x1),
            (-dy, y1 - self.min_y),
            (dy, self.max_y - y1),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    if r > t1 {
                        return None;
                    }
                    t0 = t0.max(r);
                } else {
                    if r < t0 {
                        return None;
                    }
                    t1 = t1.min(r);
                }
            }
        }

        Line::new(
            Pt2D::new(x1 + t0 * dx, y1 + t0 * dy),
            Pt2D::new(x1 + t1 * dx, y1 + t1 * dy),
        )
        .ok()
    }

    /// Distance from a point to the nearest edge of the rectangle. Zero for points outside.
    pub fn dist_to_boundary(&self, pt: Pt2D) -> Distance {
        let d = (pt.x() - self.min_x)
            .min(self.max_x - pt.x())
            .min(pt.y() - self.min_y)
            .min(self.max_y - pt.y());
        Distance::meters(d.max(0.0))
    }

    pub fn clamp_pt(&self, pt: Pt2D) -> Pt2D {
        Pt2D::new(
            pt.x().clamp(self.min_x, self.max_x),
            pt.y().clamp(self.min_y, self.max_y),
        )
    }
}

impl Default for Bounds {
    fn default() -> Bounds {
        Bounds::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_line() {
        let b = Bounds::rect(Distance::meters(100.0), Distance::meters(100.0));

        let inside = Line::must_new(Pt2D::new(10.0, 10.0), Pt2D::new(20.0, 20.0));
        assert_eq!(b.clip_line(&inside), Some(inside));

        let crossing = Line::must_new(Pt2D::new(-50.0, 50.0), Pt2D::new(50.0, 50.0));
        assert_eq!(
            b.clip_line(&crossing),
            Some(Line::must_new(Pt2D::new(0.0, 50.0), Pt2D::new(50.0, 50.0)))
        );

        let outside = Line::must_new(Pt2D::new(-50.0, 50.0), Pt2D::new(-10.0, 50.0));
        assert_eq!(b.clip_line(&outside), None);
    }

    #[test]
    fn dist_to_boundary() {
        let b = Bounds::rect(Distance::meters(100.0), Distance::meters(100.0));
        assert_eq!(b.dist_to_boundary(Pt2D::new(3.0, 50.0)), Distance::meters(3.0));
        assert_eq!(b.dist_to_boundary(Pt2D::new(50.0, 99.0)), Distance::meters(1.0));
        assert_eq!(b.dist_to_boundary(Pt2D::new(-5.0, 50.0)), Distance::ZERO);
    }

    #[test]
    fn clamp_pt() {
        let b = Bounds::rect(Distance::meters(100.0), Distance::meters(100.0));
        assert_eq!(b.clamp_pt(Pt2D::new(-5.0, 110.0)), Pt2D::new(0.0, 100.0));
        assert_eq!(b.clamp_pt(Pt2D::new(5.0, 10.0)), Pt2D::new(5.0, 10.0));
    }
}
