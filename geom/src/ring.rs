use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Pt2D;

/// A simple closed polygon. The first point isn't repeated at the end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pts: Vec<Pt2D>,
}

impl Ring {
    /// None unless there are at least 3 distinct points.
    pub fn maybe_new(pts: Vec<Pt2D>) -> Option<Ring> {
        if pts.len() < 3 {
            return None;
        }

        let mut seen_pts = HashSet::new();
        for pt in &pts {
            if !seen_pts.insert(pt.to_hashable()) {
                return None;
            }
        }

        Some(Ring { pts })
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Ring::maybe_new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt2D::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_rings() {
        assert!(Ring::maybe_new(vec![Pt2D::new(0.0, 0.0), Pt2D::new(1.0, 0.0)]).is_none());
        assert!(Ring::maybe_new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(1.0, 0.0),
            Pt2D::new(0.0, 0.0),
        ])
        .is_none());
        assert!(Ring::maybe_new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(1.0, 0.0),
            Pt2D::new(1.0, 1.0),
        ])
        .is_some());
    }
}
