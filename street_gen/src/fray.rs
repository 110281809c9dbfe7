//! Roughens the road network near the world boundary. Perfectly straight
//! edges running along the edge of the map read as artificial; pulling their
//! endpoints in and out a little breaks up the silhouette.

use rand::Rng;
use rand_xorshift::XorShiftRng;

use geom::{Angle, Distance, Pt2D};

use crate::segments::RawSegment;
use crate::{rand_dist, Config};

/// Randomly perturbs any segment endpoint close to the world boundary. If
/// both ends qualify, the segment shrinks toward its middle instead, so short
/// boundary-hugging segments don't grow past their neighbors. Endpoints
/// always stay inside the world.
pub fn fray_segment(cfg: &Config, seg: &mut RawSegment, rng: &mut XorShiftRng) {
    let line = match seg.line() {
        Some(l) => l,
        None => {
            return;
        }
    };
    let near1 = cfg.bounds.dist_to_boundary(seg.pt1) < cfg.fray_radius;
    let near2 = cfg.bounds.dist_to_boundary(seg.pt2) < cfg.fray_radius;

    if near1 && near2 {
        let frac = rng.gen_range(0.3..0.6);
        seg.pt1 = cfg.bounds.clamp_pt(line.percent_along(frac / 2.0));
        seg.pt2 = cfg.bounds.clamp_pt(line.percent_along(1.0 - frac / 2.0));
        return;
    }

    if near1 {
        let delta = fray_delta(cfg, rng, line.length());
        seg.pt1 = cfg
            .bounds
            .clamp_pt(slide(seg.pt1, seg.pt2.angle_to(seg.pt1), delta));
    } else if near2 {
        let delta = fray_delta(cfg, rng, line.length());
        seg.pt2 = cfg
            .bounds
            .clamp_pt(slide(seg.pt2, seg.pt1.angle_to(seg.pt2), delta));
    }
}

/// Never retract more than most of the segment, or it flips around.
fn fray_delta(cfg: &Config, rng: &mut XorShiftRng, len: Distance) -> Distance {
    rand_dist(rng, cfg.fray_min, cfg.fray_max).max(-0.9 * len)
}

fn slide(pt: Pt2D, outward: Angle, delta: Distance) -> Pt2D {
    if delta >= Distance::ZERO {
        pt.project_away(delta, outward)
    } else {
        pt.project_away(-delta, outward.opposite())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use geom::Line;

    use super::*;
    use crate::{PatchID, RoadClass};

    fn seg(pt1: Pt2D, pt2: Pt2D) -> RawSegment {
        RawSegment {
            pt1,
            pt2,
            width: Distance::meters(5.5),
            class: RoadClass::Local,
            patch: Some(PatchID(0)),
        }
    }

    #[test]
    fn interior_segments_are_untouched() {
        let cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        let mut rng = XorShiftRng::seed_from_u64(1);
        let mut s = seg(Pt2D::new(100.0, 200.0), Pt2D::new(150.0, 200.0));
        let before = s.clone();
        fray_segment(&cfg, &mut s, &mut rng);
        assert_eq!(s, before);
    }

    #[test]
    fn both_ends_near_shrinks_inward() {
        let cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        let mut rng = XorShiftRng::seed_from_u64(2);
        // Runs right along the left boundary
        let mut s = seg(Pt2D::new(5.0, 100.0), Pt2D::new(5.0, 150.0));
        let original = Line::must_new(s.pt1, s.pt2);
        fray_segment(&cfg, &mut s, &mut rng);

        let frayed = Line::must_new(s.pt1, s.pt2);
        assert!(frayed.length() < original.length());
        // Both new endpoints lie strictly inside the original span
        assert!(s.pt1.y() > 100.0 && s.pt1.y() < 150.0);
        assert!(s.pt2.y() > 100.0 && s.pt2.y() < 150.0);
        assert!(s.pt1.y() < s.pt2.y());
    }

    #[test]
    fn one_end_near_stays_in_bounds() {
        let cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        for seed in 0..20 {
            let mut rng = XorShiftRng::seed_from_u64(seed);
            // pt2 sits 5m from the right boundary, pt1 well inside
            let mut s = seg(Pt2D::new(300.0, 200.0), Pt2D::new(395.0, 200.0));
            fray_segment(&cfg, &mut s, &mut rng);
            assert_eq!(s.pt1, Pt2D::new(300.0, 200.0));
            assert!(cfg.bounds.contains(s.pt2));
            // The endpoint only slid along the segment's own direction
            assert_eq!(s.pt2.y(), 200.0);
        }
    }
}
