//! Stitches adjacent patches together: grows short connector segments from
//! outward corners and under-connected boundary stripes toward the nearest
//! segment belonging to a different patch.

use geom::{Angle, Distance, Line, Pt2D};

use crate::segments::{EdgeStripe, RawSegment, SegmentSet};
use crate::{Config, PatchID, RoadClass};

/// Tries to grow one connector from `origin` along `normal`, targeting any
/// segment not owned by `exclude`. Returns whether a connector was placed;
/// `placed` collects the endpoints of every accepted connector for spacing
/// checks.
pub fn bridge_connector(
    cfg: &Config,
    origin: Pt2D,
    normal: Angle,
    exclude: PatchID,
    set: &mut SegmentSet,
    placed: &mut Vec<Pt2D>,
) -> bool {
    // Forward ray against every foreign segment; closest hit within reach
    // wins.
    let mut best: Option<(Distance, usize, Pt2D)> = None;
    for (idx, seg) in set.segments.iter().enumerate() {
        if seg.patch == Some(exclude) {
            continue;
        }
        let line = match seg.line() {
            Some(l) => l,
            None => {
                continue;
            }
        };
        if let Some((dist, pt)) = ray_hit(origin, normal, &line) {
            if dist >= cfg.min_reach
                && dist <= cfg.max_reach
                && best.map(|(d, _, _)| dist < d).unwrap_or(true)
            {
                best = Some((dist, idx, pt));
            }
        }
    }

    // The ray misses near-parallel targets; fall back to the closest
    // projection within the same range.
    if best.is_none() {
        for (idx, seg) in set.segments.iter().enumerate() {
            if seg.patch == Some(exclude) {
                continue;
            }
            let line = match seg.line() {
                Some(l) => l,
                None => {
                    continue;
                }
            };
            let pt = line.project_pt(origin);
            let dist = origin.dist_to(pt);
            if dist >= cfg.min_reach
                && dist <= cfg.max_reach
                && best.map(|(d, _, _)| dist < d).unwrap_or(true)
            {
                best = Some((dist, idx, pt));
            }
        }
    }

    let (_, target, hit) = match best {
        Some(b) => b,
        None => {
            return false;
        }
    };

    // Corner origins come from raw cell corners, which can sit slightly
    // outside the world. Clip the connector before anything else sees it.
    let candidate = match Line::new(origin, hit)
        .ok()
        .and_then(|l| cfg.bounds.clip_line(&l))
    {
        Some(l) => l,
        None => {
            return false;
        }
    };

    // Don't cluster connectors
    if placed.iter().any(|pt| {
        pt.dist_to(candidate.pt1()) < cfg.min_connector_spacing
            || pt.dist_to(candidate.pt2()) < cfg.min_connector_spacing
    }) {
        return false;
    }

    // Don't cross anything but the segment we're connecting to
    for (idx, seg) in set.segments.iter().enumerate() {
        if idx == target {
            continue;
        }
        if let Some(line) = seg.line() {
            if candidate.crosses(&line) {
                return false;
            }
        }
    }

    if !set.insert(RawSegment {
        pt1: candidate.pt1(),
        pt2: candidate.pt2(),
        width: cfg.local_width,
        class: RoadClass::Local,
        patch: None,
    }) {
        return false;
    }
    placed.push(candidate.pt1());
    placed.push(candidate.pt2());
    true
}

/// Periodically samples a boundary stripe, but only if the whole stripe lacks
/// a connector nearby. Keeps long straight boundaries from over-connecting.
pub fn bridge_stripe(cfg: &Config, stripe: &EdgeStripe, set: &mut SegmentSet, placed: &mut Vec<Pt2D>) {
    let clearance = cfg.cell_max * cfg.stripe_clearance_cells;
    if stripe
        .midpoints
        .iter()
        .any(|mid| placed.iter().any(|pt| pt.dist_to(*mid) < clearance))
    {
        return;
    }
    for mid in stripe.midpoints.iter().step_by(cfg.stripe_sample_every.max(1)) {
        bridge_connector(cfg, *mid, stripe.normal, stripe.patch, set, placed);
    }
}

/// Where a forward ray from `origin` hits the segment, as (distance along the
/// ray, hit point). The ray only counts if it travels a positive distance.
fn ray_hit(origin: Pt2D, angle: Angle, seg: &Line) -> Option<(Distance, Pt2D)> {
    let (dy, dx) = angle.normalized_radians().sin_cos();
    let ex = seg.pt2().x() - seg.pt1().x();
    let ey = seg.pt2().y() - seg.pt1().y();
    let denom = dx * ey - dy * ex;
    if denom.abs() < 1e-9 {
        return None;
    }
    let wx = seg.pt1().x() - origin.x();
    let wy = seg.pt1().y() - origin.y();
    let t = (wx * ey - wy * ex) / denom;
    let s = (wx * dy - wy * dx) / denom;
    if t <= 0.0 || !(0.0..=1.0).contains(&s) {
        return None;
    }
    Some((Distance::meters(t), origin.offset(t * dx, t * dy)))
}
