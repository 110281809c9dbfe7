//! Finds all pairwise segment crossings, merges nearby crossing points into
//! groups, and builds each group's intersection polygons. Two offset polygons
//! come out of every group: a trim polygon used to shorten the incoming
//! roads, and a slightly tighter visual polygon exposed as the intersection's
//! shape and connector anchors.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::ops::Range;

use geom::{Angle, Bounds, Distance, InfiniteLine, Pt2D, Ring};

use crate::segments::RawSegment;
use crate::{Config, IntersectionConnector, IntersectionData};

// Crossings at shallower angles than this produce degenerate near-collinear
// intersection points.
const NEARLY_PARALLEL_DOT: f64 = 0.995;

/// A cluster of crossing points, with a running-average center and the
/// segments whose crossings fell within the merge radius of it.
#[derive(Debug)]
pub struct IntersectionGroup {
    pub center: Pt2D,
    /// How many crossing points the running average covers.
    pub count: usize,
    pub members: BTreeSet<usize>,
}

/// Tests segments in `range` for crossings against every earlier segment,
/// growing `groups` as crossings turn up. Calling this over consecutive
/// ranges covers each unordered pair exactly once.
pub fn find_crossings(
    cfg: &Config,
    segs: &[RawSegment],
    range: Range<usize>,
    groups: &mut Vec<IntersectionGroup>,
) {
    for i in range {
        let line1 = match segs[i].line() {
            Some(l) => l,
            None => {
                continue;
            }
        };
        let (sin1, cos1) = line1.angle().normalized_radians().sin_cos();
        for j in 0..i {
            let line2 = match segs[j].line() {
                Some(l) => l,
                None => {
                    continue;
                }
            };
            let (sin2, cos2) = line2.angle().normalized_radians().sin_cos();
            if (cos1 * cos2 + sin1 * sin2).abs() > NEARLY_PARALLEL_DOT {
                continue;
            }
            if let Some(pt) = line1.intersection(&line2) {
                merge_crossing(cfg, groups, pt, i, j);
            }
        }
    }
}

/// Folds one crossing point into the nearest existing group, or starts a new
/// one. Proximity is checked against each group's evolving centroid, so
/// chains of crossings can merge even when their extremes are mutually far
/// apart. That's intended; the merge radius is tied to physical road and
/// sidewalk geometry.
fn merge_crossing(
    cfg: &Config,
    groups: &mut Vec<IntersectionGroup>,
    pt: Pt2D,
    idx1: usize,
    idx2: usize,
) {
    let merge_dist = cfg.merge_distance();
    for group in groups.iter_mut() {
        if group.center.dist_to(pt) < merge_dist {
            let n = group.count as f64;
            group.center = Pt2D::new(
                (group.center.x() * n + pt.x()) / (n + 1.0),
                (group.center.y() * n + pt.y()) / (n + 1.0),
            );
            group.count += 1;
            group.members.insert(idx1);
            group.members.insert(idx2);
            return;
        }
    }
    groups.push(IntersectionGroup {
        center: pt,
        count: 1,
        members: BTreeSet::from([idx1, idx2]),
    });
}

/// One road's approach into an intersection.
struct Entry {
    seg_idx: usize,
    /// Is the endpoint nearest the group center the segment's pt1?
    near_is_pt1: bool,
    /// Where the road meets the intersection.
    pt: Pt2D,
    /// The road's travel direction into the intersection.
    dir: Angle,
    width: Distance,
}

/// Builds a group's polygons and connectors, and records where each member
/// segment should be cut back. Trims are only recorded when the group
/// survives; degenerate groups leave their members untouched.
pub fn build_group(
    cfg: &Config,
    segs: &[RawSegment],
    group: &IntersectionGroup,
    trims: &mut BTreeMap<(usize, bool), Pt2D>,
) -> Option<IntersectionData> {
    let mut entries = Vec::new();
    for idx in &group.members {
        let seg = &segs[*idx];
        if seg.line().is_none() {
            continue;
        }
        let near_is_pt1 = seg.pt1.dist_to(group.center) < seg.pt2.dist_to(group.center);
        let (near, far) = if near_is_pt1 {
            (seg.pt1, seg.pt2)
        } else {
            (seg.pt2, seg.pt1)
        };
        entries.push(Entry {
            seg_idx: *idx,
            near_is_pt1,
            pt: near,
            dir: far.angle_to(near),
            width: seg.width,
        });
    }
    if entries.len() < 2 {
        warn!(
            "Intersection near {} only has {} usable roads; skipping it",
            group.center,
            entries.len()
        );
        return None;
    }
    entries.sort_by(|a, b| {
        a.dir
            .normalized_degrees()
            .total_cmp(&b.dir.normalized_degrees())
    });

    // One vertex per gap between angularly adjacent entries. vertex[k] sits
    // between entries k and k+1 (cyclically), so the polygon edge crossing
    // entry k runs from vertex[k-1] to vertex[k].
    let n = entries.len();
    let mut trim_vertices = Vec::new();
    let mut visual_vertices = Vec::new();
    for k in 0..n {
        let a = &entries[k];
        let b = &entries[(k + 1) % n];
        trim_vertices.push(offset_vertex(a, b, trim_margin(cfg)));
        visual_vertices.push(offset_vertex(a, b, cfg.visual_setback));
    }

    let trim_ring = Ring::maybe_new(trim_vertices.clone());
    let visual_ring = Ring::maybe_new(visual_vertices.clone());
    let (_, polygon) = match (trim_ring, visual_ring) {
        (Some(t), Some(v)) => (t, v),
        _ => {
            warn!("Intersection near {} has a degenerate polygon; skipping it", group.center);
            return None;
        }
    };

    let mut connectors = Vec::new();
    for (k, entry) in entries.iter().enumerate() {
        let prev = (k + n - 1) % n;
        connectors.push(IntersectionConnector {
            pt: Pt2D::center(&[visual_vertices[prev], visual_vertices[k]]),
            normal: entry.dir.opposite(),
            width: entry.width,
        });
        trims.insert(
            (entry.seg_idx, entry.near_is_pt1),
            Pt2D::center(&[trim_vertices[prev], trim_vertices[k]]),
        );
    }

    Some(IntersectionData { polygon, connectors })
}

fn trim_margin(cfg: &Config) -> Distance {
    cfg.sidewalk_width + cfg.clearance
}

/// The corner between two adjacent approaches: each road's centerline is
/// offset sideways by half its width plus the margin, toward the gap, and the
/// two offset lines are intersected. Parallel offsets fall back to the
/// midpoint of the offset base points.
fn offset_vertex(a: &Entry, b: &Entry, margin: Distance) -> Pt2D {
    let base_a = a.pt.project_away(0.5 * a.width + margin, a.dir.rotate_degs(-90.0));
    let base_b = b.pt.project_away(0.5 * b.width + margin, b.dir.rotate_degs(90.0));
    let line_a = InfiniteLine::from_pt_angle(base_a, a.dir);
    let line_b = InfiniteLine::from_pt_angle(base_b, b.dir);
    line_a
        .intersection(&line_b)
        .unwrap_or_else(|| Pt2D::center(&[base_a, base_b]))
}

/// Moves every trimmed endpoint in one pass, after all groups are processed.
/// Endpoints stay clamped to the world rectangle.
pub fn apply_trims(
    bounds: &Bounds,
    trims: &BTreeMap<(usize, bool), Pt2D>,
    segs: &mut [RawSegment],
) {
    for ((idx, near_is_pt1), pt) in trims {
        let clamped = bounds.clamp_pt(*pt);
        if *near_is_pt1 {
            segs[*idx].pt1 = clamped;
        } else {
            segs[*idx].pt2 = clamped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PatchID, RoadClass};

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> RawSegment {
        RawSegment {
            pt1: Pt2D::new(x1, y1),
            pt2: Pt2D::new(x2, y2),
            width: Distance::meters(5.5),
            class: RoadClass::Local,
            patch: Some(PatchID(0)),
        }
    }

    #[test]
    fn crossing_makes_one_group() {
        let cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        let segs = vec![seg(100.0, 50.0, 100.0, 150.0), seg(50.0, 100.0, 150.0, 100.0)];
        let mut groups = Vec::new();
        find_crossings(&cfg, &segs, 0..segs.len(), &mut groups);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].center, Pt2D::new(100.0, 100.0));
        assert_eq!(groups[0].members, BTreeSet::from([0, 1]));
    }

    #[test]
    fn parallel_segments_never_group() {
        let cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        // Collinear overlap and a shallow 2 degree crossing
        let segs = vec![
            seg(0.0, 100.0, 200.0, 100.0),
            seg(50.0, 100.0, 250.0, 100.0),
            seg(0.0, 98.0, 200.0, 105.0),
        ];
        let mut groups = Vec::new();
        find_crossings(&cfg, &segs, 0..segs.len(), &mut groups);
        assert!(groups.is_empty());
    }

    #[test]
    fn grid_edges_sharing_corners_never_cross() {
        let cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        // A 3x3 lattice of 40m cells: edges meet only at shared corners
        let mut segs = Vec::new();
        for i in 0..4 {
            for j in 0..3 {
                let x = 100.0 + (i as f64) * 40.0;
                let y = 100.0 + (j as f64) * 40.0;
                segs.push(seg(x, y, x, y + 40.0));
                segs.push(seg(y, x, y + 40.0, x));
            }
        }
        let mut groups = Vec::new();
        find_crossings(&cfg, &segs, 0..segs.len(), &mut groups);
        assert!(groups.is_empty());
    }

    #[test]
    fn nearby_crossings_merge() {
        let cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        // Three verticals a few meters apart, all crossing one horizontal.
        // Each crossing is well within merge_distance of the last.
        let segs = vec![
            seg(0.0, 100.0, 200.0, 100.0),
            seg(95.0, 50.0, 95.0, 150.0),
            seg(100.0, 50.0, 100.0, 150.0),
            seg(105.0, 50.0, 105.0, 150.0),
        ];
        let mut groups = Vec::new();
        find_crossings(&cfg, &segs, 0..segs.len(), &mut groups);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[0].members, BTreeSet::from([0, 1, 2, 3]));
    }

    #[test]
    fn distant_crossings_stay_separate() {
        let cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        let segs = vec![
            seg(0.0, 100.0, 400.0, 100.0),
            seg(100.0, 50.0, 100.0, 150.0),
            seg(300.0, 50.0, 300.0, 150.0),
        ];
        let mut groups = Vec::new();
        find_crossings(&cfg, &segs, 0..segs.len(), &mut groups);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn four_way_polygon() {
        let cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        // Four stub roads radiating from (200, 200)
        let center = Pt2D::new(200.0, 200.0);
        let segs: Vec<RawSegment> = [0.0, 45.0, 90.0, 135.0]
            .into_iter()
            .map(|degs| {
                let far = center.project_away(Distance::meters(50.0), Angle::degrees(degs));
                seg(center.x(), center.y(), far.x(), far.y())
            })
            .collect();
        let group = IntersectionGroup {
            center,
            count: 1,
            members: BTreeSet::from([0, 1, 2, 3]),
        };

        let mut trims = BTreeMap::new();
        let data = build_group(&cfg, &segs, &group, &mut trims).unwrap();
        assert_eq!(data.polygon.points().len(), 4);
        assert_eq!(data.connectors.len(), 4);
        assert_eq!(trims.len(), 4);

        // Each road is trimmed at its near endpoint, pushed outward from the
        // center along its own direction.
        for (k, s) in segs.iter().enumerate() {
            let trimmed = trims[&(k, true)];
            let pushed_back = center.dist_to(trimmed);
            assert!(pushed_back > Distance::ZERO);
            assert!(pushed_back < Distance::meters(25.0));
            // Still on the road's side of the intersection
            assert!(trimmed.dist_to(s.pt2) < center.dist_to(s.pt2));
        }

        // Every connector faces away from the center
        for c in &data.connectors {
            let outward = center.project_away(Distance::meters(1.0), c.normal);
            assert!(outward.dist_to(c.pt) < center.dist_to(c.pt) + Distance::meters(1.0));
        }
    }

    #[test]
    fn sub_degree_approaches_sort_by_angle() {
        let cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        let center = Pt2D::new(200.0, 200.0);
        // The first two roads are under a degree apart and inserted in the
        // wrong angular order
        let outward = [0.9, 0.3, 120.0, 240.0];
        let segs: Vec<RawSegment> = outward
            .into_iter()
            .map(|degs| {
                let far = center.project_away(Distance::meters(50.0), Angle::degrees(degs));
                seg(center.x(), center.y(), far.x(), far.y())
            })
            .collect();
        let group = IntersectionGroup {
            center,
            count: 1,
            members: BTreeSet::from([0, 1, 2, 3]),
        };

        let mut trims = BTreeMap::new();
        let data = build_group(&cfg, &segs, &group, &mut trims).unwrap();
        // Connectors come out in entry order: ascending by the direction
        // toward the center, which is the outward angle plus 180
        let expected_outward = [240.0, 0.3, 0.9, 120.0];
        assert_eq!(data.connectors.len(), 4);
        for (connector, degs) in data.connectors.iter().zip(expected_outward) {
            assert!(
                (connector.normal.normalized_degrees() - degs).abs() < 0.001,
                "connector normal {} isn't {} degrees",
                connector.normal,
                degs
            );
        }
    }

    #[test]
    fn lone_member_groups_are_dropped() {
        let cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        let segs = vec![seg(100.0, 100.0, 150.0, 100.0)];
        let group = IntersectionGroup {
            center: Pt2D::new(100.0, 100.0),
            count: 1,
            members: BTreeSet::from([0]),
        };
        let mut trims = BTreeMap::new();
        assert!(build_group(&cfg, &segs, &group, &mut trims).is_none());
        assert!(trims.is_empty());
    }

    #[test]
    fn trims_apply_once_per_endpoint() {
        let bounds = Bounds::rect(Distance::meters(400.0), Distance::meters(400.0));
        let mut segs = vec![seg(100.0, 100.0, 200.0, 100.0)];
        let mut trims = BTreeMap::new();
        trims.insert((0, true), Pt2D::new(110.0, 100.0));
        trims.insert((0, false), Pt2D::new(190.0, 450.0));
        apply_trims(&bounds, &trims, &mut segs);
        assert_eq!(segs[0].pt1, Pt2D::new(110.0, 100.0));
        // Out-of-bounds trims clamp to the world rectangle
        assert_eq!(segs[0].pt2, Pt2D::new(190.0, 400.0));
    }
}
