//! Walks each patch's grid cells, rejects cells geometrically owned by a
//! neighboring patch, and emits deduplicated boundary segments, classified as
//! arterial or local. Also records the outward corners and boundary stripes
//! that the connector generator later tries to bridge.

use std::collections::BTreeSet;

use geom::{Angle, Distance, Line, Pt2D};

use crate::patch::Patch;
use crate::{Config, PatchID, RoadClass};

/// One road segment in the working set. Endpoints move during generation
/// (fraying, trimming); everything else is fixed at insertion.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSegment {
    pub pt1: Pt2D,
    pub pt2: Pt2D,
    pub width: Distance,
    pub class: RoadClass,
    /// `None` for a cross-patch connector.
    pub patch: Option<PatchID>,
}

impl RawSegment {
    /// None once trimming has collapsed the segment.
    pub fn line(&self) -> Option<Line> {
        Line::new(self.pt1, self.pt2).ok()
    }

    pub fn length(&self) -> Distance {
        self.pt1.dist_to(self.pt2)
    }
}

// EdgeKeys quantize endpoints to this lattice.
const QUANTIZE_PER_METER: f64 = 10.0;

/// A quantized, order-independent fingerprint of (start, end, road class),
/// used to deduplicate geometrically identical segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct EdgeKey {
    a: (i64, i64),
    b: (i64, i64),
    class: RoadClass,
}

impl EdgeKey {
    pub fn new(pt1: Pt2D, pt2: Pt2D, class: RoadClass) -> EdgeKey {
        let q1 = quantize(pt1);
        let q2 = quantize(pt2);
        let (a, b) = if q1 <= q2 { (q1, q2) } else { (q2, q1) };
        EdgeKey { a, b, class }
    }
}

fn quantize(pt: Pt2D) -> (i64, i64) {
    (
        (pt.x() * QUANTIZE_PER_METER).round() as i64,
        (pt.y() * QUANTIZE_PER_METER).round() as i64,
    )
}

/// The working set of segments. Every insertion funnels through here, making
/// this the single deduplication choke point for the whole pipeline.
#[derive(Default)]
pub struct SegmentSet {
    pub segments: Vec<RawSegment>,
    keys: BTreeSet<EdgeKey>,
}

impl SegmentSet {
    pub fn new() -> SegmentSet {
        SegmentSet::default()
    }

    /// False if an equivalent segment was already present.
    pub fn insert(&mut self, seg: RawSegment) -> bool {
        if !self.keys.insert(EdgeKey::new(seg.pt1, seg.pt2, seg.class)) {
            return false;
        }
        self.segments.push(seg);
        true
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// An outward-facing grid corner of a patch: a cell corner missing both
/// neighbors across a diagonal. Consumed by the connector generator.
#[derive(Clone, Copy, Debug)]
pub struct CornerSample {
    pub pt: Pt2D,
    pub normal: Angle,
    pub patch: PatchID,
}

/// A maximal run of boundary edges along one grid line of a patch, with the
/// midpoint of each edge. Consumed by the connector generator.
#[derive(Clone, Debug)]
pub struct EdgeStripe {
    pub midpoints: Vec<Pt2D>,
    pub normal: Angle,
    pub patch: PatchID,
}

/// Road class is a pure function of the grid-line index and the patch's
/// arterial phase and period.
pub(crate) fn classify(index: usize, phase: usize, period: usize) -> RoadClass {
    if (index + phase) % period == 0 {
        RoadClass::Arterial
    } else {
        RoadClass::Local
    }
}

/// Emits all segments for one patch, plus its corner and stripe samples.
pub fn build_patch_segments(
    cfg: &Config,
    patches: &[Patch],
    idx: usize,
    set: &mut SegmentSet,
    corners: &mut Vec<CornerSample>,
    stripes: &mut Vec<EdgeStripe>,
) {
    let patch = &patches[idx];
    let nu = patch.u_offsets.len();
    let nv = patch.v_offsets.len();
    if nu < 2 || nv < 2 {
        return;
    }
    let cu = nu - 1;
    let cv = nv - 1;

    let mut valid = vec![vec![false; cv]; cu];
    for (i, column) in valid.iter_mut().enumerate() {
        for (j, cell) in column.iter_mut().enumerate() {
            *cell = cell_valid(cfg, patches, idx, i, j);
        }
    }

    for i in 0..cu {
        for j in 0..cv {
            if !valid[i][j] {
                continue;
            }
            // Interior edges are shared with a neighbor; whichever cell owns
            // the left/bottom side emits them, so each appears once.
            add_edge(
                cfg,
                patch,
                set,
                (i, j),
                (i, j + 1),
                classify(i, patch.phase, patch.period),
            );
            add_edge(
                cfg,
                patch,
                set,
                (i, j),
                (i + 1, j),
                classify(j, patch.phase, patch.period),
            );

            let right_missing = i + 1 >= cu || !valid[i + 1][j];
            let top_missing = j + 1 >= cv || !valid[i][j + 1];
            let left_missing = i == 0 || !valid[i - 1][j];
            let bottom_missing = j == 0 || !valid[i][j - 1];

            if right_missing {
                add_edge(
                    cfg,
                    patch,
                    set,
                    (i + 1, j),
                    (i + 1, j + 1),
                    classify(i + 1, patch.phase, patch.period),
                );
            }
            if top_missing {
                add_edge(
                    cfg,
                    patch,
                    set,
                    (i, j + 1),
                    (i + 1, j + 1),
                    classify(j + 1, patch.phase, patch.period),
                );
            }

            // A cell missing both neighbors across a diagonal has an
            // outward-facing corner there.
            for (missing, gi, gj, local_degs) in [
                (right_missing && top_missing, i + 1, j + 1, 45.0),
                (left_missing && top_missing, i, j + 1, 135.0),
                (left_missing && bottom_missing, i, j, 225.0),
                (right_missing && bottom_missing, i + 1, j, 315.0),
            ] {
                if missing {
                    corners.push(CornerSample {
                        pt: patch.world_pt(patch.u_offsets[gi], patch.v_offsets[gj]),
                        normal: patch.angle.rotate_degs(local_degs),
                        patch: patch.id,
                    });
                }
            }
        }
    }

    collect_stripes(patch, &valid, stripes);
}

/// A cell belongs to this patch only if its center and four inset corners all
/// lie inside the buildable rectangle, outside the park, and closer to this
/// patch's center than to any other's. This is what makes patch territories
/// ragged and non-overlapping.
fn cell_valid(cfg: &Config, patches: &[Patch], idx: usize, i: usize, j: usize) -> bool {
    let patch = &patches[idx];
    let u0 = patch.u_offsets[i];
    let u1 = patch.u_offsets[i + 1];
    let v0 = patch.v_offsets[j];
    let v1 = patch.v_offsets[j + 1];
    let du = (u1 - u0) * cfg.corner_inset;
    let dv = (v1 - v0) * cfg.corner_inset;

    let samples = [
        patch.world_pt((u0 + u1) / 2.0, (v0 + v1) / 2.0),
        patch.world_pt(u0 + du, v0 + dv),
        patch.world_pt(u1 - du, v0 + dv),
        patch.world_pt(u1 - du, v1 - dv),
        patch.world_pt(u0 + du, v1 - dv),
    ];
    samples.into_iter().all(|pt| {
        cfg.bounds.contains(pt) && !cfg.park.contains(pt) && nearest_patch(patches, pt) == patch.id
    })
}

fn nearest_patch(patches: &[Patch], pt: Pt2D) -> PatchID {
    patches
        .iter()
        .min_by_key(|p| p.center.dist_to(pt))
        .unwrap()
        .id
}

fn add_edge(
    cfg: &Config,
    patch: &Patch,
    set: &mut SegmentSet,
    (i1, j1): (usize, usize),
    (i2, j2): (usize, usize),
    class: RoadClass,
) {
    let pt1 = patch.world_pt(patch.u_offsets[i1], patch.v_offsets[j1]);
    let pt2 = patch.world_pt(patch.u_offsets[i2], patch.v_offsets[j2]);
    let line = match Line::new(pt1, pt2) {
        Ok(l) => l,
        Err(_) => {
            return;
        }
    };
    let clipped = match cfg.bounds.clip_line(&line) {
        Some(l) => l,
        None => {
            return;
        }
    };
    set.insert(RawSegment {
        pt1: clipped.pt1(),
        pt2: clipped.pt2(),
        width: cfg.width(class),
        class,
        patch: Some(patch.id),
    });
}

fn collect_stripes(patch: &Patch, valid: &[Vec<bool>], stripes: &mut Vec<EdgeStripe>) {
    let cu = valid.len();
    if cu == 0 {
        return;
    }
    let cv = valid[0].len();

    // Boundary runs along vertical grid lines, facing local +U and -U
    for i in 0..cu {
        let mut facing_pos: Vec<Pt2D> = Vec::new();
        let mut facing_neg: Vec<Pt2D> = Vec::new();
        for j in 0..cv {
            if valid[i][j] && (i + 1 >= cu || !valid[i + 1][j]) {
                facing_pos.push(vertical_edge_mid(patch, i + 1, j));
            } else {
                flush_stripe(stripes, &mut facing_pos, patch.angle, patch.id);
            }
            if valid[i][j] && (i == 0 || !valid[i - 1][j]) {
                facing_neg.push(vertical_edge_mid(patch, i, j));
            } else {
                flush_stripe(stripes, &mut facing_neg, patch.angle.opposite(), patch.id);
            }
        }
        flush_stripe(stripes, &mut facing_pos, patch.angle, patch.id);
        flush_stripe(stripes, &mut facing_neg, patch.angle.opposite(), patch.id);
    }

    // And along horizontal grid lines, facing local +V and -V
    for j in 0..cv {
        let mut facing_pos: Vec<Pt2D> = Vec::new();
        let mut facing_neg: Vec<Pt2D> = Vec::new();
        for (i, column) in valid.iter().enumerate() {
            if column[j] && (j + 1 >= cv || !valid[i][j + 1]) {
                facing_pos.push(horizontal_edge_mid(patch, i, j + 1));
            } else {
                flush_stripe(stripes, &mut facing_pos, patch.angle.rotate_degs(90.0), patch.id);
            }
            if column[j] && (j == 0 || !valid[i][j - 1]) {
                facing_neg.push(horizontal_edge_mid(patch, i, j));
            } else {
                flush_stripe(stripes, &mut facing_neg, patch.angle.rotate_degs(-90.0), patch.id);
            }
        }
        flush_stripe(stripes, &mut facing_pos, patch.angle.rotate_degs(90.0), patch.id);
        flush_stripe(stripes, &mut facing_neg, patch.angle.rotate_degs(-90.0), patch.id);
    }
}

fn vertical_edge_mid(patch: &Patch, line_idx: usize, j: usize) -> Pt2D {
    patch.world_pt(
        patch.u_offsets[line_idx],
        (patch.v_offsets[j] + patch.v_offsets[j + 1]) / 2.0,
    )
}

fn horizontal_edge_mid(patch: &Patch, i: usize, line_idx: usize) -> Pt2D {
    patch.world_pt(
        (patch.u_offsets[i] + patch.u_offsets[i + 1]) / 2.0,
        patch.v_offsets[line_idx],
    )
}

fn flush_stripe(stripes: &mut Vec<EdgeStripe>, run: &mut Vec<Pt2D>, normal: Angle, patch: PatchID) {
    if !run.is_empty() {
        stripes.push(EdgeStripe {
            midpoints: std::mem::take(run),
            normal,
            patch,
        });
    }
}
