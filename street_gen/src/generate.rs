//! Drives the whole pipeline as an explicit resumable state machine. Each
//! call to [`LayoutGenerator::step`] does a bounded chunk of work and reports
//! progress, so a host UI stays responsive during the quadratic crossing
//! scan. Dropping the generator mid-run discards the partial result.

use std::collections::BTreeMap;

use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};

use geom::{Distance, Pt2D};

use crate::connectors::{bridge_connector, bridge_stripe};
use crate::fray::fray_segment;
use crate::intersections::{apply_trims, build_group, find_crossings, IntersectionGroup};
use crate::patch::{plan_patches, Patch};
use crate::segments::{build_patch_segments, CornerSample, EdgeStripe, SegmentSet};
use crate::{Config, IntersectionData, Road, WorldLayout};

/// Receives progress while a layout generates. `progress` values are
/// monotonically increasing in [0, 1].
pub trait ProgressSink {
    fn progress(&mut self, fraction: f64);
    fn status(&mut self, label: &str);
}

/// For callers that don't show progress.
pub struct DiscardProgress;

impl ProgressSink for DiscardProgress {
    fn progress(&mut self, _: f64) {}
    fn status(&mut self, _: &str) {}
}

/// The finished layout: everything downstream systems read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratedWorld {
    pub layout: WorldLayout,
    pub roads: Vec<Road>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Stage {
    PlanPatches,
    BuildCells,
    CornerConnectors,
    StripeConnectors,
    Fray,
    FindCrossings,
    BuildPolygons,
    Emit,
    Done,
}

// How many items each step processes before yielding
const STEP_CHUNK: usize = 32;

// Trimming can shrink a segment to nothing; drop those
const MIN_SEGMENT_LEN: Distance = Distance::const_meters(0.1);

/// Generates one road network incrementally. Construct it, then call
/// [`step`](LayoutGenerator::step) until it returns the finished world.
pub struct LayoutGenerator {
    cfg: Config,
    rng: XorShiftRng,
    stage: Stage,
    /// Position within the current stage's work list.
    cursor: usize,

    patches: Vec<Patch>,
    segs: SegmentSet,
    corners: Vec<CornerSample>,
    stripes: Vec<EdgeStripe>,
    /// Endpoints of accepted connectors, for spacing checks.
    placed: Vec<Pt2D>,
    groups: Vec<IntersectionGroup>,
    trims: BTreeMap<(usize, bool), Pt2D>,
    intersections: Vec<IntersectionData>,

    result: Option<GeneratedWorld>,
}

impl LayoutGenerator {
    pub fn new(cfg: Config, rng: XorShiftRng) -> LayoutGenerator {
        LayoutGenerator {
            cfg,
            rng,
            stage: Stage::PlanPatches,
            cursor: 0,
            patches: Vec::new(),
            segs: SegmentSet::new(),
            corners: Vec::new(),
            stripes: Vec::new(),
            placed: Vec::new(),
            groups: Vec::new(),
            trims: BTreeMap::new(),
            intersections: Vec::new(),
            result: None,
        }
    }

    /// Does a bounded chunk of work. Returns the finished world once the
    /// pipeline completes; until then, reports progress through `sink` and
    /// returns None. Stepping a finished generator keeps returning the same
    /// result.
    pub fn step(&mut self, sink: &mut dyn ProgressSink) -> Option<GeneratedWorld> {
        match self.stage {
            Stage::PlanPatches => {
                sink.status("Planning patches");
                self.patches = plan_patches(&self.cfg, &mut self.rng);
                self.enter(Stage::BuildCells);
                sink.progress(0.05);
                None
            }
            Stage::BuildCells => {
                if self.cursor == 0 {
                    sink.status("Building grid cells");
                }
                build_patch_segments(
                    &self.cfg,
                    &self.patches,
                    self.cursor,
                    &mut self.segs,
                    &mut self.corners,
                    &mut self.stripes,
                );
                self.cursor += 1;
                sink.progress(span(0.05, 0.3, self.cursor, self.patches.len()));
                if self.cursor == self.patches.len() {
                    self.enter(Stage::CornerConnectors);
                }
                None
            }
            Stage::CornerConnectors => {
                if self.cursor == 0 {
                    sink.status("Connecting patches");
                }
                let end = (self.cursor + STEP_CHUNK).min(self.corners.len());
                for k in self.cursor..end {
                    let corner = self.corners[k];
                    bridge_connector(
                        &self.cfg,
                        corner.pt,
                        corner.normal,
                        corner.patch,
                        &mut self.segs,
                        &mut self.placed,
                    );
                }
                self.cursor = end;
                sink.progress(span(0.3, 0.38, self.cursor, self.corners.len()));
                if self.cursor == self.corners.len() {
                    self.enter(Stage::StripeConnectors);
                }
                None
            }
            Stage::StripeConnectors => {
                let end = (self.cursor + STEP_CHUNK).min(self.stripes.len());
                for k in self.cursor..end {
                    bridge_stripe(&self.cfg, &self.stripes[k], &mut self.segs, &mut self.placed);
                }
                self.cursor = end;
                sink.progress(span(0.38, 0.45, self.cursor, self.stripes.len()));
                if self.cursor == self.stripes.len() {
                    self.enter(Stage::Fray);
                }
                None
            }
            Stage::Fray => {
                if self.cursor == 0 {
                    sink.status("Fraying the boundary");
                }
                let end = (self.cursor + STEP_CHUNK).min(self.segs.len());
                for seg in &mut self.segs.segments[self.cursor..end] {
                    fray_segment(&self.cfg, seg, &mut self.rng);
                }
                self.cursor = end;
                sink.progress(span(0.45, 0.5, self.cursor, self.segs.len()));
                if self.cursor == self.segs.len() {
                    self.enter(Stage::FindCrossings);
                }
                None
            }
            Stage::FindCrossings => {
                if self.cursor == 0 {
                    sink.status("Finding crossings");
                }
                let end = (self.cursor + STEP_CHUNK).min(self.segs.len());
                find_crossings(&self.cfg, &self.segs.segments, self.cursor..end, &mut self.groups);
                self.cursor = end;
                sink.progress(span(0.5, 0.85, self.cursor, self.segs.len()));
                if self.cursor == self.segs.len() {
                    self.enter(Stage::BuildPolygons);
                }
                None
            }
            Stage::BuildPolygons => {
                if self.cursor == 0 {
                    sink.status("Building intersections");
                }
                let end = (self.cursor + STEP_CHUNK).min(self.groups.len());
                for k in self.cursor..end {
                    if let Some(data) = build_group(
                        &self.cfg,
                        &self.segs.segments,
                        &self.groups[k],
                        &mut self.trims,
                    ) {
                        self.intersections.push(data);
                    }
                }
                self.cursor = end;
                sink.progress(span(0.85, 0.95, self.cursor, self.groups.len()));
                if self.cursor == self.groups.len() {
                    self.enter(Stage::Emit);
                }
                None
            }
            Stage::Emit => {
                apply_trims(&self.cfg.bounds, &self.trims, &mut self.segs.segments);
                let roads: Vec<Road> = self
                    .segs
                    .segments
                    .iter()
                    .filter(|seg| seg.length() >= MIN_SEGMENT_LEN)
                    .map(|seg| Road {
                        pt1: seg.pt1,
                        pt2: seg.pt2,
                        width: seg.width,
                        class: seg.class,
                    })
                    .collect();
                info!(
                    "Generated {} roads and {} intersections from {} raw segments",
                    roads.len(),
                    self.intersections.len(),
                    self.segs.len()
                );
                self.result = Some(GeneratedWorld {
                    layout: WorldLayout {
                        bounds: self.cfg.bounds.clone(),
                        park: self.cfg.park.clone(),
                        intersections: std::mem::take(&mut self.intersections),
                    },
                    roads,
                });
                self.stage = Stage::Done;
                sink.progress(1.0);
                self.result.clone()
            }
            Stage::Done => self.result.clone(),
        }
    }

    pub fn run_to_completion(&mut self, sink: &mut dyn ProgressSink) -> GeneratedWorld {
        loop {
            if let Some(world) = self.step(sink) {
                return world;
            }
        }
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.cursor = 0;
    }
}

/// Maps a stage's completion fraction into its slice of the overall [0, 1]
/// progress range.
fn span(lo: f64, hi: f64, done: usize, total: usize) -> f64 {
    let frac = if total == 0 {
        1.0
    } else {
        (done as f64) / (total as f64)
    };
    lo + (hi - lo) * frac
}
