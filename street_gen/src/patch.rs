//! Partitions the buildable rectangle into a jittered array of rotated
//! patches, each with its own irregular grid-line spacing and arterial phase.

use rand::Rng;
use rand_xorshift::XorShiftRng;

use geom::{Angle, Bounds, Distance, Pt2D};

use crate::{rand_dist, Config, PatchID};

/// A locally rotated, independently gridded region of the road network, akin
/// to a city block group with its own street angle. Read-only once planned.
#[derive(Clone, Debug)]
pub struct Patch {
    pub id: PatchID,
    pub center: Pt2D,
    pub angle: Angle,
    /// Every `period`th grid line is arterial...
    pub period: usize,
    /// ...starting from this offset.
    pub phase: usize,
    /// Ordered grid-line offsets along the patch's local U and V axes,
    /// relative to its center.
    pub u_offsets: Vec<Distance>,
    pub v_offsets: Vec<Distance>,
}

impl Patch {
    /// Transforms a point in the patch's rotated local frame to world space.
    pub fn world_pt(&self, u: Distance, v: Distance) -> Pt2D {
        let (sin, cos) = self.angle.normalized_radians().sin_cos();
        self.center.offset(
            u.inner_meters() * cos - v.inner_meters() * sin,
            u.inner_meters() * sin + v.inner_meters() * cos,
        )
    }

    /// The world rectangle's extent along the patch's local axes: (min_u,
    /// max_u, min_v, max_v). Grid lines covering this cover the whole world.
    fn local_extents(&self, bounds: &Bounds) -> (Distance, Distance, Distance, Distance) {
        let (sin, cos) = self.angle.normalized_radians().sin_cos();
        let mut min_u = f64::MAX;
        let mut max_u = f64::MIN;
        let mut min_v = f64::MAX;
        let mut max_v = f64::MIN;
        for corner in bounds.get_corners() {
            let dx = corner.x() - self.center.x();
            let dy = corner.y() - self.center.y();
            let u = dx * cos + dy * sin;
            let v = -dx * sin + dy * cos;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }
        (
            Distance::meters(min_u),
            Distance::meters(max_u),
            Distance::meters(min_v),
            Distance::meters(max_v),
        )
    }
}

pub fn plan_patches(cfg: &Config, rng: &mut XorShiftRng) -> Vec<Patch> {
    let slot_w = cfg.bounds.width() / (cfg.patch_cols as f64);
    let slot_h = cfg.bounds.height() / (cfg.patch_rows as f64);

    let mut patches = Vec::new();
    for row in 0..cfg.patch_rows {
        for col in 0..cfg.patch_cols {
            let base = Pt2D::new(
                cfg.bounds.min_x + ((col as f64) + 0.5) * slot_w.inner_meters(),
                cfg.bounds.min_y + ((row as f64) + 0.5) * slot_h.inner_meters(),
            );
            let center = base.offset(
                rng.gen_range(-cfg.jitter..cfg.jitter) * slot_w.inner_meters(),
                rng.gen_range(-cfg.jitter..cfg.jitter) * slot_h.inner_meters(),
            );
            let angle = Angle::degrees(rng.gen_range(0.0..180.0)).snap_to_degs(cfg.angle_step_degs);
            let period = rng.gen_range(cfg.period_min..=cfg.period_max);
            let phase = rng.gen_range(0..period);

            let mut patch = Patch {
                id: PatchID(patches.len()),
                center,
                angle,
                period,
                phase,
                u_offsets: Vec::new(),
                v_offsets: Vec::new(),
            };
            let (min_u, max_u, min_v, max_v) = patch.local_extents(&cfg.bounds);
            patch.u_offsets =
                grid_lines(cfg, rng, min_u - cfg.extent_margin, max_u + cfg.extent_margin);
            patch.v_offsets =
                grid_lines(cfg, rng, min_v - cfg.extent_margin, max_v + cfg.extent_margin);
            patches.push(patch);
        }
    }
    patches
}

/// Random-walks grid-line offsets outward from a jittered start until they
/// cover [min, max]. Always returns an ascending list spanning the range.
fn grid_lines(
    cfg: &Config,
    rng: &mut XorShiftRng,
    min: Distance,
    max: Distance,
) -> Vec<Distance> {
    let start = cfg.cell_max * rng.gen_range(-0.5..0.5);

    let mut offsets = vec![start];
    while *offsets.last().unwrap() > min {
        let prev = *offsets.last().unwrap();
        offsets.push(prev - rand_dist(rng, cfg.cell_min, cfg.cell_max));
    }
    offsets.reverse();
    while *offsets.last().unwrap() < max {
        let prev = *offsets.last().unwrap();
        offsets.push(prev + rand_dist(rng, cfg.cell_min, cfg.cell_max));
    }
    offsets
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn patches_cover_the_world() {
        let cfg = Config::new(Distance::meters(500.0), Distance::ZERO);
        let mut rng = XorShiftRng::seed_from_u64(42);
        let patches = plan_patches(&cfg, &mut rng);
        assert_eq!(patches.len(), cfg.patch_rows * cfg.patch_cols);

        for (idx, patch) in patches.iter().enumerate() {
            assert_eq!(patch.id, PatchID(idx));
            assert!(patch.period >= cfg.period_min && patch.period <= cfg.period_max);
            assert!(patch.phase < patch.period);

            // Distances keep trimmed precision, so leave a little slack
            let slack = Distance::meters(0.001);
            for offsets in [&patch.u_offsets, &patch.v_offsets] {
                assert!(offsets.len() >= 2);
                for pair in offsets.windows(2) {
                    let gap = pair[1] - pair[0];
                    assert!(gap >= cfg.cell_min - slack && gap <= cfg.cell_max + slack);
                }
            }
            let (min_u, max_u, min_v, max_v) = patch.local_extents(&cfg.bounds);
            assert!(*patch.u_offsets.first().unwrap() <= min_u - cfg.extent_margin + slack);
            assert!(*patch.u_offsets.last().unwrap() >= max_u + cfg.extent_margin - slack);
            assert!(*patch.v_offsets.first().unwrap() <= min_v - cfg.extent_margin + slack);
            assert!(*patch.v_offsets.last().unwrap() >= max_v + cfg.extent_margin - slack);
        }
    }

    #[test]
    fn same_seed_same_plan() {
        let cfg = Config::new(Distance::meters(500.0), Distance::ZERO);
        let a = plan_patches(&cfg, &mut XorShiftRng::seed_from_u64(7));
        let b = plan_patches(&cfg, &mut XorShiftRng::seed_from_u64(7));
        for (p1, p2) in a.iter().zip(b.iter()) {
            assert_eq!(p1.center, p2.center);
            assert_eq!(p1.angle, p2.angle);
            assert_eq!(p1.u_offsets, p2.u_offsets);
            assert_eq!(p1.v_offsets, p2.v_offsets);
        }
    }
}
