//! End-to-end properties of full generation runs.

use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

use geom::Distance;
use street_gen::{Config, DiscardProgress, GeneratedWorld, LayoutGenerator};

fn generate(seed: u64, world_size: f64, park_size: f64) -> GeneratedWorld {
    let cfg = Config::new(Distance::meters(world_size), Distance::meters(park_size));
    let mut gen = LayoutGenerator::new(cfg, XorShiftRng::seed_from_u64(seed));
    gen.run_to_completion(&mut DiscardProgress)
}

#[test]
fn same_seed_same_world() {
    let a = generate(42, 400.0, 80.0);
    let b = generate(42, 400.0, 80.0);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );

    let c = generate(43, 400.0, 80.0);
    assert_ne!(a, c);
}

#[test]
fn roads_stay_inside_the_world() {
    for seed in 0..5 {
        let world = generate(seed, 400.0, 80.0);
        for road in &world.roads {
            assert!(
                world.layout.bounds.contains(road.pt1) && world.layout.bounds.contains(road.pt2),
                "seed {}: road from {} to {} leaves the world",
                seed,
                road.pt1,
                road.pt2
            );
        }
    }
}

#[test]
fn intersections_are_well_formed() {
    let mut total = 0;
    for seed in 0..5 {
        let world = generate(seed, 400.0, 0.0);
        for data in &world.layout.intersections {
            assert!(data.polygon.points().len() >= 3);
            // One connector per polygon edge
            assert_eq!(data.connectors.len(), data.polygon.points().len());
            for connector in &data.connectors {
                assert!(connector.width > Distance::ZERO);
            }
        }
        total += world.layout.intersections.len();
    }
    // Patch seams and connectors reliably produce crossings somewhere
    assert!(total > 0);
}

#[test]
fn a_lone_patch_is_a_pure_grid() {
    // With a single patch there are no seams to connect and no foreign
    // segments to cross, so every road is a grid edge meeting its neighbors
    // only at shared corners. Fraying is off; extended endpoints could
    // otherwise poke into neighboring edges.
    for seed in 0..3 {
        let mut cfg = Config::new(Distance::meters(400.0), Distance::ZERO);
        cfg.patch_rows = 1;
        cfg.patch_cols = 1;
        cfg.fray_radius = Distance::ZERO;
        let mut gen = LayoutGenerator::new(cfg, XorShiftRng::seed_from_u64(seed));
        let world = gen.run_to_completion(&mut DiscardProgress);

        assert!(!world.roads.is_empty());
        assert!(world.layout.intersections.is_empty());
    }
}

#[test]
fn park_stays_clear_of_grid_roads() {
    let world = generate(7, 400.0, 150.0);
    // Cell rejection keeps the grid out of the park, up to one cell of slack
    // at the fringe where a cell's inset samples all fall outside.
    let park = &world.layout.park;
    let slack = 35.0;
    for road in &world.roads {
        for pt in [road.pt1, road.pt2] {
            let deep = pt.x() > park.min_x + slack
                && pt.x() < park.max_x - slack
                && pt.y() > park.min_y + slack
                && pt.y() < park.max_y - slack;
            assert!(!deep, "road endpoint {} is deep inside the park", pt);
        }
    }
}
