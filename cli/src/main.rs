//! A small multi-tool for generating road networks and poking at the results.

#[macro_use]
extern crate log;

use anyhow::Result;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use structopt::StructOpt;

use geom::Distance;
use street_gen::{Config, GeneratedWorld, LayoutGenerator, ProgressSink};

#[derive(StructOpt)]
#[structopt(name = "street_gen", about = "Procedural road network multi-tool")]
enum Command {
    /// Generates a road network and writes it as JSON
    Generate {
        /// A seed for generating random numbers
        #[structopt(long, default_value = "42")]
        rng_seed: u64,
        /// The world is a square this many meters across
        #[structopt(long, default_value = "400")]
        world_size: f64,
        /// Keep a centered square park this many meters across free of roads.
        /// 0 means no park.
        #[structopt(long, default_value = "80")]
        park_size: f64,
        /// The path to write the JSON results
        #[structopt(long)]
        output: String,
    },
    /// Reads a generated world from JSON and prints summary statistics
    Describe {
        #[structopt()]
        path: String,
    },
}

fn main() -> Result<()> {
    {
        use env_logger::{Builder, Env};
        Builder::from_env(Env::default().default_filter_or("info")).init();
    }

    match Command::from_args() {
        Command::Generate {
            rng_seed,
            world_size,
            park_size,
            output,
        } => generate(rng_seed, world_size, park_size, output),
        Command::Describe { path } => describe(path),
    }
}

fn generate(rng_seed: u64, world_size: f64, park_size: f64, output: String) -> Result<()> {
    let cfg = Config::new(Distance::meters(world_size), Distance::meters(park_size));
    let rng = XorShiftRng::seed_from_u64(rng_seed);
    let mut generator = LayoutGenerator::new(cfg, rng);
    let world = generator.run_to_completion(&mut LogProgress::default());
    fs_err::write(&output, serde_json::to_string_pretty(&world)?)?;
    info!("Wrote {}", output);
    Ok(())
}

fn describe(path: String) -> Result<()> {
    let world: GeneratedWorld = serde_json::from_slice(&fs_err::read(&path)?)?;
    println!(
        "{}: {} roads, {} intersections",
        path,
        world.roads.len(),
        world.layout.intersections.len()
    );
    let arterial = world
        .roads
        .iter()
        .filter(|r| r.class == street_gen::RoadClass::Arterial)
        .count();
    println!("  {} arterial, {} local", arterial, world.roads.len() - arterial);
    Ok(())
}

/// Logs stage changes, and progress at most every 10%.
#[derive(Default)]
struct LogProgress {
    last_logged: f64,
}

impl ProgressSink for LogProgress {
    fn progress(&mut self, fraction: f64) {
        if fraction - self.last_logged >= 0.1 {
            self.last_logged = fraction;
            info!("{}% done", (fraction * 100.0).round());
        }
    }

    fn status(&mut self, label: &str) {
        info!("{}", label);
    }
}
