use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use gridwalk::{
    CostPolicy, GenerateMap, Simulation,
    map::{self as maps, default_map_path},
};

use super::{CoordinateArg, load_map};

#[derive(Subcommand)]
pub enum MapCommand {
    /// Generate a random map and save it as JSON
    Generate {
        #[arg(long, default_value_t = 20)]
        width: u32,
        #[arg(long, default_value_t = 15)]
        height: u32,
        /// Probability (0.0-1.0) that a cell becomes a barrier
        #[arg(long, default_value_t = 0.2)]
        barriers: f64,
        /// Number of tasks to place
        #[arg(long, default_value_t = 5)]
        tasks: u32,
        /// Spawn cell as x,y (kept free of barriers and tasks)
        #[arg(long, default_value = "0,0")]
        spawn: CoordinateArg,
        /// Optional RNG seed for a reproducible layout
        #[arg(long)]
        seed: Option<u64>,
        /// Output file (defaults to .gridwalk/map.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a map as text
    Show {
        /// Map file (defaults to .gridwalk/map.json)
        #[arg(long)]
        map: Option<PathBuf>,
    },
}

pub(super) fn run_map(cmd: MapCommand) -> Result<()> {
    match cmd {
        MapCommand::Generate {
            width,
            height,
            barriers,
            tasks,
            spawn,
            seed,
            out,
        } => {
            let spec = maps::generate(&GenerateMap {
                width,
                height,
                spawn: spawn.0,
                barrier_density: barriers,
                tasks,
                seed,
            })?;
            let path = out.unwrap_or_else(default_map_path);
            maps::save(&spec, &path)?;

            println!(
                "Generated {}x{} map with {} barrier(s) and {} task(s) at {}",
                spec.width,
                spec.height,
                spec.barriers.len(),
                spec.tasks.len(),
                path.display()
            );
            println!("Digest: {}", spec.digest());
        }
        MapCommand::Show { map } => {
            let (path, spec) = load_map(map)?;
            let grid = spec
                .build()
                .with_context(|| format!("invalid map {}", path.display()))?;
            let sim = Simulation::new(grid, spec.spawn, CostPolicy::default())?;
            let snapshot = sim.snapshot();

            println!(
                "{} | {}x{} | barriers={} | tasks={} | spawn={}",
                path.display(),
                snapshot.width,
                snapshot.height,
                snapshot.barriers.len(),
                snapshot.tasks.len(),
                spec.spawn
            );
            print!("{}", snapshot.render());
            for task in &snapshot.tasks {
                println!(" - task #{} '{}' at {}", task.id, task.label, task.position);
            }
        }
    }

    Ok(())
}
