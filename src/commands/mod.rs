use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use gridwalk::{
    ALGORITHM_NAME, Coordinate, CostPolicy, Event, MapSpec, RunSummary, Simulation, TickResult,
    save_world_snapshot, save_world_snapshot_tick,
    state::{self, Status},
};
use tracing::warn;

mod map;
mod route;

use map::{MapCommand, run_map};
use route::{RouteFormat, run_route};

#[derive(Parser)]
#[command(
    name = "gridwalk",
    version,
    about = "Grid agent that walks A* routes to the nearest task",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize local state under .gridwalk (or $GRIDWALK_HOME)
    Init,
    /// Show runtime status and the last run summary
    Status,
    /// Map operations (generate, show)
    Map {
        #[command(subcommand)]
        command: MapCommand,
    },
    /// Compute a single A* route between two cells
    Route {
        /// Map file (defaults to .gridwalk/map.json)
        #[arg(long)]
        map: Option<PathBuf>,
        /// Start cell as x,y
        #[arg(long)]
        from: CoordinateArg,
        /// Goal cell as x,y
        #[arg(long)]
        to: CoordinateArg,
        /// Output format
        #[arg(long, default_value_t = RouteFormat::Text, value_enum)]
        format: RouteFormat,
    },
    /// Run the agent until every reachable task is done or the tick budget runs out
    Run {
        /// Map file (defaults to .gridwalk/map.json)
        #[arg(long)]
        map: Option<PathBuf>,
        /// Spawn cell as x,y (defaults to the map's spawn)
        #[arg(short = 's', long)]
        spawn: Option<CoordinateArg>,
        /// Number of ticks to run (omit to run until the agent settles)
        #[arg(short = 't', long)]
        ticks: Option<u64>,
        /// Desired tick rate (ticks per second). If set, overrides delay-ms.
        #[arg(long)]
        tick_rate: Option<f64>,
        /// Delay between ticks in milliseconds (0 runs unpaced)
        #[arg(short = 'd', long, default_value_t = 0)]
        delay_ms: u64,
        /// What counts toward the reported path cost
        #[arg(long, default_value_t = CostPolicy::TraversalAndSearch, value_enum)]
        policy: CostPolicy,
        /// Print the grid after every tick
        #[arg(long, action = ArgAction::SetTrue, default_value_t = false)]
        render: bool,
        /// Write a JSON world snapshot for every tick
        #[arg(long, action = ArgAction::SetTrue, default_value_t = false)]
        snapshots: bool,
        /// Only print the final summary
        #[arg(short = 'q', long, action = ArgAction::SetTrue, default_value_t = false)]
        quiet: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinateArg(pub Coordinate);

impl FromStr for CoordinateArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<_> = s.trim().split(',').collect();
        if parts.len() != 2 {
            return Err("Coordinate must be formatted as x,y".into());
        }

        let x = parts[0]
            .trim()
            .parse::<i32>()
            .map_err(|_| "x must be an integer")?;
        let y = parts[1]
            .trim()
            .parse::<i32>()
            .map_err(|_| "y must be an integer")?;

        Ok(CoordinateArg(Coordinate::new(x, y)))
    }
}

pub fn run() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli.command) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Init => run_init(),
        Command::Status => run_status(),
        Command::Map { command } => run_map(command),
        Command::Route {
            map,
            from,
            to,
            format,
        } => run_route(map, from.0, to.0, format),
        Command::Run {
            map,
            spawn,
            ticks,
            tick_rate,
            delay_ms,
            policy,
            render,
            snapshots,
            quiet,
        } => run_sim(RunOptions {
            map,
            spawn: spawn.map(|s| s.0),
            ticks,
            tick_rate,
            delay_ms,
            policy,
            render,
            snapshots,
            quiet,
        }),
    }
}

pub(crate) fn load_map(path: Option<PathBuf>) -> Result<(PathBuf, MapSpec)> {
    let path = path.unwrap_or_else(gridwalk::map::default_map_path);
    let spec = gridwalk::map::load(&path)
        .context("no usable map; create one with `gridwalk map generate`")?;
    Ok((path, spec))
}

fn run_init() -> Result<()> {
    state::init_state().context("initialize state")?;
    println!(
        "Initialized state at {}",
        state::state_file_path().display()
    );
    Ok(())
}

fn run_status() -> Result<()> {
    match state::load_state()? {
        None => {
            println!("Status: not initialized. Run `gridwalk init`.");
        }
        Some(state) => {
            println!(
                "Status: {:?} | last_tick={} | message={}",
                state.status,
                state.last_tick,
                state.message.unwrap_or_else(|| "-".into())
            );
            if let Some(run) = state.last_run {
                println!(
                    "Last run: ticks={} | tasks_completed={} | tasks_remaining={} | finished_at={}",
                    run.ticks, run.tasks_completed, run.tasks_remaining, run.finished_at
                );
                println!(
                    "Cost: total={} ({}) | traversal={} | search={} over {} search(es)",
                    run.total_path_cost,
                    run.policy,
                    run.traversal_cost,
                    run.search_cost,
                    run.searches
                );
                println!("Map digest: {}", run.map_digest);
            }
        }
    }
    Ok(())
}

struct RunOptions {
    map: Option<PathBuf>,
    spawn: Option<Coordinate>,
    ticks: Option<u64>,
    tick_rate: Option<f64>,
    delay_ms: u64,
    policy: CostPolicy,
    render: bool,
    snapshots: bool,
    quiet: bool,
}

fn run_sim(opts: RunOptions) -> Result<()> {
    let (map_path, spec) = load_map(opts.map)?;
    let grid = spec
        .build()
        .with_context(|| format!("invalid map {}", map_path.display()))?;
    let spawn = opts.spawn.unwrap_or(spec.spawn);
    let mut sim = Simulation::new(grid, spawn, opts.policy)?;

    let delay = tick_delay(opts.tick_rate, opts.delay_ms)?;

    if state::load_state()?.is_none() {
        state::init_state()?;
    }
    state::set_status(Status::Running, 0, Some("agent loop running".into()))?;

    println!(
        "Map {} | {}x{} | barriers={} | tasks={} | spawn={}",
        map_path.display(),
        sim.grid().width(),
        sim.grid().height(),
        sim.grid().barrier_count(),
        sim.grid().task_count(),
        spawn
    );
    println!("Algorithm: {} | cost policy: {}", ALGORITHM_NAME, opts.policy);

    for event in sim.start() {
        if !opts.quiet {
            println!(" - {}", describe_event(&event));
        }
    }
    if opts.render {
        print_frame(&sim);
    }

    let mut remaining = opts.ticks;
    while !sim.is_settled() {
        if let Some(0) = remaining {
            break;
        }

        let tick = sim.step();
        if !opts.quiet {
            print_tick(&tick, &sim);
        }
        if opts.render {
            print_frame(&sim);
        }
        if opts.snapshots {
            persist_world_view(&sim);
        }

        if let Some(n) = remaining.as_mut() {
            *n = n.saturating_sub(1);
        }

        if delay > Duration::ZERO && !sim.is_settled() {
            std::thread::sleep(delay);
        }
    }

    let summary = summarize(&sim, &spec);
    print_summary(&summary);
    state::record_run(summary).context("record run summary")?;
    Ok(())
}

/// Pause between ticks; `tick_rate` (ticks per second) overrides `delay_ms`.
fn tick_delay(tick_rate: Option<f64>, delay_ms: u64) -> Result<Duration> {
    match tick_rate {
        Some(rate) => {
            // Also rejects NaN.
            if !(rate > 0.0) {
                bail!("tick_rate must be greater than 0 (got {})", rate);
            }
            Duration::try_from_secs_f64(1.0 / rate)
                .with_context(|| format!("tick_rate {} is too small", rate))
        }
        None => Ok(Duration::from_millis(delay_ms)),
    }
}

fn summarize(sim: &Simulation, spec: &MapSpec) -> RunSummary {
    let ledger = sim.agent().ledger();
    RunSummary {
        ticks: sim.tick(),
        policy: ledger.policy(),
        total_path_cost: ledger.total(),
        traversal_cost: ledger.traversal(),
        search_cost: ledger.search(),
        searches: ledger.searches(),
        tasks_completed: sim.agent().tasks_completed(),
        tasks_remaining: sim.grid().task_count(),
        map_digest: spec.digest(),
        finished_at: Utc::now().to_rfc3339(),
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Finished after {} tick(s): tasks_completed={} | tasks_remaining={}",
        summary.ticks, summary.tasks_completed, summary.tasks_remaining
    );
    println!(
        "Total Path Cost: {} (traversal={} search={} policy={})",
        summary.total_path_cost, summary.traversal_cost, summary.search_cost, summary.policy
    );
}

fn print_tick(tick: &TickResult, sim: &Simulation) {
    println!("Tick {}", tick.tick);
    for event in &tick.events {
        match event {
            Event::TickStarted { .. } | Event::TickCompleted { .. } => {}
            other => println!(" - {}", describe_event(other)),
        }
    }
    let agent = sim.agent();
    println!(
        "Agent at {} | {:?} | remaining_steps={} | tasks_completed={} | Total Path Cost: {}",
        agent.position(),
        agent.status(),
        agent.remaining_steps(),
        agent.tasks_completed(),
        agent.total_path_cost()
    );
}

fn print_frame(sim: &Simulation) {
    let snapshot = sim.snapshot();
    print!("{}", snapshot.render());
    for line in snapshot.info_lines() {
        println!("{}", line);
    }
}

fn describe_event(event: &Event) -> String {
    match event {
        Event::TickStarted { tick } => format!("tick {} started", tick),
        Event::TickCompleted { tick } => format!("tick {} completed", tick),
        Event::PathPlanned {
            from,
            target,
            steps,
            reachable,
        } => format!(
            "planned {} step(s) from {} to task at {} ({} reachable task(s))",
            steps, from, target, reachable
        ),
        Event::AgentMoved { from, to } => format!("moved {} -> {}", from, to),
        Event::TaskCompleted {
            at,
            task_id,
            label,
            completed,
        } => format!(
            "completed task #{} '{}' at {} (total completed={})",
            task_id, label, at, completed
        ),
        Event::AgentIdle {
            position,
            tasks_remaining,
        } => {
            if *tasks_remaining == 0 {
                format!("idle at {}: no tasks left", position)
            } else {
                format!(
                    "idle at {}: {} task(s) unreachable",
                    position, tasks_remaining
                )
            }
        }
    }
}

fn persist_world_view(sim: &Simulation) {
    let snapshot = sim.snapshot();
    if let Err(err) = save_world_snapshot(&snapshot) {
        warn!(error = %err, "failed to write world snapshot");
    }
    if let Err(err) = save_world_snapshot_tick(&snapshot) {
        warn!(error = %err, "failed to write tick snapshot");
    }
}
