pub mod modules;

pub use modules::agent::{ALGORITHM_NAME, Agent, AgentStatus, Completion, Movement};
pub use modules::cost::{CostLedger, CostPolicy};
pub use modules::grid::{Coordinate, Grid, GridError, GridWorld, NEIGHBOR_OFFSETS, Task};
pub use modules::logging;
pub use modules::map::{self, GenerateMap, MapError, MapSpec, TaskSpec};
pub use modules::pathfinder::{Path, Route, find_path, walkable_neighbors};
pub use modules::selector::{Selection, select_nearest, select_nearest_among};
pub use modules::sim::{Event, Simulation, TickResult};
pub use modules::state::{self, RunSummary, RuntimeState, Status};
pub use modules::view::{
    AgentSnapshot, TaskView, WorldSnapshot, save_world_snapshot, save_world_snapshot_tick,
    snapshot_file_path, snapshots_dir,
};
