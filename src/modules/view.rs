use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::modules::agent::{ALGORITHM_NAME, AgentStatus};
use crate::modules::cost::CostPolicy;
use crate::modules::grid::Coordinate;
use crate::modules::state::home_dir;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub position: Coordinate,
    pub status: AgentStatus,
    pub target: Option<Coordinate>,
    pub path: Vec<Coordinate>,
    pub explored: usize,
    pub tasks_completed: usize,
    pub policy: CostPolicy,
    pub total_path_cost: u64,
    pub traversal_cost: u64,
    pub search_cost: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: u64,
    pub label: String,
    pub position: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: u32,
    pub height: u32,
    pub barriers: Vec<Coordinate>,
    pub tasks: Vec<TaskView>,
    pub agent: AgentSnapshot,
}

impl WorldSnapshot {
    /// Text frame: `#` barrier, `T` task, `*` planned path, `A` agent, `.` free.
    pub fn render(&self) -> String {
        let barriers: HashSet<Coordinate> = self.barriers.iter().copied().collect();
        let tasks: HashSet<Coordinate> = self.tasks.iter().map(|t| t.position).collect();
        let path: HashSet<Coordinate> = self.agent.path.iter().copied().collect();

        let mut out = String::new();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let at = Coordinate::new(x, y);
                let glyph = if at == self.agent.position {
                    'A'
                } else if barriers.contains(&at) {
                    '#'
                } else if tasks.contains(&at) {
                    'T'
                } else if path.contains(&at) {
                    '*'
                } else {
                    '.'
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }

    /// The algorithm label and running cost shown beside a rendered frame.
    pub fn info_lines(&self) -> [String; 2] {
        [
            format!("Algorithm: {}", ALGORITHM_NAME),
            format!(
                "Total Path Cost: {} (policy={})",
                self.agent.total_path_cost, self.agent.policy
            ),
        ]
    }
}

pub fn snapshot_file_path() -> PathBuf {
    home_dir().join("world_snapshot.json")
}

pub fn snapshots_dir() -> PathBuf {
    snapshots_dir_in(&home_dir())
}

fn snapshots_dir_in(home: &Path) -> PathBuf {
    home.join("world_snapshots")
}

pub fn save_world_snapshot(snapshot: &WorldSnapshot) -> io::Result<PathBuf> {
    write_snapshot(&snapshot_file_path(), snapshot)
}

/// Writes `world_snapshots/tick_NNNNNN.json` alongside the latest snapshot.
pub fn save_world_snapshot_tick(snapshot: &WorldSnapshot) -> io::Result<PathBuf> {
    save_world_snapshot_tick_in(&home_dir(), snapshot)
}

fn save_world_snapshot_tick_in(home: &Path, snapshot: &WorldSnapshot) -> io::Result<PathBuf> {
    let path = snapshots_dir_in(home).join(format!("tick_{:06}.json", snapshot.tick));
    write_snapshot(&path, snapshot)
}

fn write_snapshot(path: &Path, snapshot: &WorldSnapshot) -> io::Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(snapshot)?;
    fs::write(path, json)?;
    Ok(path.to_path_buf())
}
