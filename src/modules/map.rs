use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::modules::grid::{Coordinate, Grid, GridError, GridWorld};
use crate::modules::state::home_dir;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read or write map file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse map file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid map: {0}")]
    Grid(#[from] GridError),
    #[error("barrier density must be within 0.0..=1.0 (got {0})")]
    Density(f64),
    #[error("only {free} free cell(s) available for {requested} task(s)")]
    NotEnoughRoom { free: usize, requested: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub position: Coordinate,
    #[serde(default)]
    pub label: Option<String>,
}

/// On-disk description of a world: dimensions, spawn, barriers and tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSpec {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub spawn: Coordinate,
    #[serde(default)]
    pub barriers: Vec<Coordinate>,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl MapSpec {
    /// Validates the map and builds the in-memory grid.
    pub fn build(&self) -> Result<Grid, GridError> {
        let mut grid = Grid::new(self.width, self.height)?;
        for barrier in &self.barriers {
            grid.add_barrier(*barrier)?;
        }
        for (idx, task) in self.tasks.iter().enumerate() {
            let label = task
                .label
                .clone()
                .unwrap_or_else(|| format!("task-{}", idx + 1));
            grid.add_task(task.position, label)?;
        }
        if !grid.is_walkable(self.spawn) {
            return Err(if grid.is_within_bounds(self.spawn) {
                GridError::Blocked { at: self.spawn }
            } else {
                GridError::OutOfBounds {
                    at: self.spawn,
                    width: self.width,
                    height: self.height,
                }
            });
        }
        Ok(grid)
    }

    /// Hex SHA-256 of the compact JSON encoding.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }
}

pub fn default_map_path() -> PathBuf {
    home_dir().join("map.json")
}

pub fn load(path: &Path) -> Result<MapSpec, MapError> {
    let bytes = fs::read(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| MapError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save(spec: &MapSpec, path: &Path) -> Result<(), MapError> {
    let io_err = |source: io::Error| MapError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_vec_pretty(spec).map_err(|e| io_err(io::Error::other(e)))?;
    fs::write(path, json).map_err(io_err)
}

#[derive(Debug, Clone)]
pub struct GenerateMap {
    pub width: u32,
    pub height: u32,
    pub spawn: Coordinate,
    /// Probability that any non-spawn cell becomes a barrier.
    pub barrier_density: f64,
    pub tasks: u32,
    pub seed: Option<u64>,
}

/// Random map. The spawn cell is never a barrier and never holds a task.
pub fn generate(cmd: &GenerateMap) -> Result<MapSpec, MapError> {
    if !(0.0..=1.0).contains(&cmd.barrier_density) {
        return Err(MapError::Density(cmd.barrier_density));
    }
    // Validates dimensions and spawn before any sampling.
    let grid = Grid::new(cmd.width, cmd.height)?;
    if !grid.is_within_bounds(cmd.spawn) {
        return Err(GridError::OutOfBounds {
            at: cmd.spawn,
            width: cmd.width,
            height: cmd.height,
        }
        .into());
    }

    let mut rng = match cmd.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut barriers = Vec::new();
    let mut free = Vec::new();
    for y in 0..cmd.height as i32 {
        for x in 0..cmd.width as i32 {
            let at = Coordinate::new(x, y);
            if at == cmd.spawn {
                continue;
            }
            if rng.gen_bool(cmd.barrier_density) {
                barriers.push(at);
            } else {
                free.push(at);
            }
        }
    }

    if free.len() < cmd.tasks as usize {
        return Err(MapError::NotEnoughRoom {
            free: free.len(),
            requested: cmd.tasks,
        });
    }

    let mut positions: Vec<Coordinate> = free
        .choose_multiple(&mut rng, cmd.tasks as usize)
        .copied()
        .collect();
    positions.sort();

    let tasks = positions
        .into_iter()
        .enumerate()
        .map(|(idx, position)| TaskSpec {
            position,
            label: Some(format!("task-{}", idx + 1)),
        })
        .collect();

    Ok(MapSpec {
        width: cmd.width,
        height: cmd.height,
        spawn: cmd.spawn,
        barriers,
        tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_cmd(seed: u64) -> GenerateMap {
        GenerateMap {
            width: 12,
            height: 9,
            spawn: Coordinate::new(2, 3),
            barrier_density: 0.25,
            tasks: 6,
            seed: Some(seed),
        }
    }

    #[test]
    fn same_seed_same_map() {
        let a = generate(&generate_cmd(7)).unwrap();
        let b = generate(&generate_cmd(7)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn generated_map_builds_and_keeps_spawn_clear() {
        let spec = generate(&generate_cmd(42)).unwrap();
        assert_eq!(spec.tasks.len(), 6);
        assert!(!spec.barriers.contains(&spec.spawn));
        assert!(spec.tasks.iter().all(|t| t.position != spec.spawn));

        let grid = spec.build().unwrap();
        assert_eq!(grid.task_count(), 6);
        assert!(grid.is_walkable(spec.spawn));
    }

    #[test]
    fn rejects_bad_density_and_overfull_task_counts() {
        let mut cmd = generate_cmd(1);
        cmd.barrier_density = 1.5;
        assert!(matches!(generate(&cmd), Err(MapError::Density(_))));

        let mut cmd = generate_cmd(1);
        cmd.barrier_density = 1.0;
        assert!(matches!(
            generate(&cmd),
            Err(MapError::NotEnoughRoom { free: 0, .. })
        ));
    }

    #[test]
    fn rejects_zero_sized_maps() {
        let mut cmd = generate_cmd(1);
        cmd.width = 0;
        assert!(matches!(
            generate(&cmd),
            Err(MapError::Grid(GridError::ZeroDimension { .. }))
        ));
    }

    #[test]
    fn build_rejects_spawn_on_barrier() {
        let spec = MapSpec {
            width: 3,
            height: 3,
            spawn: Coordinate::new(1, 1),
            barriers: vec![Coordinate::new(1, 1)],
            tasks: Vec::new(),
        };
        assert_eq!(
            spec.build().unwrap_err(),
            GridError::Blocked {
                at: Coordinate::new(1, 1)
            }
        );
    }

    #[test]
    fn unlabeled_tasks_get_default_labels() {
        let json = r#"{
            "width": 4,
            "height": 4,
            "barriers": [{"x": 1, "y": 1}],
            "tasks": [{"position": {"x": 3, "y": 3}}]
        }"#;
        let spec: MapSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.spawn, Coordinate::origin());

        let grid = spec.build().unwrap();
        assert_eq!(grid.task(Coordinate::new(3, 3)).unwrap().label, "task-1");
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("map.json");
        let spec = generate(&generate_cmd(3)).unwrap();

        save(&spec, &path).unwrap();
        assert_eq!(load(&path).unwrap(), spec);
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(load(&missing), Err(MapError::Io { .. })));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, b"{ not json").unwrap();
        assert!(matches!(load(&broken), Err(MapError::Parse { .. })));
    }
}
