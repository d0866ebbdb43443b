use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unit moves in expansion order: up, down, left, right.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }

    /// `None` when the move leaves the `i32` range.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    /// Manhattan distance; admissible and consistent for 4-directional unit moves.
    /// Saturates at `u32::MAX` for coordinates at opposite ends of the `i32` range.
    pub fn manhattan(self, other: Coordinate) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid must have non-zero dimensions (got {width}x{height})")]
    ZeroDimension { width: u32, height: u32 },
    #[error("grid dimensions {width}x{height} exceed the supported coordinate range")]
    TooLarge { width: u32, height: u32 },
    #[error("{at} lies outside the {width}x{height} grid")]
    OutOfBounds { at: Coordinate, width: u32, height: u32 },
    #[error("{at} is a barrier")]
    Blocked { at: Coordinate },
    #[error("{at} already holds a task")]
    TaskOccupied { at: Coordinate },
}

/// The host-owned world the search core reads from.
///
/// The core only reads bounds, barriers and task keys; the single mutation it
/// performs is `complete_task` once the agent stands on an active task.
pub trait GridWorld {
    type Task;

    fn is_within_bounds(&self, at: Coordinate) -> bool;

    fn is_barrier(&self, at: Coordinate) -> bool;

    /// Active task coordinates in a stable, deterministic order.
    fn task_coordinates(&self) -> Vec<Coordinate>;

    fn has_task(&self, at: Coordinate) -> bool;

    fn complete_task(&mut self, at: Coordinate) -> Option<Self::Task>;

    fn is_walkable(&self, at: Coordinate) -> bool {
        self.is_within_bounds(at) && !self.is_barrier(at)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub label: String,
}

/// In-memory rectangular grid with static barriers and a task mapping.
#[derive(Clone, Debug)]
pub struct Grid {
    width: u32,
    height: u32,
    barriers: HashSet<Coordinate>,
    tasks: BTreeMap<Coordinate, Task>,
    next_task_id: u64,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroDimension { width, height });
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(GridError::TooLarge { width, height });
        }

        Ok(Self {
            width,
            height,
            barriers: HashSet::new(),
            tasks: BTreeMap::new(),
            next_task_id: 1,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn check_bounds(&self, at: Coordinate) -> Result<(), GridError> {
        if self.is_within_bounds(at) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                at,
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn add_barrier(&mut self, at: Coordinate) -> Result<(), GridError> {
        self.check_bounds(at)?;
        if self.tasks.contains_key(&at) {
            return Err(GridError::TaskOccupied { at });
        }
        self.barriers.insert(at);
        Ok(())
    }

    /// Host-side task placement. Returns the new task id.
    pub fn add_task(&mut self, at: Coordinate, label: impl Into<String>) -> Result<u64, GridError> {
        self.check_bounds(at)?;
        if self.barriers.contains(&at) {
            return Err(GridError::Blocked { at });
        }
        if self.tasks.contains_key(&at) {
            return Err(GridError::TaskOccupied { at });
        }

        let id = self.next_task_id;
        self.next_task_id += 1;
        self.tasks.insert(
            at,
            Task {
                id,
                label: label.into(),
            },
        );
        Ok(id)
    }

    pub fn barriers(&self) -> impl Iterator<Item = &Coordinate> {
        self.barriers.iter()
    }

    pub fn barrier_count(&self) -> usize {
        self.barriers.len()
    }

    pub fn tasks(&self) -> impl Iterator<Item = (&Coordinate, &Task)> {
        self.tasks.iter()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn task(&self, at: Coordinate) -> Option<&Task> {
        self.tasks.get(&at)
    }
}

impl GridWorld for Grid {
    type Task = Task;

    fn is_within_bounds(&self, at: Coordinate) -> bool {
        // Dimensions are validated to fit in i32 at construction.
        at.x >= 0 && at.y >= 0 && (at.x as u32) < self.width && (at.y as u32) < self.height
    }

    fn is_barrier(&self, at: Coordinate) -> bool {
        self.barriers.contains(&at)
    }

    fn task_coordinates(&self) -> Vec<Coordinate> {
        self.tasks.keys().copied().collect()
    }

    fn has_task(&self, at: Coordinate) -> bool {
        self.tasks.contains_key(&at)
    }

    fn complete_task(&mut self, at: Coordinate) -> Option<Task> {
        self.tasks.remove(&at)
    }
}
