use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::modules::cost::{CostLedger, CostPolicy};
use crate::modules::grid::{Coordinate, GridWorld};
use crate::modules::selector::{Selection, select_nearest};

pub const ALGORITHM_NAME: &str = "A*";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Idle,
    Moving,
}

/// A task consumed by the agent and what it planned next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion<T> {
    pub at: Coordinate,
    pub task: T,
    pub next: Option<Selection>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Movement<T> {
    pub from: Coordinate,
    pub to: Coordinate,
    pub completion: Option<Completion<T>>,
}

/// Single grid-walking agent. Advances one cell per `step`.
#[derive(Clone, Debug)]
pub struct Agent {
    position: Coordinate,
    path: VecDeque<Coordinate>,
    target: Option<Coordinate>,
    ledger: CostLedger,
    explored: Vec<Coordinate>,
    completed: Vec<Coordinate>,
}

impl Agent {
    pub fn new(position: Coordinate, policy: CostPolicy) -> Self {
        Self {
            position,
            path: VecDeque::new(),
            target: None,
            ledger: CostLedger::new(policy),
            explored: Vec::new(),
            completed: Vec::new(),
        }
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    pub fn status(&self) -> AgentStatus {
        if self.path.is_empty() {
            AgentStatus::Idle
        } else {
            AgentStatus::Moving
        }
    }

    pub fn path(&self) -> impl Iterator<Item = &Coordinate> {
        self.path.iter()
    }

    pub fn remaining_steps(&self) -> usize {
        self.path.len()
    }

    pub fn target(&self) -> Option<Coordinate> {
        self.target
    }

    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    pub fn total_path_cost(&self) -> u64 {
        self.ledger.total()
    }

    /// Every cell moved into, in order.
    pub fn explored(&self) -> &[Coordinate] {
        &self.explored
    }

    pub fn tasks_completed(&self) -> usize {
        self.completed.len()
    }

    pub fn completed_tasks(&self) -> &[Coordinate] {
        &self.completed
    }

    /// Re-plans toward the nearest reachable task. An empty result leaves the
    /// agent idle.
    pub fn find_nearest_task<W: GridWorld + ?Sized>(&mut self, world: &W) -> Option<Selection> {
        let selection = select_nearest(world, self.position, &mut self.ledger);
        match &selection {
            Some(sel) => {
                self.path = sel.path.iter().copied().collect();
                self.target = Some(sel.target);
            }
            None => {
                self.path.clear();
                self.target = None;
            }
        }
        selection
    }

    /// Moves one cell along the current path. No-op while idle.
    pub fn step<W: GridWorld + ?Sized>(&mut self, world: &mut W) -> Option<Movement<W::Task>> {
        let next = self.path.pop_front()?;
        let from = self.position;
        self.position = next;
        self.explored.push(next);
        self.ledger.record_step();

        let completion = self.check_task_completion(world);
        Some(Movement {
            from,
            to: next,
            completion,
        })
    }

    /// Consumes the task under the agent, if any, and re-plans.
    pub fn check_task_completion<W: GridWorld + ?Sized>(
        &mut self,
        world: &mut W,
    ) -> Option<Completion<W::Task>> {
        let at = self.position;
        let task = world.complete_task(at)?;
        self.completed.push(at);
        info!(%at, completed = self.completed.len(), "task completed");

        let next = self.find_nearest_task(&*world);
        Some(Completion { at, task, next })
    }
}
