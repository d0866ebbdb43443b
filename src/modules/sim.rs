use tracing::{debug, info};

use crate::modules::agent::{Agent, AgentStatus};
use crate::modules::cost::CostPolicy;
use crate::modules::grid::{Coordinate, Grid, GridError, GridWorld};
use crate::modules::view::{AgentSnapshot, TaskView, WorldSnapshot};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    TickStarted {
        tick: u64,
    },
    TickCompleted {
        tick: u64,
    },
    PathPlanned {
        from: Coordinate,
        target: Coordinate,
        steps: usize,
        reachable: usize,
    },
    AgentMoved {
        from: Coordinate,
        to: Coordinate,
    },
    TaskCompleted {
        at: Coordinate,
        task_id: u64,
        label: String,
        completed: usize,
    },
    AgentIdle {
        position: Coordinate,
        tasks_remaining: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickResult {
    pub tick: u64,
    pub events: Vec<Event>,
}

/// Host loop state: one grid, one agent, a tick counter.
#[derive(Debug)]
pub struct Simulation {
    tick: u64,
    grid: Grid,
    agent: Agent,
}

impl Simulation {
    pub fn new(grid: Grid, spawn: Coordinate, policy: CostPolicy) -> Result<Self, GridError> {
        if !grid.is_within_bounds(spawn) {
            return Err(GridError::OutOfBounds {
                at: spawn,
                width: grid.width(),
                height: grid.height(),
            });
        }
        if grid.is_barrier(spawn) {
            return Err(GridError::Blocked { at: spawn });
        }

        Ok(Self {
            tick: 0,
            grid,
            agent: Agent::new(spawn, policy),
        })
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Idle with nothing reachable left to plan for.
    pub fn is_settled(&self) -> bool {
        self.agent.status() == AgentStatus::Idle
    }

    /// Plans the first route. Call once before stepping.
    pub fn start(&mut self) -> Vec<Event> {
        let from = self.agent.position();
        let mut events = Vec::new();
        match self.agent.find_nearest_task(&self.grid) {
            Some(selection) => {
                info!(%from, target = %selection.target, steps = selection.path.len(), "initial plan");
                events.push(Event::PathPlanned {
                    from,
                    target: selection.target,
                    steps: selection.path.len(),
                    reachable: selection.reachable,
                });
            }
            None => events.push(Event::AgentIdle {
                position: from,
                tasks_remaining: self.grid.task_count(),
            }),
        }
        events
    }

    pub fn step(&mut self) -> TickResult {
        let tick = self.tick + 1;
        let mut tick_events = vec![Event::TickStarted { tick }];

        match self.agent.step(&mut self.grid) {
            Some(movement) => {
                tick_events.push(Event::AgentMoved {
                    from: movement.from,
                    to: movement.to,
                });
                if let Some(completion) = movement.completion {
                    tick_events.push(Event::TaskCompleted {
                        at: completion.at,
                        task_id: completion.task.id,
                        label: completion.task.label,
                        completed: self.agent.tasks_completed(),
                    });
                    match completion.next {
                        Some(selection) => tick_events.push(Event::PathPlanned {
                            from: completion.at,
                            target: selection.target,
                            steps: selection.path.len(),
                            reachable: selection.reachable,
                        }),
                        None => tick_events.push(Event::AgentIdle {
                            position: completion.at,
                            tasks_remaining: self.grid.task_count(),
                        }),
                    }
                }
            }
            None => {
                debug!(tick, "agent idle");
                tick_events.push(Event::AgentIdle {
                    position: self.agent.position(),
                    tasks_remaining: self.grid.task_count(),
                });
            }
        }

        tick_events.push(Event::TickCompleted { tick });
        self.tick = tick;

        TickResult {
            tick,
            events: tick_events,
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let mut barriers: Vec<Coordinate> = self.grid.barriers().copied().collect();
        barriers.sort();

        let tasks = self
            .grid
            .tasks()
            .map(|(at, task)| TaskView {
                id: task.id,
                label: task.label.clone(),
                position: *at,
            })
            .collect();

        let ledger = self.agent.ledger();
        WorldSnapshot {
            tick: self.tick,
            width: self.grid.width(),
            height: self.grid.height(),
            barriers,
            tasks,
            agent: AgentSnapshot {
                position: self.agent.position(),
                status: self.agent.status(),
                target: self.agent.target(),
                path: self.agent.path().copied().collect(),
                explored: self.agent.explored().len(),
                tasks_completed: self.agent.tasks_completed(),
                policy: ledger.policy(),
                total_path_cost: ledger.total(),
                traversal_cost: ledger.traversal(),
                search_cost: ledger.search(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with_tasks(tasks: &[(i32, i32)]) -> Grid {
        let mut grid = Grid::new(5, 5).unwrap();
        for (idx, at) in tasks.iter().enumerate() {
            grid.add_task((*at).into(), format!("task-{}", idx)).unwrap();
        }
        grid
    }

    #[test]
    fn spawn_must_be_walkable() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.add_barrier(Coordinate::new(1, 1)).unwrap();

        assert!(matches!(
            Simulation::new(grid.clone(), Coordinate::new(1, 1), CostPolicy::Traversal),
            Err(GridError::Blocked { .. })
        ));
        assert!(matches!(
            Simulation::new(grid, Coordinate::new(3, 0), CostPolicy::Traversal),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn start_plans_and_ticks_move_one_cell() {
        let mut sim = Simulation::new(
            grid_with_tasks(&[(2, 0)]),
            Coordinate::origin(),
            CostPolicy::Traversal,
        )
        .unwrap();

        let started = sim.start();
        assert!(matches!(
            started.as_slice(),
            [Event::PathPlanned { steps: 2, .. }]
        ));

        let first = sim.step();
        assert_eq!(first.tick, 1);
        assert!(first.events.contains(&Event::AgentMoved {
            from: Coordinate::new(0, 0),
            to: Coordinate::new(1, 0),
        }));

        let second = sim.step();
        assert!(second.events.iter().any(|e| matches!(
            e,
            Event::TaskCompleted { at, completed: 1, .. } if *at == Coordinate::new(2, 0)
        )));
        assert!(second
            .events
            .iter()
            .any(|e| matches!(e, Event::AgentIdle { tasks_remaining: 0, .. })));
        assert!(sim.is_settled());
    }

    #[test]
    fn empty_task_set_leaves_agent_idle() {
        let mut sim = Simulation::new(
            grid_with_tasks(&[]),
            Coordinate::origin(),
            CostPolicy::TraversalAndSearch,
        )
        .unwrap();

        let started = sim.start();
        assert!(matches!(started.as_slice(), [Event::AgentIdle { .. }]));

        let tick = sim.step();
        assert_eq!(
            tick.events,
            vec![
                Event::TickStarted { tick: 1 },
                Event::AgentIdle {
                    position: Coordinate::origin(),
                    tasks_remaining: 0
                },
                Event::TickCompleted { tick: 1 },
            ]
        );
        assert_eq!(sim.agent().position(), Coordinate::origin());
        assert_eq!(sim.agent().total_path_cost(), 0);
    }

    #[test]
    fn snapshot_reflects_agent_and_world() {
        let mut sim = Simulation::new(
            grid_with_tasks(&[(0, 3), (4, 4)]),
            Coordinate::origin(),
            CostPolicy::TraversalAndSearch,
        )
        .unwrap();
        sim.start();
        for _ in 0..3 {
            sim.step();
        }

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.tick, 3);
        assert_eq!(snapshot.agent.position, Coordinate::new(0, 3));
        assert_eq!(snapshot.agent.tasks_completed, 1);
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.agent.target, Some(Coordinate::new(4, 4)));
        assert_eq!(snapshot.agent.path.len(), 5);
        // Initial scan: 3 + 8, re-plan: 5, plus three steps.
        assert_eq!(snapshot.agent.search_cost, 16);
        assert_eq!(snapshot.agent.total_path_cost, 19);
    }
}
