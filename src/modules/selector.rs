use tracing::debug;

use crate::modules::cost::CostLedger;
use crate::modules::grid::{Coordinate, GridWorld};
use crate::modules::pathfinder::{Path, find_path};

/// The task the agent should head for next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub target: Coordinate,
    pub path: Path,
    /// Tasks for which a path existed, the chosen one included.
    pub reachable: usize,
}

/// Nearest active task of `world` by path length.
pub fn select_nearest<W: GridWorld + ?Sized>(
    world: &W,
    position: Coordinate,
    ledger: &mut CostLedger,
) -> Option<Selection> {
    select_nearest_among(world, position, world.task_coordinates(), ledger)
}

/// Runs one search per candidate and keeps the shortest path. Every successful
/// search is charged to the ledger, the discarded ones included. Ties go to
/// the earliest candidate.
pub fn select_nearest_among<W, I>(
    world: &W,
    position: Coordinate,
    candidates: I,
    ledger: &mut CostLedger,
) -> Option<Selection>
where
    W: GridWorld + ?Sized,
    I: IntoIterator<Item = Coordinate>,
{
    let mut best: Option<(Coordinate, Path)> = None;
    let mut reachable = 0usize;

    for task in candidates {
        let Some(route) = find_path(world, position, task) else {
            continue;
        };
        ledger.record_search(route.cost);
        reachable += 1;

        let shorter = best
            .as_ref()
            .is_none_or(|(_, path)| route.steps.len() < path.len());
        if shorter {
            best = Some((task, route.steps));
        }
    }

    let (target, mut path) = best?;
    if path.first() == Some(&position) {
        path.remove(0);
    }

    debug!(%position, %target, steps = path.len(), reachable, "selected nearest task");
    Some(Selection {
        target,
        path,
        reachable,
    })
}
