use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which contributions count toward the reported cumulative path cost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CostPolicy {
    /// One unit per cell the agent actually moves through.
    Traversal,
    /// Traversal steps plus the goal g-score of every successful search,
    /// including searches whose path was not adopted. Each search is charged once.
    #[default]
    TraversalAndSearch,
}

impl CostPolicy {
    pub const fn label(self) -> &'static str {
        match self {
            CostPolicy::Traversal => "traversal",
            CostPolicy::TraversalAndSearch => "traversal-and-search",
        }
    }
}

impl fmt::Display for CostPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Monotone cost accumulator. Both components are always tracked; the policy
/// only decides what `total` reports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLedger {
    policy: CostPolicy,
    traversal: u64,
    search: u64,
    searches: u64,
}

impl CostLedger {
    pub fn new(policy: CostPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> CostPolicy {
        self.policy
    }

    pub fn record_step(&mut self) {
        self.traversal = self.traversal.saturating_add(1);
    }

    pub fn record_search(&mut self, goal_g_score: u32) {
        self.search = self.search.saturating_add(u64::from(goal_g_score));
        self.searches = self.searches.saturating_add(1);
    }

    pub fn traversal(&self) -> u64 {
        self.traversal
    }

    pub fn search(&self) -> u64 {
        self.search
    }

    /// Number of successful searches recorded.
    pub fn searches(&self) -> u64 {
        self.searches
    }

    pub fn total(&self) -> u64 {
        match self.policy {
            CostPolicy::Traversal => self.traversal,
            CostPolicy::TraversalAndSearch => self.traversal.saturating_add(self.search),
        }
    }
}
