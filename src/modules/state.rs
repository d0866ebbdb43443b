use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::modules::cost::CostPolicy;

/// Overrides the state directory (default `.gridwalk`).
pub const HOME_ENV: &str = "GRIDWALK_HOME";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    Initialized,
    Running,
    Stopped,
}

/// Outcome of the most recent `run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub policy: CostPolicy,
    pub total_path_cost: u64,
    pub traversal_cost: u64,
    pub search_cost: u64,
    pub searches: u64,
    pub tasks_completed: usize,
    pub tasks_remaining: usize,
    pub map_digest: String,
    pub finished_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeState {
    pub status: Status,
    pub last_tick: u64,
    pub message: Option<String>,
    #[serde(default)]
    pub last_run: Option<RunSummary>,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            status: Status::Initialized,
            last_tick: 0,
            message: None,
            last_run: None,
        }
    }
}

pub fn home_dir() -> PathBuf {
    resolve_home(env::var_os(HOME_ENV))
}

fn resolve_home(value: Option<OsString>) -> PathBuf {
    value
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".gridwalk"))
}

pub fn state_file_path() -> PathBuf {
    state_file_in(&home_dir())
}

fn state_file_in(home: &Path) -> PathBuf {
    home.join("state.json")
}

pub fn init_state() -> io::Result<RuntimeState> {
    init_state_in(&home_dir())
}

pub fn load_state() -> io::Result<Option<RuntimeState>> {
    load_state_in(&home_dir())
}

pub fn save_state(state: &RuntimeState) -> io::Result<()> {
    save_state_in(&home_dir(), state)
}

pub fn set_status(
    status: Status,
    last_tick: u64,
    message: Option<String>,
) -> io::Result<RuntimeState> {
    set_status_in(&home_dir(), status, last_tick, message)
}

pub fn record_run(summary: RunSummary) -> io::Result<RuntimeState> {
    record_run_in(&home_dir(), summary)
}

fn init_state_in(home: &Path) -> io::Result<RuntimeState> {
    let state = RuntimeState::default();
    save_state_in(home, &state)?;
    Ok(state)
}

fn load_state_in(home: &Path) -> io::Result<Option<RuntimeState>> {
    let path = state_file_in(home);
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return Ok(None);
    }

    let state: RuntimeState = serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "failed to parse state file {}; delete it or run `gridwalk init` to reset: {}",
                path.display(),
                e
            ),
        )
    })?;
    Ok(Some(state))
}

fn save_state_in(home: &Path, state: &RuntimeState) -> io::Result<()> {
    fs::create_dir_all(home)?;
    let json = serde_json::to_vec_pretty(state)?;
    fs::write(state_file_in(home), json)?;
    Ok(())
}

fn set_status_in(
    home: &Path,
    status: Status,
    last_tick: u64,
    message: Option<String>,
) -> io::Result<RuntimeState> {
    let mut state = load_state_in(home)?.unwrap_or_default();
    state.status = status;
    state.last_tick = last_tick;
    state.message = message;
    save_state_in(home, &state)?;
    Ok(state)
}

fn record_run_in(home: &Path, summary: RunSummary) -> io::Result<RuntimeState> {
    let mut state = load_state_in(home)?.unwrap_or_default();
    state.status = Status::Stopped;
    state.last_tick = summary.ticks;
    state.message = Some(format!("completed {} tick(s)", summary.ticks));
    state.last_run = Some(summary);
    save_state_in(home, &state)?;
    Ok(state)
}
