pub mod agent;
pub mod cost;
pub mod grid;
pub mod logging;
pub mod map;
pub mod pathfinder;
pub mod selector;
pub mod sim;
pub mod state;
pub mod view;
