//! hopwired - shortest-path forwarding controller daemon
//!
//! Loads a YAML configuration, replays a topology scenario into the
//! controller and logs the messages it sends to the switches.

pub mod config;
pub mod node;
pub mod scenario;

pub use config::Config;
pub use node::{Node, RunReport};
pub use scenario::{Scenario, ScenarioSource};
