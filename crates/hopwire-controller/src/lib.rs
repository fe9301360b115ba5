//! Hopwire Forwarding Controller
//!
//! Reactive shortest-path forwarding for a switched network:
//! - Topology discovery events folded into the graph store
//! - Host learning from packet-in source addresses
//! - Fewest-hop next-hop selection with flood fallback
//! - Fire-and-forget flow rule installation
//! - Single-consumer event loop owning all topology state

pub mod channel;
pub mod controller;
pub mod decision;
pub mod discovery;
pub mod error;
pub mod installer;

pub use channel::{ControlChannel, QueuedControlChannel};
pub use controller::{Controller, ControllerHandle, ControllerStats, MacAging};
pub use decision::{Decision, FloodReason, ForwardingEngine};
pub use discovery::EventSource;
pub use error::{ControllerError, Result};
pub use installer::{RuleDefaults, RuleInstaller};

/// Default capacity of the controller's inbound event queue
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1024;
