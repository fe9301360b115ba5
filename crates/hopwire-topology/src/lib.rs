//! Hopwire Topology Store
//!
//! In-memory model of the switched network:
//! - Directed graph of switches and hosts with an egress port per edge
//! - Fewest-hop path search (breadth-first, deterministic tie-break)
//! - Per-switch MAC learning cache

pub mod graph;
pub mod mac_table;

pub use graph::{Edge, Topology, TopologySnapshot};
pub use mac_table::{MacEntry, MacTable};
