//! Topology discovery adapter
//!
//! Folds switch and link lifecycle events into the graph store, and defines
//! the seam through which events reach the controller.

use crate::error::Result;
use hopwire_protocol::{ControllerEvent, DatapathId, Link, Node};
use hopwire_topology::{MacTable, Topology};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Source of inbound controller events
#[async_trait::async_trait]
pub trait EventSource: Send {
    /// Next event, or `None` once the source is exhausted
    async fn next_event(&mut self) -> Result<Option<ControllerEvent>>;
}

/// Pre-recorded events, drained front to back
#[async_trait::async_trait]
impl EventSource for VecDeque<ControllerEvent> {
    async fn next_event(&mut self) -> Result<Option<ControllerEvent>> {
        Ok(self.pop_front())
    }
}

/// Add a switch; returns false if it was already known
pub fn switch_joined(topology: &mut Topology, dpid: DatapathId) -> bool {
    let node = Node::Switch(dpid);
    if topology.contains(&node) {
        debug!(dpid = %dpid, "Switch rejoined");
        return false;
    }

    topology.add_node(node);
    info!(dpid = %dpid, switches = topology.switches().len(), "Switch joined");
    true
}

/// Add every listed switch; returns how many were new
pub fn switches_listed(topology: &mut Topology, dpids: &[DatapathId]) -> usize {
    let before = topology.node_count();
    topology.add_nodes_from(dpids.iter().copied().map(Node::Switch));
    let added = topology.node_count() - before;

    debug!(listed = dpids.len(), added, "Switch list applied");
    added
}

/// Remove a switch with all its edges and drop what it learned
///
/// Hosts attached only to this switch are removed with it, so the next
/// frame they send relearns their attachment wherever they reappear.
pub fn switch_left(topology: &mut Topology, mac_table: &mut MacTable, dpid: DatapathId) -> bool {
    let switch = Node::Switch(dpid);
    let stranded: Vec<Node> = topology
        .neighbors(&switch)
        .map(|(node, _)| node)
        .filter(|node| node.is_host() && topology.neighbors(node).all(|(n, _)| n == switch))
        .collect();

    let removed = topology.remove_node(&switch);
    for host in &stranded {
        topology.remove_node(host);
    }
    let forgotten = mac_table.forget_switch(dpid);

    if removed {
        info!(dpid = %dpid, hosts = stranded.len(), forgotten, "Switch left");
    } else {
        debug!(dpid = %dpid, "Leave for unknown switch ignored");
    }
    removed
}

/// Record both directions of an inter-switch link
///
/// Both switches must have joined; a link naming an unknown switch is
/// ignored and false is returned.
pub fn link_up(topology: &mut Topology, link: &Link) -> bool {
    let src = Node::Switch(link.src);
    let dst = Node::Switch(link.dst);

    if !topology.contains(&src) || !topology.contains(&dst) {
        warn!(
            src = %link.src,
            dst = %link.dst,
            "Link up for unknown switch ignored"
        );
        return false;
    }

    topology.add_edge(src, dst, Some(link.src_port));
    topology.add_edge(dst, src, Some(link.dst_port));

    info!(
        src = %link.src,
        src_port = link.src_port,
        dst = %link.dst,
        dst_port = link.dst_port,
        "Link up"
    );
    true
}

/// Drop both directions of an inter-switch link; returns whether any existed
pub fn link_down(topology: &mut Topology, link: &Link) -> bool {
    let src = Node::Switch(link.src);
    let dst = Node::Switch(link.dst);

    let forward = topology.remove_edge(&src, &dst);
    let reverse = topology.remove_edge(&dst, &src);

    info!(src = %link.src, dst = %link.dst, "Link down");
    forward || reverse
}
