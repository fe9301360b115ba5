//! Per-packet forwarding decisions

use hopwire_protocol::{Node, OutputAction, PacketIn, PortNo};
use hopwire_topology::{MacTable, Topology};
use std::fmt;

/// Why a packet ended up flooded instead of unicast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodReason {
    /// Source address is a group address and is never learned
    GroupSource,
    /// Destination host has never been seen
    UnknownDestination,
    /// Destination known but unreachable from the source
    NoPath,
    /// The switch reporting the packet is not on the source's path
    NotOnPath,
    /// The switch is the last element of the path (e.g. source == destination)
    NoNextHop,
    /// No egress port recorded towards the next hop
    NoEgressPort,
}

impl fmt::Display for FloodReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FloodReason::GroupSource => "group source address",
            FloodReason::UnknownDestination => "unknown destination",
            FloodReason::NoPath => "no path",
            FloodReason::NotOnPath => "switch not on path",
            FloodReason::NoNextHop => "no next hop",
            FloodReason::NoEgressPort => "no egress port",
        };
        f.write_str(reason)
    }
}

/// Outcome of handling one packet-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: OutputAction,
    /// The source host was added to the topology by this packet
    pub learned_host: bool,
    /// Node the packet is sent towards when unicast
    pub next_hop: Option<Node>,
    pub flood_reason: Option<FloodReason>,
}

impl Decision {
    fn unicast(port: PortNo, next_hop: Node, learned_host: bool) -> Self {
        Decision {
            action: OutputAction::Port(port),
            learned_host,
            next_hop: Some(next_hop),
            flood_reason: None,
        }
    }

    fn flood(reason: FloodReason, learned_host: bool) -> Self {
        Decision {
            action: OutputAction::Flood,
            learned_host,
            next_hop: None,
            flood_reason: Some(reason),
        }
    }

    /// Unicast decisions are persisted as flow rules; floods never are
    pub fn wants_rule(&self) -> bool {
        !self.action.is_flood()
    }
}

/// Learns host attachment points and picks the egress port for a packet
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardingEngine;

impl ForwardingEngine {
    pub fn new() -> Self {
        ForwardingEngine
    }

    /// Decide what `dpid` should do with a frame from `src` to `dst`
    ///
    /// Frames from multicast or broadcast sources are flooded without
    /// learning anything. An unknown source is attached to the reporting switch: an edge
    /// switch -> host carrying the ingress port, plus a port-less
    /// host -> switch edge so paths can start at the host. A known
    /// destination is routed along the fewest-hop path; every lookup miss
    /// falls back to flooding.
    pub fn decide(
        &self,
        topology: &mut Topology,
        mac_table: &mut MacTable,
        packet: &PacketIn,
    ) -> Decision {
        let switch = Node::Switch(packet.dpid);
        let src = Node::Host(packet.src);
        let dst = Node::Host(packet.dst);

        if packet.src.is_multicast() {
            return Decision::flood(FloodReason::GroupSource, false);
        }

        mac_table.learn(packet.dpid, packet.src, packet.in_port);

        let learned_host = !topology.contains(&src);
        if learned_host {
            topology.add_node(src);
            topology.add_edge(switch, src, Some(packet.in_port));
            topology.add_edge(src, switch, None);
        }

        if !topology.contains(&dst) {
            return Decision::flood(FloodReason::UnknownDestination, learned_host);
        }

        let path = match topology.shortest_path(&src, &dst) {
            Some(path) => path,
            None => return Decision::flood(FloodReason::NoPath, learned_host),
        };

        let position = match path.iter().position(|n| *n == switch) {
            Some(position) => position,
            None => return Decision::flood(FloodReason::NotOnPath, learned_host),
        };

        let next_hop = match path.get(position + 1) {
            Some(next_hop) => *next_hop,
            None => return Decision::flood(FloodReason::NoNextHop, learned_host),
        };

        match topology.port_to(&switch, &next_hop) {
            Some(port) => Decision::unicast(port, next_hop, learned_host),
            None => Decision::flood(FloodReason::NoEgressPort, learned_host),
        }
    }
}
