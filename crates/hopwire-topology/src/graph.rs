//! Directed topology graph with per-neighbor egress ports

use hopwire_protocol::{DatapathId, MacAddr, Node, PortNo};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Neighbor -> egress port. `None` marks a bookkeeping edge with no port.
type Adjacency = BTreeMap<Node, Option<PortNo>>;

/// A directed edge as exposed in snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: Node,
    pub to: Node,
    pub port: Option<PortNo>,
}

/// Point-in-time copy of the graph for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub switches: Vec<DatapathId>,
    pub hosts: Vec<MacAddr>,
    pub edges: Vec<Edge>,
}

/// Network topology: switches, hosts and the ports that connect them
///
/// Neighbors are kept in an ordered map, so iteration (and therefore the
/// tie-break between equally short paths) follows `Node`'s ordering:
/// switches by ascending datapath id, then hosts by ascending address.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: HashMap<Node, Adjacency>,
}

impl Topology {
    /// Create an empty topology
    pub fn new() -> Self {
        Topology {
            nodes: HashMap::new(),
        }
    }

    /// Add a node; no-op if already present
    pub fn add_node(&mut self, node: Node) {
        self.nodes.entry(node).or_default();
    }

    pub fn add_nodes_from<I>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = Node>,
    {
        for node in nodes {
            self.add_node(node);
        }
    }

    /// Insert or update the edge `from -> to`
    ///
    /// Rediscovery overwrites the port. Endpoints that are not yet known are
    /// added, so every edge endpoint is always a member of the graph.
    pub fn add_edge(&mut self, from: Node, to: Node, port: Option<PortNo>) {
        self.add_node(to);
        self.nodes.entry(from).or_default().insert(to, port);
    }

    pub fn add_edges_from<I>(&mut self, edges: I)
    where
        I: IntoIterator<Item = (Node, Node, Option<PortNo>)>,
    {
        for (from, to, port) in edges {
            self.add_edge(from, to, port);
        }
    }

    /// Remove the edge `from -> to`, returning whether it existed
    pub fn remove_edge(&mut self, from: &Node, to: &Node) -> bool {
        self.nodes
            .get_mut(from)
            .map(|adj| adj.remove(to).is_some())
            .unwrap_or(false)
    }

    /// Remove a node together with every edge into or out of it
    pub fn remove_node(&mut self, node: &Node) -> bool {
        if self.nodes.remove(node).is_none() {
            return false;
        }

        for adj in self.nodes.values_mut() {
            adj.remove(node);
        }

        true
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.nodes.contains_key(node)
    }

    /// Egress port recorded on the direct hop `from -> neighbor`
    pub fn port_to(&self, from: &Node, neighbor: &Node) -> Option<PortNo> {
        self.nodes.get(from)?.get(neighbor).copied().flatten()
    }

    /// Check whether the direct edge `from -> to` exists (with or without a port)
    pub fn has_edge(&self, from: &Node, to: &Node) -> bool {
        self.nodes
            .get(from)
            .map(|adj| adj.contains_key(to))
            .unwrap_or(false)
    }

    /// Outgoing edges of `node` in neighbor order
    pub fn neighbors<'a>(&'a self, node: &Node) -> impl Iterator<Item = (Node, Option<PortNo>)> + 'a {
        self.nodes
            .get(node)
            .into_iter()
            .flat_map(|adj| adj.iter().map(|(n, p)| (*n, *p)))
    }

    /// Fewest-hop path from `src` to `dst`, both ends included
    ///
    /// Breadth-first search over the directed edges. A node is marked visited
    /// when dequeued, and the first time it is dequeued fixes its predecessor,
    /// so the returned path is the first minimum-length path in neighbor
    /// order. Returns `None` if either end is unknown or `dst` is unreachable.
    pub fn shortest_path(&self, src: &Node, dst: &Node) -> Option<Vec<Node>> {
        if !self.contains(src) || !self.contains(dst) {
            return None;
        }

        let mut visited: HashSet<Node> = HashSet::new();
        let mut parent: HashMap<Node, Node> = HashMap::new();
        let mut queue: VecDeque<(Node, Option<Node>)> = VecDeque::new();
        queue.push_back((*src, None));

        while let Some((current, via)) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(prev) = via {
                parent.insert(current, prev);
            }

            if current == *dst {
                return Some(Self::unwind(&parent, current));
            }

            for (neighbor, _) in self.neighbors(&current) {
                if !visited.contains(&neighbor) {
                    queue.push_back((neighbor, Some(current)));
                }
            }
        }

        None
    }

    fn unwind(parent: &HashMap<Node, Node>, last: Node) -> Vec<Node> {
        let mut path = vec![last];
        let mut cursor = last;
        while let Some(prev) = parent.get(&cursor) {
            path.push(*prev);
            cursor = *prev;
        }
        path.reverse();
        path
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed edges
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|adj| adj.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Known switches in ascending order
    pub fn switches(&self) -> Vec<DatapathId> {
        let mut switches: Vec<DatapathId> =
            self.nodes.keys().filter_map(|n| n.as_switch()).collect();
        switches.sort();
        switches
    }

    /// Known hosts in ascending order
    pub fn hosts(&self) -> Vec<MacAddr> {
        let mut hosts: Vec<MacAddr> = self
            .nodes
            .keys()
            .filter_map(|n| match n {
                Node::Host(mac) => Some(*mac),
                Node::Switch(_) => None,
            })
            .collect();
        hosts.sort();
        hosts
    }

    /// Copy of the graph with nodes and edges in a stable order
    pub fn snapshot(&self) -> TopologySnapshot {
        let mut from_nodes: Vec<&Node> = self.nodes.keys().collect();
        from_nodes.sort();

        let edges = from_nodes
            .into_iter()
            .flat_map(|from| {
                self.nodes[from].iter().map(move |(to, port)| Edge {
                    from: *from,
                    to: *to,
                    port: *port,
                })
            })
            .collect();

        TopologySnapshot {
            switches: self.switches(),
            hosts: self.hosts(),
            edges,
        }
    }
}
