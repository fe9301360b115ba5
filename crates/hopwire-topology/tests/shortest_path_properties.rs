//! Shortest Path Property Tests
//!
//! Compares the breadth-first search against a Floyd-Warshall reference on
//! randomly generated directed graphs.

use hopwire_protocol::{MacAddr, Node};
use hopwire_topology::Topology;
use proptest::prelude::*;

const UNREACHABLE: usize = usize::MAX;

/// Random graph: node count plus directed edges between indices
fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..12).prop_flat_map(|n| {
        let edges = prop::collection::vec((0..n, 0..n), 0..(n * 3));
        (Just(n), edges)
    })
}

/// Mix switches and hosts so the ordering covers both variants
fn node(index: usize) -> Node {
    if index % 3 == 2 {
        Node::host(MacAddr::from_u64(index as u64))
    } else {
        Node::switch(index as u64)
    }
}

fn build(n: usize, edges: &[(usize, usize)]) -> Topology {
    let mut topo = Topology::new();
    topo.add_nodes_from((0..n).map(node));
    for (i, (from, to)) in edges.iter().enumerate() {
        if from != to {
            topo.add_edge(node(*from), node(*to), Some(i as u32));
        }
    }
    topo
}

fn floyd_warshall(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut dist = vec![vec![UNREACHABLE; n]; n];
    for (i, row) in dist.iter_mut().enumerate() {
        row[i] = 0;
    }
    for (from, to) in edges {
        if from != to {
            dist[*from][*to] = 1;
        }
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                if dist[i][k] != UNREACHABLE && dist[k][j] != UNREACHABLE {
                    let via = dist[i][k] + dist[k][j];
                    if via < dist[i][j] {
                        dist[i][j] = via;
                    }
                }
            }
        }
    }
    dist
}

proptest! {
    #[test]
    fn bfs_matches_reference_distance((n, edges) in graph_strategy()) {
        let topo = build(n, &edges);
        let dist = floyd_warshall(n, &edges);

        for a in 0..n {
            for b in 0..n {
                let path = topo.shortest_path(&node(a), &node(b));
                if dist[a][b] == UNREACHABLE {
                    prop_assert!(path.is_none(), "{} -> {} should be unreachable", a, b);
                } else {
                    let path = path.expect("reachable pair must yield a path");
                    prop_assert_eq!(path.len() - 1, dist[a][b]);
                    prop_assert_eq!(path[0], node(a));
                    prop_assert_eq!(*path.last().unwrap(), node(b));
                    for hop in path.windows(2) {
                        prop_assert!(topo.has_edge(&hop[0], &hop[1]));
                    }
                }
            }
        }
    }

    #[test]
    fn path_to_self_is_single_node((n, edges) in graph_strategy()) {
        let topo = build(n, &edges);
        for a in 0..n {
            prop_assert_eq!(topo.shortest_path(&node(a), &node(a)), Some(vec![node(a)]));
        }
    }

    #[test]
    fn unknown_endpoint_yields_none((n, edges) in graph_strategy()) {
        let topo = build(n, &edges);
        let stranger = Node::switch(1_000);
        for a in 0..n {
            prop_assert!(topo.shortest_path(&node(a), &stranger).is_none());
            prop_assert!(topo.shortest_path(&stranger, &node(a)).is_none());
        }
    }

    #[test]
    fn search_is_deterministic((n, edges) in graph_strategy()) {
        let first = build(n, &edges);
        let mut reversed_edges = edges.clone();
        reversed_edges.reverse();
        // Same edge set inserted in another order, ports may differ
        let second = build(n, &reversed_edges);

        for a in 0..n {
            for b in 0..n {
                prop_assert_eq!(
                    first.shortest_path(&node(a), &node(b)),
                    second.shortest_path(&node(a), &node(b))
                );
            }
        }
    }
}
