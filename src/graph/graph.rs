use std::collections::VecDeque;

use tracing::debug;

use crate::registry::UnitRegistry;

/// A directed, symmetric adjacency graph in compressed sparse row format.
/// Nodes are unit positions in registry order.
#[derive(Debug, Default, Clone)]
pub struct AdjacencyGraph {
    size: usize,
    offsets: Vec<u32>,
    edges: Vec<u32>,
    dropped: usize,
}

impl AdjacencyGraph {
    /// Construct a graph from per-node adjacency lists, adding every edge in both directions.
    /// Self-loops and repeated edges are discarded.
    pub(crate) fn new(num_nodes: usize, adjacency: &[Vec<u32>]) -> Self {
        assert!(adjacency.len() == num_nodes, "adjacency.len() must equal num_nodes");

        let mut neighbors = vec![Vec::new(); num_nodes];
        for (u, list) in adjacency.iter().enumerate() {
            for &v in list {
                assert!((v as usize) < num_nodes, "edge {u}->{v} out of range");
                if v as usize == u { continue }
                neighbors[u].push(v);
                neighbors[v as usize].push(u as u32);
            }
        }
        neighbors.iter_mut().for_each(|list| { list.sort_unstable(); list.dedup() });

        Self {
            size: num_nodes,
            offsets: std::iter::once(0u32).chain(
                neighbors.iter()
                    .map(|v| v.len() as u32)
                    .scan(0u32, |acc, len| {*acc += len; Some(*acc)})
            ).collect::<Vec<u32>>(),
            edges: neighbors.into_iter().flatten().collect(),
            dropped: 0,
        }
    }

    /// Build the adjacency graph of a unit registry.
    /// Neighbor references to units outside the registry are dropped.
    pub fn from_registry(registry: &UnitRegistry) -> Self {
        let mut dropped = 0;
        let adjacency = registry.units().iter()
            .map(|unit| {
                unit.neighbors().iter()
                    .filter_map(|neighbor| {
                        let index = registry.index_of(neighbor);
                        if index.is_none() {
                            debug!(unit = %unit.id(), neighbor = %neighbor, "dropping dangling neighbor reference");
                            dropped += 1;
                        }
                        index.map(|i| i as u32)
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        Self { dropped, ..Self::new(registry.len(), &adjacency) }
    }

    /// Get the number of nodes in the graph.
    #[inline] pub fn node_count(&self) -> usize { self.size }

    /// Get the number of directed edges in the graph (twice the number of neighbor pairs).
    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Get the number of neighbor references dropped while building from a registry.
    #[inline] pub fn dropped_references(&self) -> usize { self.dropped }

    /// Get the range of edges for a given node.
    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Get the degree (number of neighbors) of a given node.
    #[inline] pub fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Get an iterator over the neighbors of a given node.
    #[inline]
    pub fn edges(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.range(node).map(move |v| self.edges[v] as usize)
    }

    /// Get an iterator over the directed edges leaving a node, paired with their edge index.
    #[inline]
    pub fn out_edges(&self, node: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.range(node).map(move |e| (e, self.edges[e] as usize))
    }

    /// Get an iterator over all directed edges as `(edge_index, u, v)`.
    /// Edge indices are stable and dense in `0..edge_count()`.
    pub fn directed_edges(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (0..self.size).flat_map(move |u| self.out_edges(u).map(move |(e, v)| (e, u, v)))
    }

    /// Check whether edge u->v exists.
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.edges[self.range(u)].binary_search(&(v as u32)).is_ok()
    }

    /// Check whether a set of nodes induces a connected subgraph.
    /// The empty set is considered connected.
    pub fn is_connected_subset(&self, nodes: &[usize]) -> bool {
        let Some(&start) = nodes.first() else { return true };

        let mut in_subset = vec![false; self.size];
        nodes.iter().for_each(|&u| in_subset[u] = true);
        let target = in_subset.iter().filter(|&&b| b).count();

        let mut seen = 1;
        let mut visited = vec![false; self.size];
        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(u) = queue.pop_front() {
            for v in self.edges(u) {
                if in_subset[v] && !visited[v] {
                    visited[v] = true;
                    seen += 1;
                    queue.push_back(v);
                }
            }
        }

        seen == target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::UnitRecord;

    fn make_test_graph() -> AdjacencyGraph {
        AdjacencyGraph::new(
            4,
            &[
                vec![1, 2],       // 0
                vec![0],          // 1
                vec![1, 3],       // 2
                vec![],           // 3
            ],
        )
    }

    #[test]
    fn csr_graph_construction() {
        let graph = make_test_graph();

        // Basic counts
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 8);

        // Offsets are cumulative neighbor counts, len = nodes + 1
        assert_eq!(graph.offsets, vec![0, 2, 4, 7, 8]);

        // Neighbor lists are sorted and deduplicated
        assert_eq!(graph.edges, vec![1, 2, 0, 2, 0, 1, 3, 2]);

        for window in graph.offsets.windows(2) { assert!(window[0] <= window[1]) }
    }

    #[test]
    fn edges_are_symmetric() {
        let graph = make_test_graph();
        for (_, u, v) in graph.directed_edges() {
            assert!(graph.has_edge(v, u), "missing reverse edge {v}->{u}");
        }
    }

    #[test]
    fn directed_edge_indices_are_dense() {
        let graph = make_test_graph();
        let indices = graph.directed_edges().map(|(e, _, _)| e).collect::<Vec<_>>();
        assert_eq!(indices, (0..graph.edge_count()).collect::<Vec<_>>());
    }

    #[test]
    fn degree_matches_offsets() {
        let graph = make_test_graph();

        assert_eq!(graph.degree(0), 2);
        assert_eq!(graph.degree(1), 2);
        assert_eq!(graph.degree(2), 3);
        assert_eq!(graph.degree(3), 1);
    }

    #[test]
    fn self_loops_are_discarded() {
        let graph = AdjacencyGraph::new(2, &[vec![0, 1], vec![]]);
        assert_eq!(graph.edge_count(), 2);
        assert!(!graph.has_edge(0, 0));
    }

    #[test]
    fn connected_subsets() {
        let graph = AdjacencyGraph::new(4, &[vec![1], vec![2], vec![3], vec![]]);

        assert!(graph.is_connected_subset(&[]));
        assert!(graph.is_connected_subset(&[2]));
        assert!(graph.is_connected_subset(&[0, 1, 2]));
        assert!(!graph.is_connected_subset(&[0, 2]));
        assert!(!graph.is_connected_subset(&[0, 1, 3]));
    }

    #[test]
    fn empty_graph_is_valid() {
        let graph = AdjacencyGraph::new(0, &[]);

        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.offsets, vec![0]);
    }

    #[test]
    fn dangling_neighbor_is_dropped() {
        let registry = UnitRegistry::from_records(vec![
            UnitRecord::new("A", "A", 10, &["B", "Z"]),
            UnitRecord::new("B", "B", 10, &[]),
            UnitRecord::new("C", "C", 10, &["Y"]),
        ]).unwrap();
        let graph = AdjacencyGraph::from_registry(&registry);

        assert_eq!(graph.dropped_references(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge(1, 0));
        assert_eq!(graph.degree(2), 0);
    }

    #[test]
    #[should_panic(expected = "adjacency.len() must equal num_nodes")]
    fn new_panics_when_adjacency_len_mismatch() {
        AdjacencyGraph::new(1, &[]);
    }

    #[test]
    #[should_panic]
    fn degree_panics_for_out_of_bounds_node() {
        let graph = make_test_graph();
        graph.degree(graph.node_count());
    }
}
