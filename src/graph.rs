//! Inheritance Graph
//!
//! Package-wide view of `base` relationships, built with petgraph. Used to
//! order generation bases-first and to report every inheritance cycle up front
//! instead of discovering them one flatten call at a time.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{Result, SchemaError};
use crate::schema::{Identifier, TypeSchema};

/// Directed graph with an edge from every base to the schemas deriving from it
pub struct InheritanceGraph {
    graph: DiGraph<String, ()>,
    node_indices: HashMap<String, NodeIndex>,
    missing_bases: BTreeSet<Identifier>,
}

impl InheritanceGraph {
    /// Build the graph for a schema set.
    ///
    /// Bases outside the set are recorded in `missing_bases` and get no node.
    pub fn build(schemas: &[Arc<TypeSchema>]) -> Self {
        let mut graph = DiGraph::with_capacity(schemas.len(), schemas.len());
        let mut node_indices = HashMap::with_capacity(schemas.len());
        let mut missing_bases = BTreeSet::new();

        for schema in schemas {
            let url = schema.identifier.url.clone();
            if !node_indices.contains_key(&url) {
                let idx = graph.add_node(url.clone());
                node_indices.insert(url, idx);
            }
        }

        for schema in schemas {
            let Some(base) = &schema.base else {
                continue;
            };
            match (node_indices.get(&base.url), node_indices.get(&schema.identifier.url)) {
                (Some(&from), Some(&to)) => {
                    graph.update_edge(from, to, ());
                }
                _ => {
                    missing_bases.insert(base.clone());
                }
            }
        }

        Self {
            graph,
            node_indices,
            missing_bases,
        }
    }

    pub fn schema_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Bases referenced by the set but not part of it
    pub fn missing_bases(&self) -> &BTreeSet<Identifier> {
        &self.missing_bases
    }

    /// Direct children of `url`, sorted
    pub fn derived_from(&self, url: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(url) else {
            return Vec::new();
        };
        let mut children: Vec<&str> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].as_str())
            .collect();
        children.sort_unstable();
        children
    }

    /// Every inheritance cycle, each as a sorted list of urls
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut members: Vec<String> = scc.into_iter().map(|i| self.graph[i].clone()).collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// All urls ordered so every base precedes the schemas derived from it.
    ///
    /// Ties are broken by url, so the order is stable for a given set.
    pub fn generation_order(&self) -> Result<Vec<String>> {
        if let Some(cycle) = self.cycles().into_iter().next() {
            return Err(SchemaError::CyclicInheritance {
                url: cycle[0].clone(),
                path: cycle,
            });
        }

        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|n| (n, self.graph.neighbors_directed(n, Direction::Incoming).count()))
            .collect();
        let mut ready: BTreeSet<(String, NodeIndex)> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(&n, _)| (self.graph[n].clone(), n))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(next) = ready.pop_first() {
            let (url, idx) = next;
            for child in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(d) = in_degree.get_mut(&child) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert((self.graph[child].clone(), child));
                    }
                }
            }
            order.push(url);
        }

        Ok(order)
    }
}
