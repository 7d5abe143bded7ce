//! The target graph: symmetric adjacency sets plus an edge-kind map.

use crate::error::Result;
use crate::types::{edge_code, EdgeCode, EdgeKind, VertexId};
use itertools::Itertools;
use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// A graph built once from an edge list and treated as immutable for the
/// duration of an enumeration run. Adjacency sets are kept symmetric even for
/// directed graphs; true directionality lives in the edge-kind map and is only
/// consulted during canonicalization.
#[derive(Debug, Clone)]
pub struct Graph {
    adjacency: Vec<HashSet<VertexId>>,
    edges: HashMap<EdgeCode, EdgeKind>,
    names: HashMap<String, VertexId>,
    directed: bool,
}

impl Graph {
    pub fn new(directed: bool) -> Self {
        Graph {
            adjacency: Vec::new(),
            edges: HashMap::new(),
            names: HashMap::new(),
            directed,
        }
    }

    /// Reads a plain-text edge list: two whitespace-separated vertex names per
    /// line. Lines are shuffled before ids are assigned so the discovery order
    /// carries no bias from the file ordering; self-referencing lines are
    /// skipped.
    pub fn from_file<P, R>(path: P, directed: bool, rng: &mut R) -> Result<Graph>
    where
        P: AsRef<Path>,
        R: Rng,
    {
        let contents = fs::read_to_string(path)?;
        let mut lines: Vec<&str> = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        lines.shuffle(rng);

        let mut graph = Graph::new(directed);
        for line in lines {
            let mut fields = line.split_whitespace();
            let (from, to) = match (fields.next(), fields.next()) {
                (Some(from), Some(to)) => (from, to),
                _ => {
                    warn!("skipping malformed line: {:?}", line);
                    continue;
                }
            };
            if from == to {
                continue;
            }
            let u = graph.get_or_create(from);
            let v = graph.get_or_create(to);
            graph.add_edge(u, v);
        }
        Ok(graph)
    }

    /// Adds an anonymous vertex and returns its id.
    pub fn add_vertex(&mut self) -> VertexId {
        let id = self.adjacency.len() as VertexId;
        self.adjacency.push(HashSet::new());
        id
    }

    /// Adds a named vertex, or returns `None` if the name is taken.
    pub fn add_named_vertex(&mut self, name: &str) -> Option<VertexId> {
        if self.names.contains_key(name) {
            warn!("vertex {:?} already exists", name);
            return None;
        }
        let id = self.add_vertex();
        self.names.insert(name.to_string(), id);
        Some(id)
    }

    /// Inserts the edge `u -> v` (`u -- v` when undirected) into both
    /// adjacency sets and records its kind. Returns `false` when either
    /// endpoint is out of range.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> bool {
        let size = self.adjacency.len() as VertexId;
        if u >= size || v >= size {
            return false;
        }
        self.adjacency[u as usize].insert(v);
        self.adjacency[v as usize].insert(u);
        let kind = if !self.directed {
            EdgeKind::Undirected
        } else if u < v {
            EdgeKind::MinToMax
        } else {
            EdgeKind::MaxToMin
        };
        self.edges.insert(edge_code(u, v), kind);
        true
    }

    pub fn adjacency(&self, v: VertexId) -> &HashSet<VertexId> {
        &self.adjacency[v as usize]
    }

    pub fn edges(&self) -> &HashMap<EdgeCode, EdgeKind> {
        &self.edges
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn size(&self) -> usize {
        self.adjacency.len()
    }

    pub fn degree(&self, v: VertexId) -> usize {
        self.adjacency[v as usize].len()
    }

    /// Per-vertex degrees indexed by id.
    pub fn degree_sequence(&self) -> Vec<usize> {
        self.adjacency.iter().map(|adj| adj.len()).collect()
    }

    fn get_or_create(&mut self, name: &str) -> VertexId {
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = self.add_vertex();
        self.names.insert(name.to_string(), id);
        id
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} vertices, {} edges, directed: {}",
            self.size(),
            self.edges.len(),
            self.directed
        )?;
        for (v, adj) in self.adjacency.iter().enumerate() {
            write!(f, "{}:", v)?;
            for u in adj.iter().sorted() {
                write!(f, " {}", u)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
