//! A partially built connected induced subgraph.

use crate::types::VertexId;
use log::warn;
use std::fmt;

/// Fixed-capacity ordered vertex buffer. The first inserted vertex is the
/// root of the enumeration branch; cloning a partial subgraph is how the
/// enumeration tree forks, so the buffer stays small and flat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgraph {
    nodes: Vec<VertexId>,
    filled: usize,
}

impl Subgraph {
    pub fn new(capacity: usize) -> Self {
        Subgraph {
            nodes: vec![0; capacity],
            filled: 0,
        }
    }

    /// Appends a vertex. A full subgraph is left untouched.
    pub fn add(&mut self, v: VertexId) {
        if self.is_complete() {
            warn!("subgraph is full, cannot add vertex {}", v);
            return;
        }
        self.nodes[self.filled] = v;
        self.filled += 1;
    }

    pub fn get(&self, i: usize) -> VertexId {
        self.nodes[i]
    }

    pub fn root(&self) -> VertexId {
        self.nodes[0]
    }

    pub fn size(&self) -> usize {
        self.filled
    }

    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_complete(&self) -> bool {
        self.filled == self.nodes.len()
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.nodes[..self.filled].contains(&v)
    }

    /// The filled prefix, in insertion order.
    pub fn vertices(&self) -> &[VertexId] {
        &self.nodes[..self.filled]
    }
}

impl fmt::Display for Subgraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut vertices = self.vertices().iter();
        if let Some(v) = vertices.next() {
            write!(f, "{}", v)?;
        }
        for v in vertices {
            write!(f, " {}", v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_fills_in_order_up_to_capacity() {
        let mut sg = Subgraph::new(3);
        sg.add(5);
        sg.add(9);
        assert!(!sg.is_complete());
        sg.add(2);
        assert!(sg.is_complete());
        sg.add(7); // ignored
        assert_eq!(sg.vertices(), &[5, 9, 2]);
        assert_eq!(sg.root(), 5);
        assert_eq!(sg.get(1), 9);
    }

    #[test]
    fn contains_scans_only_the_filled_prefix() {
        let mut sg = Subgraph::new(3);
        sg.add(4);
        assert!(sg.contains(4));
        assert!(!sg.contains(0)); // slot value, not a member
    }

    #[test]
    fn clones_are_independent_branches() {
        let mut sg = Subgraph::new(2);
        sg.add(1);
        let mut fork = sg.clone();
        fork.add(2);
        assert_eq!(sg.size(), 1);
        assert_eq!(fork.vertices(), &[1, 2]);
    }

    #[test]
    fn displays_as_vertex_list() {
        let mut sg = Subgraph::new(3);
        sg.add(3);
        sg.add(1);
        sg.add(4);
        assert_eq!(sg.to_string(), "3 1 4");
    }
}
