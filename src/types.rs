//! Core identifier and label types shared across the motif pipeline.

/// The vertex id type.
pub type VertexId = u32;

/// Canonical packing of an unordered vertex pair.
pub type EdgeCode = u64;

/// A canonical isomorphism-class label produced by the labeling oracle.
pub type Label = String;

/// Directionality recorded for an edge, relative to the packed pair
/// `(min, max)` of its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Directed from the smaller id to the larger.
    MinToMax,
    /// Directed from the larger id to the smaller.
    MaxToMin,
    /// No direction.
    Undirected,
}

/// Packs an unordered vertex pair into a single map key, smaller id in the
/// high 32 bits, so both insertion orders of an edge collide.
pub fn edge_code(u: VertexId, v: VertexId) -> EdgeCode {
    let (min, max) = if u < v { (u, v) } else { (v, u) };
    (u64::from(min) << 32) | u64::from(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_code_is_order_insensitive() {
        assert_eq!(edge_code(3, 7), edge_code(7, 3));
        assert_ne!(edge_code(3, 7), edge_code(3, 8));
    }

    #[test]
    fn edge_code_packs_min_high() {
        assert_eq!(edge_code(1, 2), (1u64 << 32) | 2);
        assert_eq!(edge_code(0, u32::MAX), u64::from(u32::MAX));
    }
}
