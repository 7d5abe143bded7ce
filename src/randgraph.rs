//! Degree-sequence-preserving random graphs (configuration model).

use crate::graph::Graph;
use crate::types::{edge_code, VertexId};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

/// Random partner re-draws before falling back to a linear scan.
const PARTNER_RETRIES: usize = 32;

/// Builds a random graph over the same vertices as `input`, preserving the
/// degree sequence by pairing off a shuffled stub list (each vertex appears
/// once per unit of degree). A draw that would self-pair a vertex or repeat
/// an existing edge does not consume the stubs; the partner is re-drawn, and
/// a stub is dropped only once no pairable mate remains anywhere in the list,
/// so the list strictly shrinks and the loop always terminates.
pub fn generate<R: Rng>(input: &Graph, rng: &mut R) -> Graph {
    let degrees = input.degree_sequence();
    let mut random_graph = Graph::new(input.is_directed());
    let mut stubs: Vec<VertexId> = Vec::with_capacity(degrees.iter().sum());
    for (v, &degree) in degrees.iter().enumerate() {
        random_graph.add_vertex();
        for _ in 0..degree {
            stubs.push(v as VertexId);
        }
    }
    stubs.shuffle(rng);

    let mut iterations = 0usize;
    while stubs.len() >= 2 {
        iterations += 1;
        if iterations % 10_000 == 0 {
            info!("pairing stubs, {} remaining", stubs.len());
        }
        let n = stubs.len();
        let u = rng.gen_range(0..n);
        let mut v = draw_partner(u, n, rng);
        let mut retries = 0;
        while !pairable(&random_graph, stubs[u], stubs[v]) && retries < PARTNER_RETRIES {
            v = draw_partner(u, n, rng);
            retries += 1;
        }
        if !pairable(&random_graph, stubs[u], stubs[v]) {
            match (0..n).find(|&i| i != u && pairable(&random_graph, stubs[u], stubs[i])) {
                Some(i) => v = i,
                None => {
                    // every remaining mate is either the same vertex or an
                    // edge already present; this stub can never pair again
                    debug!("discarding an unpairable stub of vertex {}", stubs[u]);
                    stubs.swap_remove(u);
                    continue;
                }
            }
        }
        let (u, v) = if u < v { (u, v) } else { (v, u) };
        // remove the higher position first so the lower stays valid
        let b = stubs.swap_remove(v);
        let a = stubs.swap_remove(u);
        random_graph.add_edge(a, b);
    }
    if !stubs.is_empty() {
        debug!("discarding {} leftover stubs", stubs.len());
    }
    random_graph
}

/// A stub pair survives as an edge only when the vertices differ and the
/// edge is not already in the graph; anything else would silently collapse
/// in the adjacency sets and lose degree.
fn pairable(graph: &Graph, a: VertexId, b: VertexId) -> bool {
    a != b && !graph.edges().contains_key(&edge_code(a, b))
}

/// Uniform draw over the positions other than `taken`.
fn draw_partner<R: Rng>(taken: usize, n: usize, rng: &mut R) -> usize {
    let v = rng.gen_range(0..n - 1);
    if v >= taken {
        v + 1
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn complete_graph(n: usize) -> Graph {
        let mut g = Graph::new(false);
        for _ in 0..n {
            g.add_vertex();
        }
        for u in 0..n as VertexId {
            for v in (u + 1)..n as VertexId {
                g.add_edge(u, v);
            }
        }
        g
    }

    #[test]
    fn produces_no_self_loops() {
        let input = complete_graph(6);
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let random = generate(&input, &mut rng);
            for v in 0..random.size() as VertexId {
                assert!(!random.adjacency(v).contains(&v), "self-loop at {}", v);
            }
        }
    }

    #[test]
    fn dense_graph_degree_sequence_is_preserved_exactly() {
        // on a complete graph every vertex still owing degree has a
        // non-neighbor that also owes degree, so a pairable mate always
        // exists and no draw may consume stubs without producing an edge
        let input = complete_graph(5);
        for seed in 0..200 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let random = generate(&input, &mut rng);
            assert_eq!(
                random.degree_sequence(),
                input.degree_sequence(),
                "degree sequence changed for seed {}",
                seed
            );
        }
    }

    #[test]
    fn sparse_graph_degrees_are_never_raised() {
        // a path can paint itself into a corner (its degree sequence has a
        // single realization), so only the upper bound holds in general
        let mut input = Graph::new(false);
        for _ in 0..3 {
            input.add_vertex();
        }
        input.add_edge(0, 1);
        input.add_edge(1, 2);
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let random = generate(&input, &mut rng);
            assert_eq!(random.size(), input.size());
            for v in 0..input.size() as VertexId {
                assert!(random.degree(v) <= input.degree(v));
            }
        }
    }

    #[test]
    fn degree_one_graphs_are_rewired_exactly() {
        // three disjoint edges: every vertex holds a single stub, so neither
        // self-pairs nor duplicate edges are possible and the degree
        // sequence must survive exactly
        let mut input = Graph::new(false);
        for _ in 0..6 {
            input.add_vertex();
        }
        input.add_edge(0, 1);
        input.add_edge(2, 3);
        input.add_edge(4, 5);

        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let random = generate(&input, &mut rng);
            assert_eq!(random.degree_sequence(), vec![1; 6]);
            assert_eq!(random.edges().len(), 3);
        }
    }

    #[test]
    fn connectivity_is_actually_rewired() {
        // a long path almost always changes at least one edge
        let mut input = Graph::new(false);
        for _ in 0..30 {
            input.add_vertex();
        }
        for v in 0..29 {
            input.add_edge(v, v + 1);
        }
        let mut rng = SmallRng::seed_from_u64(11);
        let random = generate(&input, &mut rng);
        let moved = (0..29)
            .filter(|&v| !random.edges().contains_key(&edge_code(v, v + 1)))
            .count();
        assert!(moved > 0);
    }
}
