//! RAND-ESU: randomized enumeration of connected induced subgraphs.

use crate::error::Result;
use crate::graph::Graph;
use crate::labeling::LabelOracle;
use crate::results::SubgraphSink;
use crate::subgraph::Subgraph;
use crate::types::VertexId;
use rand::Rng;
use std::collections::HashSet;

/// Enumerates connected induced subgraphs of `size` vertices across the whole
/// graph. The schedule `probs` must have one entry per subgraph size:
/// `probs[0]` selects the fraction of vertices used as enumeration roots and
/// `probs[k - 1]` gates extension *to* a subgraph of `k` vertices. All-1.0
/// probabilities reproduce exhaustive ESU.
pub fn enumerate<S, R>(
    graph: &Graph,
    sink: &mut S,
    oracle: &LabelOracle,
    size: usize,
    probs: &[f64],
    rng: &mut R,
) -> Result<()>
where
    S: SubgraphSink + ?Sized,
    R: Rng,
{
    assert!(probs.len() >= size && size >= 2);
    let roots: Vec<VertexId> = if probs[0] == 1.0 {
        (0..graph.size() as VertexId).collect()
    } else {
        assert!((0.0..=1.0).contains(&probs[0]));
        let wanted = (probs[0] * graph.size() as f64).round() as usize;
        let mut selected = HashSet::with_capacity(wanted);
        while selected.len() < wanted {
            selected.insert(rng.gen_range(0..graph.size() as VertexId));
        }
        selected.into_iter().collect()
    };
    for root in roots {
        enumerate_from(graph, sink, oracle, size, probs, root, rng)?;
    }
    Ok(())
}

/// Enumerates the single ESU branch rooted at `root`. Only neighbors with an
/// id greater than the root seed the extension set; together with the
/// exclusivity rule in `extend` this guarantees every connected subgraph is
/// discovered from exactly one root along exactly one path.
pub fn enumerate_from<S, R>(
    graph: &Graph,
    sink: &mut S,
    oracle: &LabelOracle,
    size: usize,
    probs: &[f64],
    root: VertexId,
    rng: &mut R,
) -> Result<()>
where
    S: SubgraphSink + ?Sized,
    R: Rng,
{
    let mut subgraph = Subgraph::new(size);
    let extension: Vec<VertexId> = graph
        .adjacency(root)
        .iter()
        .copied()
        .filter(|&w| w > root)
        .collect();
    subgraph.add(root);
    if should_extend(probs[1], rng) {
        extend(graph, subgraph, extension, probs, sink, oracle, rng)?;
    }
    Ok(())
}

fn extend<S, R>(
    graph: &Graph,
    subgraph: Subgraph,
    mut extension: Vec<VertexId>,
    probs: &[f64],
    sink: &mut S,
    oracle: &LabelOracle,
    rng: &mut R,
) -> Result<()>
where
    S: SubgraphSink + ?Sized,
    R: Rng,
{
    // one vertex short of completion: every remaining candidate finishes a
    // subgraph on its own, no further extension sets are needed
    if subgraph.size() == subgraph.capacity() - 1 {
        for &w in &extension {
            if should_extend(probs[probs.len() - 1], rng) {
                let mut complete = subgraph.clone();
                complete.add(w);
                sink.add(&complete, oracle)?;
            }
        }
        return Ok(());
    }

    let root = subgraph.root();
    while !extension.is_empty() {
        let w = extension.remove(0);
        // candidates for the grown subgraph: neighbors of w beyond the root
        // that neither belong to nor touch the current subgraph
        let mut next_extension = extension.clone();
        for &u in graph.adjacency(w) {
            if u > root && is_exclusive(graph, u, &subgraph) {
                next_extension.push(u);
            }
        }
        let mut grown = subgraph.clone();
        grown.add(w);
        if should_extend(probs[grown.size() - 1], rng) {
            extend(graph, grown, next_extension, probs, sink, oracle, rng)?;
        }
    }
    Ok(())
}

/// True if `node` is neither in the subgraph nor adjacent to any of its
/// vertices.
fn is_exclusive(graph: &Graph, node: VertexId, subgraph: &Subgraph) -> bool {
    subgraph
        .vertices()
        .iter()
        .all(|&v| v != node && !graph.adjacency(v).contains(&node))
}

fn should_extend<R: Rng>(prob: f64, rng: &mut R) -> bool {
    assert!(
        (0.0..=1.0).contains(&prob),
        "probability out of range: {}",
        prob
    );
    if prob == 1.0 {
        true
    } else if prob == 0.0 {
        false
    } else {
        rng.gen_bool(prob)
    }
}
