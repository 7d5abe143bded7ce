//! Parallel drivers: target-graph enumeration and the random ensemble.

use crate::esu;
use crate::graph::Graph;
use crate::labeling::{Canonicalizer, LabelOracle};
use crate::pool::WorkerPool;
use crate::randgraph;
use crate::results::{SubgraphCount, SubgraphSink};
use crate::types::{Label, VertexId};
use log::warn;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::ops::AddAssign;
use std::sync::mpsc::channel;
use std::sync::Arc;

/// Exhaustively enumerates the target graph, one pool job per root vertex.
/// Every job fills a private sink which travels back over a channel and is
/// merged after the barrier, so the jobs share nothing but the graph and the
/// labeling backend.
pub fn enumerate_target<S>(
    graph: &Arc<Graph>,
    backend: &Arc<dyn Canonicalizer>,
    size: usize,
    pool: &mut WorkerPool,
) -> S
where
    S: SubgraphSink + Default + AddAssign + Send + 'static,
{
    pool.start_all();
    let oracle = Arc::new(LabelOracle::new(graph, Arc::clone(backend)));
    let probs = Arc::new(vec![1.0; size]);
    let (tx, rx) = channel();
    for root in 0..graph.size() as VertexId {
        let graph = Arc::clone(graph);
        let oracle = Arc::clone(&oracle);
        let probs = Arc::clone(&probs);
        let tx = tx.clone();
        pool.add_job(Box::new(move || {
            let mut rng = SmallRng::from_entropy();
            let mut sink = S::default();
            if let Err(e) =
                esu::enumerate_from(&graph, &mut sink, &oracle, size, &probs, root, &mut rng)
            {
                warn!("enumeration from vertex {} failed: {}", root, e);
            }
            let _ = tx.send(sink);
        }));
    }
    drop(tx);
    pool.synchronize();

    let mut total = S::default();
    for sink in rx.try_iter() {
        total += sink;
    }
    total
}

/// Generates and enumerates `trials` random graphs with the given sampling
/// schedule, one pool job per trial. Returns per-label relative-frequency
/// series zero-padded to the trial count; labels of the target graph are
/// seeded in so a pattern no trial produces still gets a full zero series.
pub fn analyze_random(
    graph: &Arc<Graph>,
    backend: &Arc<dyn Canonicalizer>,
    trials: usize,
    size: usize,
    probs: &[f64],
    pool: &mut WorkerPool,
    target: &SubgraphCount,
) -> HashMap<Label, Vec<f64>> {
    pool.start_all();
    let probs = Arc::new(probs.to_vec());
    let (tx, rx) = channel();
    for trial in 0..trials {
        let graph = Arc::clone(graph);
        let backend = Arc::clone(backend);
        let probs = Arc::clone(&probs);
        let tx = tx.clone();
        pool.add_job(Box::new(move || {
            let mut rng = SmallRng::from_entropy();
            let random_graph = randgraph::generate(&graph, &mut rng);
            let oracle = LabelOracle::new(&random_graph, backend);
            let mut count = SubgraphCount::new();
            if let Err(e) =
                esu::enumerate(&random_graph, &mut count, &oracle, size, &probs, &mut rng)
            {
                warn!("random trial {} failed: {}", trial, e);
            }
            let _ = tx.send(count.relative_frequencies());
        }));
    }
    drop(tx);
    pool.synchronize();

    let mut ensemble: HashMap<Label, Vec<f64>> = target
        .label_frequencies()
        .keys()
        .map(|label| (label.clone(), Vec::with_capacity(trials)))
        .collect();
    for frequencies in rx.try_iter() {
        for (label, freq) in frequencies {
            ensemble
                .entry(label)
                .or_insert_with(|| Vec::with_capacity(trials))
                .push(freq);
        }
    }
    for series in ensemble.values_mut() {
        series.resize(trials, 0.0);
    }
    ensemble
}
