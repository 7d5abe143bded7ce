use clap::{load_yaml, App};
use log::info;
use netmotif::{
    analysis,
    graph::Graph,
    labeling::{Canonicalizer, LabelgCanonicalizer, MinPermCanonicalizer},
    pool::WorkerPool,
    results::{SubgraphCollection, SubgraphCount},
    stats::MotifStats,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;

const MOTIF_P_VALUE_CUTOFF: f64 = 0.05;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let yaml = load_yaml!("cli.yml");
    let matches = App::from_yaml(yaml).get_matches();

    let file = matches.value_of("FILE").unwrap();
    let threads: usize = matches.value_of("THREADS").unwrap_or("16").parse()?;
    let size: usize = matches.value_of("SIZE").unwrap_or("4").parse()?;
    let trials: usize = matches.value_of("RANDOM").unwrap_or("1000").parse()?;
    let directed = matches.is_present("directed");
    if size < 2 {
        return Err("motif size must be at least 2".into());
    }
    let probs = match matches.values_of("prob") {
        Some(values) => values
            .map(str::parse)
            .collect::<Result<Vec<f64>, _>>()?,
        None => {
            let mut probs = vec![1.0; size.saturating_sub(2)];
            probs.extend_from_slice(&[0.5, 0.5]);
            probs
        }
    };
    if probs.len() != size || probs.iter().any(|p| !(0.0..=1.0).contains(p)) {
        return Err("probabilities must be one value in [0, 1] per subgraph size".into());
    }

    let mut rng = SmallRng::from_entropy();
    let graph = Arc::new(Graph::from_file(file, directed, &mut rng)?);
    info!(
        "parsed graph: {} vertices, {} edges",
        graph.size(),
        graph.edges().len()
    );

    let backend: Arc<dyn Canonicalizer> = match matches.value_of("LABELG") {
        Some(path) => Arc::new(LabelgCanonicalizer::new(path)),
        None => Arc::new(MinPermCanonicalizer::new()),
    };

    let mut pool = WorkerPool::new(threads);
    pool.start_all();
    let started = Instant::now();

    info!("enumerating target graph...");
    let output_path = matches.value_of("OUTPUT");
    let (target_count, collection) = if output_path.is_some() {
        let collection: SubgraphCollection =
            analysis::enumerate_target(&graph, &backend, size, &mut pool);
        (collection.count().clone(), Some(collection))
    } else {
        (
            analysis::enumerate_target::<SubgraphCount>(&graph, &backend, size, &mut pool),
            None,
        )
    };
    if !backend.is_alive() {
        return Err("labeling worker died, aborting".into());
    }
    let target_freqs = target_count.relative_frequencies();
    info!("found {} subgraph classes in the target graph", target_count.len());

    info!("analyzing {} random graphs...", trials);
    let ensemble = analysis::analyze_random(
        &graph, &backend, trials, size, &probs, &mut pool, &target_count,
    );

    pool.kill_all(true);
    for message in pool.take_errors() {
        log::warn!("job failure: {}", message);
    }
    if !backend.is_alive() {
        return Err("labeling worker died, aborting".into());
    }

    info!("comparing target graph to the random ensemble...");
    let stats = MotifStats::new(&target_freqs, &ensemble, trials);
    println!("{}", stats);
    info!("total time: {} ms", started.elapsed().as_millis());

    if let (Some(collection), Some(path)) = (collection, output_path) {
        let p_values = stats.p_values();
        collection.write_motifs(path, &p_values, MOTIF_P_VALUE_CUTOFF)?;
        info!("wrote motif collection to {}", path);
    }
    Ok(())
}
