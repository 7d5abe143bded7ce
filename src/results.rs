//! Pluggable sinks for enumerated subgraphs.

use crate::error::Result;
use crate::labeling::LabelOracle;
use crate::subgraph::Subgraph;
use crate::types::{Label, VertexId};
use itertools::Itertools;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::AddAssign;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Consumes completed subgraphs from the enumeration without the algorithm
/// knowing what becomes of them.
pub trait SubgraphSink {
    /// Records one completed subgraph under its canonical label.
    fn add(&mut self, subgraph: &Subgraph, oracle: &LabelOracle) -> Result<()>;
}

/// Label-to-frequency table. Each enumeration job usually owns a private
/// count and the driver merges them afterwards with `+=`, which is key-wise
/// addition and therefore order-insensitive.
#[derive(Debug, Clone, Default)]
pub struct SubgraphCount {
    label_freq: HashMap<Label, u64>,
}

impl SubgraphCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_label(&mut self, label: Label) {
        *self.label_freq.entry(label).or_insert(0) += 1;
    }

    pub fn label_frequencies(&self) -> &HashMap<Label, u64> {
        &self.label_freq
    }

    pub fn len(&self) -> usize {
        self.label_freq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.label_freq.is_empty()
    }

    /// Counts normalized into a probability distribution over labels.
    pub fn relative_frequencies(&self) -> HashMap<Label, f64> {
        if self.label_freq.is_empty() {
            return HashMap::new();
        }
        let total: u64 = self.label_freq.values().sum();
        self.label_freq
            .iter()
            .map(|(label, &count)| (label.clone(), count as f64 / total as f64))
            .collect()
    }
}

impl SubgraphSink for SubgraphCount {
    fn add(&mut self, subgraph: &Subgraph, oracle: &LabelOracle) -> Result<()> {
        let label = oracle.label(subgraph)?;
        self.add_label(label);
        Ok(())
    }
}

impl AddAssign for SubgraphCount {
    fn add_assign(&mut self, rhs: SubgraphCount) {
        for (label, count) in rhs.label_freq {
            *self.label_freq.entry(label).or_insert(0) += count;
        }
    }
}

/// Shared-aggregator mode: one count mutated under a mutex by every job.
/// Private-per-job counts merged after the barrier are preferred for large
/// ensembles; this exists for callers that want a single live table.
#[derive(Clone, Default)]
pub struct SharedCount(Arc<Mutex<SubgraphCount>>);

impl SharedCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SubgraphCount {
        self.0.lock().unwrap().clone()
    }
}

impl SubgraphSink for SharedCount {
    fn add(&mut self, subgraph: &Subgraph, oracle: &LabelOracle) -> Result<()> {
        let label = oracle.label(subgraph)?;
        self.0.lock().unwrap().add_label(label);
        Ok(())
    }
}

/// Counting sink that additionally remembers the vertex list of every
/// discovered instance, so motifs can be written out once scoring decides
/// which labels matter. Wraps a [`SubgraphCount`] rather than extending it.
#[derive(Debug, Clone, Default)]
pub struct SubgraphCollection {
    count: SubgraphCount,
    instances: HashMap<Label, Vec<String>>,
}

impl SubgraphCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> &SubgraphCount {
        &self.count
    }

    pub fn relative_frequencies(&self) -> HashMap<Label, f64> {
        self.count.relative_frequencies()
    }

    /// Writes every instance of every label with `p_values[label] <= cutoff`
    /// as a `<label>` line followed by a vertex-list line.
    pub fn write_motifs<P: AsRef<Path>>(
        &self,
        path: P,
        p_values: &HashMap<Label, f64>,
        cutoff: f64,
    ) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for label in self.instances.keys().sorted() {
            match p_values.get(label) {
                Some(&p) if p <= cutoff => {}
                _ => continue,
            }
            for vertices in &self.instances[label] {
                writeln!(out, "{}", label)?;
                writeln!(out, "{}", vertices)?;
            }
        }
        Ok(())
    }
}

impl SubgraphSink for SubgraphCollection {
    fn add(&mut self, subgraph: &Subgraph, oracle: &LabelOracle) -> Result<()> {
        let label = oracle.label(subgraph)?;
        self.instances
            .entry(label.clone())
            .or_insert_with(Vec::new)
            .push(subgraph.to_string());
        self.count.add_label(label);
        Ok(())
    }
}

impl AddAssign for SubgraphCollection {
    fn add_assign(&mut self, rhs: SubgraphCollection) {
        self.count += rhs.count;
        for (label, mut instances) in rhs.instances {
            self.instances
                .entry(label)
                .or_insert_with(Vec::new)
                .append(&mut instances);
        }
    }
}

/// Profile sink: frequencies broken down by participating vertex, for
/// locating where in the graph a pattern concentrates.
#[derive(Debug, Clone, Default)]
pub struct SubgraphProfile {
    frequencies: HashMap<Label, HashMap<VertexId, u64>>,
}

impl SubgraphProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_frequencies(&self, label: &str) -> Option<&HashMap<VertexId, u64>> {
        self.frequencies.get(label)
    }

    /// Distribution over labels weighted by vertex participation.
    pub fn relative_frequencies(&self) -> HashMap<Label, f64> {
        if self.frequencies.is_empty() {
            return HashMap::new();
        }
        let total: u64 = self
            .frequencies
            .values()
            .flat_map(|per_vertex| per_vertex.values())
            .sum();
        self.frequencies
            .iter()
            .map(|(label, per_vertex)| {
                let count: u64 = per_vertex.values().sum();
                (label.clone(), count as f64 / total as f64)
            })
            .collect()
    }
}

impl SubgraphSink for SubgraphProfile {
    fn add(&mut self, subgraph: &Subgraph, oracle: &LabelOracle) -> Result<()> {
        let label = oracle.label(subgraph)?;
        let per_vertex = self.frequencies.entry(label).or_insert_with(HashMap::new);
        for &v in subgraph.vertices() {
            *per_vertex.entry(v).or_insert(0) += 1;
        }
        Ok(())
    }
}

impl AddAssign for SubgraphProfile {
    fn add_assign(&mut self, rhs: SubgraphProfile) {
        for (label, per_vertex) in rhs.frequencies {
            let mine = self.frequencies.entry(label).or_insert_with(HashMap::new);
            for (v, count) in per_vertex {
                *mine.entry(v).or_insert(0) += count;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::labeling::{Canonicalizer, MinPermCanonicalizer};
    use std::io::Read;

    fn counted(labels: &[(&str, u64)]) -> SubgraphCount {
        let mut count = SubgraphCount::new();
        for &(label, n) in labels {
            for _ in 0..n {
                count.add_label(label.to_string());
            }
        }
        count
    }

    #[test]
    fn relative_frequencies_sum_to_one() {
        let count = counted(&[("a", 3), ("b", 1), ("c", 4)]);
        let freqs = count.relative_frequencies();
        let sum: f64 = freqs.values().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((freqs["a"] - 0.375).abs() < 1e-12);
    }

    #[test]
    fn empty_count_normalizes_to_an_empty_map() {
        let count = SubgraphCount::new();
        assert!(count.relative_frequencies().is_empty());
        assert!(SubgraphProfile::new().relative_frequencies().is_empty());
    }

    #[test]
    fn merge_is_commutative_and_keywise() {
        let a = counted(&[("x", 2), ("y", 1)]);
        let b = counted(&[("y", 4), ("z", 3)]);

        let mut ab = a.clone();
        ab += b.clone();
        let mut ba = b;
        ba += a;

        assert_eq!(ab.label_frequencies(), ba.label_frequencies());
        assert_eq!(ab.label_frequencies()["x"], 2);
        assert_eq!(ab.label_frequencies()["y"], 5);
        assert_eq!(ab.label_frequencies()["z"], 3);
    }

    #[test]
    fn collection_records_instances_and_counts() {
        let mut g = Graph::new(false);
        for _ in 0..3 {
            g.add_vertex();
        }
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        g.add_edge(0, 2);
        let backend: Arc<dyn Canonicalizer> = Arc::new(MinPermCanonicalizer::new());
        let oracle = LabelOracle::new(&g, backend);

        let mut sg = Subgraph::new(3);
        sg.add(0);
        sg.add(1);
        sg.add(2);

        let mut collection = SubgraphCollection::new();
        collection.add(&sg, &oracle).unwrap();
        assert_eq!(collection.count().len(), 1);

        let label = oracle.label(&sg).unwrap();
        let mut p_values = HashMap::new();
        p_values.insert(label.clone(), 0.01);

        let file = tempfile::NamedTempFile::new().unwrap();
        collection.write_motifs(file.path(), &p_values, 0.05).unwrap();
        let mut written = String::new();
        File::open(file.path())
            .unwrap()
            .read_to_string(&mut written)
            .unwrap();
        assert_eq!(written, format!("{}\n0 1 2\n", label));

        // above the cutoff nothing is written
        p_values.insert(label, 0.5);
        collection.write_motifs(file.path(), &p_values, 0.05).unwrap();
        let mut written = String::new();
        File::open(file.path())
            .unwrap()
            .read_to_string(&mut written)
            .unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn profile_tracks_per_vertex_counts() {
        let mut g = Graph::new(false);
        for _ in 0..3 {
            g.add_vertex();
        }
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        let backend: Arc<dyn Canonicalizer> = Arc::new(MinPermCanonicalizer::new());
        let oracle = LabelOracle::new(&g, backend);

        let mut sg = Subgraph::new(3);
        sg.add(0);
        sg.add(1);
        sg.add(2);

        let mut profile = SubgraphProfile::new();
        profile.add(&sg, &oracle).unwrap();
        let label = oracle.label(&sg).unwrap();
        let per_vertex = profile.vertex_frequencies(&label).unwrap();
        assert_eq!(per_vertex[&0], 1);
        assert_eq!(per_vertex[&1], 1);
        assert_eq!(per_vertex[&2], 1);

        let sum: f64 = profile.relative_frequencies().values().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn shared_count_aggregates_across_clones() {
        let mut g = Graph::new(false);
        for _ in 0..2 {
            g.add_vertex();
        }
        g.add_edge(0, 1);
        let backend: Arc<dyn Canonicalizer> = Arc::new(MinPermCanonicalizer::new());
        let oracle = LabelOracle::new(&g, backend);

        let mut sg = Subgraph::new(2);
        sg.add(0);
        sg.add(1);

        let mut shared = SharedCount::new();
        let mut other = shared.clone();
        shared.add(&sg, &oracle).unwrap();
        other.add(&sg, &oracle).unwrap();
        let snapshot = shared.snapshot();
        assert_eq!(snapshot.label_frequencies().values().sum::<u64>(), 2);
    }
}
