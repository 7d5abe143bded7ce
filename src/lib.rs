//! Parallel network motif detection via randomized subgraph enumeration.

pub mod analysis;
pub mod error;
pub mod esu;
pub mod graph;
pub mod labeling;
pub mod pool;
pub mod randgraph;
pub mod results;
pub mod stats;
pub mod subgraph;
pub mod types;
