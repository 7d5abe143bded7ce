//! Canonical labeling: sextet-packed adjacency encoding and the label oracle.

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::subgraph::Subgraph;
use crate::types::{edge_code, EdgeCode, EdgeKind, Label};
use itertools::Itertools;
use log::error;
use std::collections::HashMap;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

const ENCODE_BIAS: u8 = 63;

/// Serializes a boolean adjacency matrix into the printable sextet form: a
/// size byte (`n + 63`) followed by 6-bit chunks of the adjacency bitstream,
/// each biased by 63. Undirected matrices pack the upper triangle column by
/// column; directed matrices pack the full matrix row by row behind a `&`
/// marker.
pub fn encode_adjacency(matrix: &[Vec<bool>], directed: bool) -> String {
    let n = matrix.len();
    let mut bits = Vec::new();
    if directed {
        for row in matrix {
            bits.extend(row.iter().copied());
        }
    } else {
        for j in 1..n {
            for row in matrix.iter().take(j) {
                bits.push(row[j]);
            }
        }
    }
    let mut out = String::new();
    if directed {
        out.push('&');
    }
    out.push((n as u8 + ENCODE_BIAS) as char);
    for chunk in bits.chunks(6) {
        let mut sextet = 0u8;
        for (k, &bit) in chunk.iter().enumerate() {
            if bit {
                sextet |= 1 << (5 - k);
            }
        }
        out.push((sextet + ENCODE_BIAS) as char);
    }
    out
}

/// Inverse of [`encode_adjacency`]. Returns the matrix and whether the
/// encoding was directed.
pub fn decode_adjacency(encoded: &str) -> Option<(Vec<Vec<bool>>, bool)> {
    let directed = encoded.starts_with('&');
    let body = if directed { &encoded[1..] } else { encoded };
    let mut bytes = body.bytes();
    let n = bytes.next()?.checked_sub(ENCODE_BIAS)? as usize;
    let mut bits = Vec::with_capacity(6 * body.len());
    for byte in bytes {
        let sextet = byte.checked_sub(ENCODE_BIAS)?;
        for k in 0..6 {
            bits.push(sextet & (1 << (5 - k)) != 0);
        }
    }
    let mut matrix = vec![vec![false; n]; n];
    let mut stream = bits.into_iter();
    if directed {
        for i in 0..n {
            for j in 0..n {
                matrix[i][j] = stream.next()?;
            }
        }
    } else {
        for j in 1..n {
            for i in 0..j {
                let bit = stream.next()?;
                matrix[i][j] = bit;
                matrix[j][i] = bit;
            }
        }
    }
    Some((matrix, directed))
}

/// The canonical-form backend. Implementations must serialize or otherwise
/// make their computation safe under concurrent callers.
pub trait Canonicalizer: Send + Sync {
    /// Returns the canonical form of an encoded adjacency pattern.
    fn canonical(&self, encoded: &str) -> Result<Label>;

    /// False once the backing worker has died; a supervisor should abort the
    /// run rather than keep submitting requests.
    fn is_alive(&self) -> bool {
        true
    }
}

type LabelRequest = (String, Sender<Result<Label>>);

/// Backend that shells out to an external `labelg` executable. All requests
/// funnel through one long-lived worker thread which memoizes input to output
/// for its whole lifetime, so concurrent enumeration jobs submit freely and
/// block only on their own reply channel.
pub struct LabelgCanonicalizer {
    jobs: Mutex<Option<Sender<LabelRequest>>>,
    alive: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl LabelgCanonicalizer {
    pub fn new(labelg_path: &str) -> Self {
        let (tx, rx) = channel();
        let alive = Arc::new(AtomicBool::new(true));
        let path = labelg_path.to_string();
        let flag = Arc::clone(&alive);
        let worker = thread::spawn(move || worker_loop(&path, &rx, &flag));
        LabelgCanonicalizer {
            jobs: Mutex::new(Some(tx)),
            alive,
            worker: Some(worker),
        }
    }
}

fn worker_loop(labelg: &str, requests: &Receiver<LabelRequest>, alive: &AtomicBool) {
    let mut memo: HashMap<String, Label> = HashMap::new();
    while let Ok((encoded, reply)) = requests.recv() {
        if let Some(label) = memo.get(&encoded) {
            let _ = reply.send(Ok(label.clone()));
            continue;
        }
        let output = match Command::new(labelg).arg(&encoded).output() {
            Ok(output) => output,
            Err(e) => {
                // fatal: the reply channel is dropped unanswered, and so is
                // the request channel, which unblocks every caller with an
                // error instead of leaving them waiting
                error!("cannot run {}: {}", labelg, e);
                alive.store(false, Ordering::SeqCst);
                return;
            }
        };
        let stdout = String::from_utf8_lossy(&output.stdout);
        let label = stdout.lines().next().unwrap_or("").to_string();
        // a rejected pattern must fail its own request, never enter the
        // memo table as an empty label shared by every pattern
        if !output.status.success() || label.is_empty() {
            error!(
                "{} rejected {:?}: {}",
                labelg,
                encoded,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            let _ = reply.send(Err(Error::BadPattern(encoded)));
            continue;
        }
        memo.insert(encoded, label.clone());
        let _ = reply.send(Ok(label));
    }
}

impl Canonicalizer for LabelgCanonicalizer {
    fn canonical(&self, encoded: &str) -> Result<Label> {
        if encoded.is_empty() {
            return Err(Error::BadPattern(String::new()));
        }
        let jobs = match self.jobs.lock() {
            Ok(guard) => guard.as_ref().cloned(),
            Err(_) => None,
        };
        let jobs = jobs.ok_or(Error::LabelWorkerDown)?;
        let (reply_tx, reply_rx) = channel();
        jobs.send((encoded.to_string(), reply_tx))
            .map_err(|_| Error::LabelWorkerDown)?;
        reply_rx.recv().map_err(|_| Error::LabelWorkerDown)?
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

impl Drop for LabelgCanonicalizer {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.jobs.lock() {
            guard.take();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// In-process backend: the canonical form is the minimum encoding over all
/// vertex permutations. Exponential in the subgraph order, so only suitable
/// for small motif sizes, which is also the regime where no external labelg
/// is worth configuring.
#[derive(Default)]
pub struct MinPermCanonicalizer {
    memo: Mutex<HashMap<String, Label>>,
}

impl MinPermCanonicalizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Canonicalizer for MinPermCanonicalizer {
    fn canonical(&self, encoded: &str) -> Result<Label> {
        if let Ok(memo) = self.memo.lock() {
            if let Some(label) = memo.get(encoded) {
                return Ok(label.clone());
            }
        }
        let (matrix, directed) =
            decode_adjacency(encoded).ok_or_else(|| Error::BadPattern(encoded.to_string()))?;
        let n = matrix.len();
        let mut best: Option<String> = None;
        for perm in (0..n).permutations(n) {
            let mut permuted = vec![vec![false; n]; n];
            for (i, row) in matrix.iter().enumerate() {
                for (j, &bit) in row.iter().enumerate() {
                    permuted[perm[i]][perm[j]] = bit;
                }
            }
            let candidate = encode_adjacency(&permuted, directed);
            if best.as_ref().map_or(true, |b| candidate < *b) {
                best = Some(candidate);
            }
        }
        let label = best.unwrap_or_else(|| encoded.to_string());
        if let Ok(mut memo) = self.memo.lock() {
            memo.insert(encoded.to_string(), label.clone());
        }
        Ok(label)
    }
}

/// Per-graph labeling handle: builds the induced adjacency pattern of a
/// subgraph, honoring the owning graph's edge kinds, and asks the shared
/// backend for its isomorphism class. Each enumeration job constructs its own
/// handle; the backend is the single serialization point.
pub struct LabelOracle {
    directed: bool,
    edges: HashMap<EdgeCode, EdgeKind>,
    backend: Arc<dyn Canonicalizer>,
}

impl LabelOracle {
    pub fn new(graph: &Graph, backend: Arc<dyn Canonicalizer>) -> Self {
        LabelOracle {
            directed: graph.is_directed(),
            edges: graph.edges().clone(),
            backend,
        }
    }

    pub fn label(&self, subgraph: &Subgraph) -> Result<Label> {
        let matrix = self.adjacency_matrix(subgraph);
        self.backend.canonical(&encode_adjacency(&matrix, self.directed))
    }

    pub fn is_alive(&self) -> bool {
        self.backend.is_alive()
    }

    fn adjacency_matrix(&self, subgraph: &Subgraph) -> Vec<Vec<bool>> {
        let n = subgraph.size();
        let mut matrix = vec![vec![false; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let u = subgraph.get(i);
                let v = subgraph.get(j);
                let connected = match self.edges.get(&edge_code(u, v)) {
                    Some(EdgeKind::Undirected) => true,
                    Some(EdgeKind::MinToMax) => u < v,
                    Some(EdgeKind::MaxToMin) => u > v,
                    None => false,
                };
                matrix[i][j] = connected;
            }
        }
        matrix
    }
}
