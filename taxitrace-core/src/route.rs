//! All-pairs shortest-path routing over the surface network.
//!
//! Floyd-Warshall runs once per network and its predecessor matrix is
//! persisted next to the data files, so subsequent runs skip the cubic
//! solve entirely. Cache problems are never fatal: any mismatch or read
//! failure falls back to recomputing.

use std::fmt::Write as _;
use std::path::Path;
use std::{fs, io};

use itertools::Itertools;
use tracing::{info, warn};

use crate::network::Network;


/// Non-adjacent sentinel. A third of `i32::MAX` so that summing two
/// sentinels still compares sanely against a third.
const INF: f64 = (i32::MAX / 3) as f64;

const CACHE_FILE: &str = "AllPairsRoutes";
const CACHE_MAGIC: &str = "taxitrace-routes-v1";

/// Shortest-path queries between surface network nodes.
pub struct RouteSolver {
    /// Adjacency lengths, [`INF`] where no link exists.
    graph: Vec<Vec<f64>>,
    /// `pred[i][j]` is the highest-numbered intermediate node on the
    /// shortest i-to-j path, or `i` when the path is direct.
    pred:  Vec<Vec<usize>>,
}

impl RouteSolver {
    /// Builds the solver for `network`, reusing the cached predecessor
    /// matrix under `dir` when its header matches, and persisting a fresh
    /// one otherwise.
    #[must_use]
    pub fn new(network: &Network, dir: &Path) -> Self {
        let count = network.nodes().len();
        let mut graph = vec![vec![INF; count]; count];
        for link in network.links() {
            let length = f64::from(link.length);
            graph[link.from][link.to] = length;
            if link.undirected {
                graph[link.to][link.from] = length;
            }
        }

        let cache = dir.join(CACHE_FILE);
        let pred = match load_cache(&cache, count) {
            Some(pred) => pred,
            None => {
                let pred = floyd_warshall(&graph);
                if let Err(err) = store_cache(&cache, &pred) {
                    warn!("could not persist route cache {}: {err}", cache.display());
                }
                pred
            }
        };
        Self { graph, pred }
    }

    /// The node sequence of the shortest path from `from` to `to`,
    /// inclusive of both endpoints.
    ///
    /// When no path exists the result degenerates to `[from, to]`.
    #[must_use]
    pub fn shortest_path(&self, from: usize, to: usize) -> Vec<usize> {
        let mut path = vec![from];
        self.fill_path(from, to, &mut path);
        path.push(to);
        path
    }

    /// Chains shortest paths through each waypoint in `via` in order,
    /// without repeating the joining nodes.
    #[must_use]
    pub fn route(&self, from: usize, to: usize, via: &[usize]) -> Vec<usize> {
        let mut path = vec![from];
        let mut previous = from;
        for &waypoint in via.iter().chain(std::iter::once(&to)) {
            self.fill_path(previous, waypoint, &mut path);
            path.push(waypoint);
            previous = waypoint;
        }
        path
    }

    fn fill_path(&self, from: usize, to: usize, path: &mut Vec<usize>) {
        if from == to {
            return;
        }
        let mid = self.pred[from][to];
        if mid == from || mid == to {
            return;
        }
        self.fill_path(from, mid, path);
        path.push(mid);
        self.fill_path(mid, to, path);
    }

    /// Total length of a path along adjacent links, or None when any hop is
    /// not a link.
    #[must_use]
    pub fn path_length(&self, path: &[usize]) -> Option<f64> {
        let mut total = 0.;
        for (&a, &b) in path.iter().tuple_windows() {
            let length = self.graph[a][b];
            if length >= INF {
                return None;
            }
            total += length;
        }
        Some(total)
    }
}

fn floyd_warshall(graph: &[Vec<f64>]) -> Vec<Vec<usize>> {
    let count = graph.len();
    let mut pred: Vec<Vec<usize>> = (0..count).map(|i| vec![i; count]).collect();
    let mut dist = graph.to_vec();
    for k in 0..count {
        for i in 0..count {
            for j in 0..count {
                if dist[i][j] > dist[i][k] + dist[k][j] {
                    dist[i][j] = dist[i][k] + dist[k][j];
                    pred[i][j] = k;
                }
            }
        }
    }
    pred
}

/// Reads a cached predecessor matrix, returning None (after a diagnostic
/// where appropriate) on any header or shape mismatch.
fn load_cache(path: &Path, count: usize) -> Option<Vec<Vec<usize>>> {
    let text = fs::read_to_string(path).ok()?;
    let mut tokens = text.split_whitespace();
    if tokens.next()? != CACHE_MAGIC {
        warn!("route cache {} has no recognized header; recomputing", path.display());
        return None;
    }
    let cached: usize = tokens.next()?.parse().ok()?;
    if cached != count {
        warn!(
            "route cache {} is for {cached} nodes but the network has {count}; recomputing",
            path.display()
        );
        return None;
    }
    let mut pred = vec![vec![0; count]; count];
    for row in &mut pred {
        for cell in row.iter_mut() {
            let value: usize = tokens.next()?.parse().ok()?;
            if value >= count {
                warn!("route cache {} has out-of-range entries; recomputing", path.display());
                return None;
            }
            *cell = value;
        }
    }
    info!("loaded predecessor matrix from {}", path.display());
    Some(pred)
}

/// Write-then-rename so an interrupted run never leaves a torn cache.
fn store_cache(path: &Path, pred: &[Vec<usize>]) -> io::Result<()> {
    let mut text = String::new();
    let _ = writeln!(text, "{CACHE_MAGIC} {}", pred.len());
    for row in pred {
        let mut sep = "";
        for value in row {
            let _ = write!(text, "{sep}{value}");
            sep = " ";
        }
        text.push('\n');
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)
}
