//! Static airport surface model: the taxiway node-link graph plus named
//! gates, spots, fixes, runway assignments and display polygons.
//!
//! Loaded from a directory of flat-text files (`nodes.txt`, `links.txt`,
//! `fixes.txt`, `runways.txt` and an optional `ramp.txt`).

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bevy_math::Vec2;
use tracing::{debug, warn};

use crate::scan::{self, Source};

#[cfg(test)]
mod tests;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] scan::Error),
    #[error("{path}:{line}: node at position {position} declares index {declared}")]
    IndexMismatch { path: PathBuf, line: usize, position: usize, declared: usize },
    #[error("{path}:{line}: link references node {node} but only {nodes} nodes are defined")]
    UnknownNode { path: PathBuf, line: usize, node: usize, nodes: usize },
}

/// The role of a node in the surface graph. Unrecognized codes are kept
/// verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum NodeType {
    #[strum(serialize = "GATE_NODE")]
    Gate,
    #[strum(serialize = "SPOT_NODE")]
    Spot,
    #[strum(serialize = "QUEUE_NODE")]
    Queue,
    #[strum(serialize = "RAMP_NODE")]
    Ramp,
    #[strum(serialize = "DEPARTURE_NODE")]
    Departure,
    #[strum(serialize = "ARRIVAL_NODE")]
    Arrival,
    #[strum(default)]
    Other(String),
}

/// One node of the surface graph.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub position:   Vec2,
    /// The node's own index, identical to its position in [`Network::nodes`].
    pub index:      usize,
    /// External surface-management identifier.
    pub sms_id:     String,
    pub node_type:  NodeType,
    pub out_degree: u32,
    pub in_degree:  u32,
}

/// One taxiway segment between two nodes.
#[derive(Debug, Clone)]
pub struct Link {
    pub from:       usize,
    pub to:         usize,
    /// Taxiway name painted on the segment, e.g. `B3`.
    pub label:      String,
    pub link_type:  String,
    /// Whole degrees in `0..360`, measured from `to` towards `from`.
    pub direction:  i32,
    pub length:     f32,
    /// Taxiways carry traffic both ways.
    pub undirected: bool,
}

/// Extracts the surface-management spot name from a node's external ID.
///
/// The convention is airport-specific, so the strategy is pluggable; the
/// default handles IDs with the spot number delimited by dashes.
pub trait SpotIdNormalizer {
    /// Returns the canonical spot name, or None when the ID does not follow
    /// the convention.
    fn normalize(&self, sms_id: &str) -> Option<String>;
}

/// Default convention: the spot number sits between the first and last `-`
/// of the ID; leading zeroes are stripped and an `S` prefix is added, so
/// `RAMP-007-W` becomes `S7`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DashDelimitedSpotIds;

impl SpotIdNormalizer for DashDelimitedSpotIds {
    fn normalize(&self, sms_id: &str) -> Option<String> {
        let start = sms_id.find('-')? + 1;
        let end = sms_id.rfind('-')?;
        let digits = sms_id.get(start..end)?;
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(format!("S{trimmed}"))
    }
}

#[derive(strum::EnumString)]
enum RunwayNodeKind {
    #[strum(serialize = "ARRIVAL_NODE")]
    Arrival,
    #[strum(serialize = "DEPARTURE_NODE")]
    Departure,
    #[strum(serialize = "RUNWAY_XING_NODE")]
    Crossing,
}

/// The loaded surface model. Immutable after [`Network::load`].
#[derive(Debug)]
pub struct Network {
    nodes:           Vec<Vertex>,
    links:           Vec<Link>,
    gates:           HashMap<String, usize>,
    spots:           HashMap<String, usize>,
    arrival_fixes:   HashMap<String, usize>,
    departure_fixes: HashMap<String, usize>,
    node_runways:    HashMap<usize, String>,
    runway_indices:  HashMap<String, usize>,
    runway_names:    HashMap<usize, String>,
    runway_polys:    Vec<Vec<Vec2>>,
    ramp_polys:      Vec<Vec<Vec2>>,
}

impl Network {
    /// Loads the model from a directory using the default spot-ID
    /// convention.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, Error> {
        Self::load_with(dir.as_ref(), &DashDelimitedSpotIds)
    }

    /// Loads the model with a custom spot-ID normalization strategy.
    pub fn load_with(dir: &Path, spot_ids: &dyn SpotIdNormalizer) -> Result<Self, Error> {
        let mut network = Self {
            nodes:           Vec::new(),
            links:           Vec::new(),
            gates:           HashMap::new(),
            spots:           HashMap::new(),
            arrival_fixes:   HashMap::new(),
            departure_fixes: HashMap::new(),
            node_runways:    HashMap::new(),
            runway_indices:  HashMap::new(),
            runway_names:    HashMap::new(),
            runway_polys:    Vec::new(),
            ramp_polys:      Vec::new(),
        };
        network.read_nodes(&dir.join("nodes.txt"), spot_ids)?;
        network.read_links(&dir.join("links.txt"))?;
        network.read_fixes(&dir.join("fixes.txt"))?;
        network.read_runways(&dir.join("runways.txt"))?;
        network.read_ramp(&dir.join("ramp.txt"))?;
        Ok(network)
    }

    fn read_nodes(&mut self, path: &Path, spot_ids: &dyn SpotIdNormalizer) -> Result<(), Error> {
        let source = Source::open(path)?;
        for mut line in source.lines() {
            let x: f32 = line.next("x")?;
            let y: f32 = line.next("y")?;
            let declared: usize = line.next("index")?;
            let sms_id = line.next_str("smsId")?.to_owned();
            let type_code = line.next_str("type")?;
            let node_type = NodeType::from_str(type_code)
                .unwrap_or_else(|_| NodeType::Other(type_code.to_owned()));
            let out_degree: u32 = line.next("outDegree")?;
            let in_degree: u32 = line.next("inDegree")?;

            let index = self.nodes.len();
            // Routing and link files address nodes by file position, so a
            // declared index that disagrees makes the whole model unusable.
            if declared != index {
                return Err(Error::IndexMismatch {
                    path: path.to_owned(),
                    line: line.number(),
                    position: index,
                    declared,
                });
            }
            if out_degree != in_degree {
                warn!("node {index} ({sms_id}) has unidirectional links");
            }

            match node_type {
                NodeType::Spot => {
                    if let Some(spot) = spot_ids.normalize(&sms_id) {
                        self.spots.insert(spot, index);
                    } else {
                        warn!("unrecognized spot id {sms_id:?} for node {index}");
                    }
                }
                NodeType::Gate => {
                    self.gates.insert(sms_id.clone(), index);
                }
                _ => {}
            }

            self.nodes.push(Vertex {
                position: Vec2::new(x, y),
                index,
                sms_id,
                node_type,
                out_degree,
                in_degree,
            });
        }
        Ok(())
    }

    fn read_links(&mut self, path: &Path) -> Result<(), Error> {
        let source = Source::open(path)?;
        for mut line in source.lines() {
            let _number: u32 = line.next("number")?;
            let from: usize = line.next("from")?;
            let to: usize = line.next("to")?;
            let _ = line.next_str("ignored")?;
            let _ = line.next_str("ignored")?;
            let label = line.next_str("label")?.to_owned();
            let link_type = line.next_str("type")?.to_owned();

            let from_pos = self.node_position(path, line.number(), from)?;
            let to_pos = self.node_position(path, line.number(), to)?;
            let delta = from_pos - to_pos;
            #[expect(clippy::cast_possible_truncation, reason = "whole-degree bearing")]
            let mut direction = delta.y.atan2(delta.x).to_degrees() as i32;
            if direction < 0 {
                direction += 360;
            }

            self.links.push(Link {
                from,
                to,
                label,
                link_type,
                direction,
                length: delta.length(),
                undirected: true,
            });
        }
        Ok(())
    }

    fn node_position(&self, path: &Path, line: usize, node: usize) -> Result<Vec2, Error> {
        self.nodes.get(node).map(|vertex| vertex.position).ok_or_else(|| Error::UnknownNode {
            path: path.to_owned(),
            line,
            node,
            nodes: self.nodes.len(),
        })
    }

    fn read_fixes(&mut self, path: &Path) -> Result<(), Error> {
        let source = Source::open(path)?;
        for mut line in source.lines() {
            let name = line.next_str("name")?.to_owned();
            let index: usize = line.next("index")?;
            let kind = line.next_str("type")?;
            match kind {
                "ARRIVAL_FIX" => {
                    self.arrival_fixes.insert(name, index);
                }
                "DEPARTURE_FIX" => {
                    self.departure_fixes.insert(name, index);
                }
                other => {
                    warn!(
                        "{}:{}: ignoring fix {name} with unknown type {other}",
                        path.display(),
                        line.number()
                    );
                }
            }
        }
        Ok(())
    }

    /// Runways alternate freely between polygon outline lines (`x y` pairs)
    /// and node declarations (`name kind nodeIndex [nodeIndex2]`); a
    /// declaration closes any outline in progress.
    fn read_runways(&mut self, path: &Path) -> Result<(), Error> {
        let source = Source::open(path)?;
        let mut outline: Vec<Vec2> = Vec::new();
        for mut line in source.lines() {
            let first = line.next_str("nameOrX")?;
            let second = line.next_str("kindOrY")?;
            if let Ok(kind) = RunwayNodeKind::from_str(second) {
                if !outline.is_empty() {
                    self.runway_polys.push(std::mem::take(&mut outline));
                }
                let name = first.to_owned();
                let node: usize = line.next("nodeIndex")?;
                self.node_runways.insert(node, name.clone());
                if matches!(kind, RunwayNodeKind::Crossing) {
                    // Crossings sit on two runway nodes at once.
                    let other: usize = line.next("nodeIndex2")?;
                    self.node_runways.insert(other, name.clone());
                }
                if !self.runway_indices.contains_key(&name) {
                    let index = self.runway_indices.len();
                    self.runway_indices.insert(name.clone(), index);
                    self.runway_names.insert(index, name);
                }
            } else {
                let (Ok(x), Ok(y)) = (first.parse::<f32>(), second.parse::<f32>()) else {
                    warn!(
                        "{}:{}: unrecognized runways entry {:?}",
                        path.display(),
                        line.number(),
                        line.raw()
                    );
                    continue;
                };
                outline.push(Vec2::new(x, y));
            }
        }
        if !outline.is_empty() {
            self.runway_polys.push(outline);
        }
        Ok(())
    }

    /// The ramp outline file is optional; polygons are separated by blank
    /// lines.
    fn read_ramp(&mut self, path: &Path) -> Result<(), Error> {
        let source = match Source::open(path) {
            Ok(source) => source,
            Err(scan::Error::Io { ref source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!("no ramp outline at {}", path.display());
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let mut outline: Vec<Vec2> = Vec::new();
        for mut line in source.all_lines() {
            if line.is_blank() {
                if !outline.is_empty() {
                    self.ramp_polys.push(std::mem::take(&mut outline));
                }
                continue;
            }
            let x: f32 = line.next("x")?;
            let y: f32 = line.next("y")?;
            outline.push(Vec2::new(x, y));
        }
        if !outline.is_empty() {
            self.ramp_polys.push(outline);
        }
        Ok(())
    }

    #[must_use]
    pub fn nodes(&self) -> &[Vertex] { &self.nodes }

    #[must_use]
    pub fn links(&self) -> &[Link] { &self.links }

    /// Resolves a gate name (e.g. `A9`) to its node, logging unknown names.
    #[must_use]
    pub fn gate_node(&self, gate: &str) -> Option<usize> {
        let found = self.gates.get(gate).copied();
        if found.is_none() {
            warn!("no node found for gate {gate}");
        }
        found
    }

    /// Resolves a canonical spot name (e.g. `S7`) to its node, logging
    /// unknown names.
    #[must_use]
    pub fn spot_node(&self, spot: &str) -> Option<usize> {
        let found = self.spots.get(spot).copied();
        if found.is_none() {
            warn!("no node found for spot {spot}");
        }
        found
    }

    /// Resolves a fix name, checking arrival fixes before departure fixes,
    /// logging unknown names.
    #[must_use]
    pub fn fix_index(&self, fix: &str) -> Option<usize> {
        let found = self
            .arrival_fixes
            .get(fix)
            .or_else(|| self.departure_fixes.get(fix))
            .copied();
        if found.is_none() {
            warn!("no index found for fix {fix}");
        }
        found
    }

    /// The number of departure fixes.
    #[must_use]
    pub fn num_fixes(&self) -> usize { self.departure_fixes.len() }

    #[must_use]
    pub fn num_runways(&self) -> usize { self.runway_indices.len() }

    #[must_use]
    pub fn runway_index(&self, runway: &str) -> Option<usize> {
        let found = self.runway_indices.get(runway).copied();
        if found.is_none() {
            warn!("no index found for runway {runway}");
        }
        found
    }

    #[must_use]
    pub fn runway_name(&self, index: usize) -> Option<&str> {
        self.runway_names.get(&index).map(String::as_str)
    }

    /// The runway a node belongs to, if any.
    #[must_use]
    pub fn node_runway(&self, node: usize) -> Option<&str> {
        self.node_runways.get(&node).map(String::as_str)
    }

    #[must_use]
    pub fn runway_polys(&self) -> &[Vec<Vec2>] { &self.runway_polys }

    #[must_use]
    pub fn ramp_polys(&self) -> &[Vec<Vec2>] { &self.ramp_polys }
}
