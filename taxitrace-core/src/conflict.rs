//! Pairwise separation conflict detection over snapshots.
//!
//! Two aircraft conflict when their oriented footprint rectangles overlap.
//! Each detected conflict is also projected backwards over recent history so
//! that playback can surface a developing conflict before the overlap
//! instant.

use std::collections::{BTreeMap, HashMap};

use bevy_math::Vec3Swizzles;
use math::Obb;
use ordered_float::NotNan;
use tracing::warn;

use crate::scenario::{AircraftMeta, AircraftSize, AircraftState, Callsign, SizeTable, Snapshot};

#[cfg(test)]
mod tests;

/// How far back (in relative time units) a detected conflict is projected
/// into earlier snapshots.
pub const LOOKBACK: f64 = 20.0;

/// An unordered pair of conflicting callsigns, stored lexicographically
/// ascending.
pub type ConflictPair = (Callsign, Callsign);

/// Conflicting pairs keyed by relative snapshot time.
#[derive(Debug, Clone, Default)]
pub struct ConflictTimeline {
    entries: BTreeMap<NotNan<f64>, Vec<ConflictPair>>,
}

impl ConflictTimeline {
    /// The pairs recorded at exactly `time`, empty when there is no entry
    /// (or `time` is NaN).
    #[must_use]
    pub fn at(&self, time: f64) -> &[ConflictPair] {
        NotNan::new(time)
            .ok()
            .and_then(|key| self.entries.get(&key))
            .map_or(&[], Vec::as_slice)
    }

    /// Appends one pair to the entry at `time`, skipping duplicates.
    /// NaN times are ignored.
    pub fn push(&mut self, time: f64, pair: ConflictPair) {
        let Ok(key) = NotNan::new(time) else { return };
        let pairs = self.entries.entry(key).or_default();
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }

    /// Records the full pair list for `time`. Empty lists are skipped so
    /// that conflict-free times stay absent from the timeline.
    pub fn set(&mut self, time: f64, pairs: Vec<ConflictPair>) {
        let Ok(key) = NotNan::new(time) else { return };
        if pairs.is_empty() {
            return;
        }
        // Backward fills from later snapshots may already have recorded
        // pairs here; merge rather than overwrite.
        let entry = self.entries.entry(key).or_default();
        for pair in pairs {
            if !entry.contains(&pair) {
                entry.push(pair);
            }
        }
    }

    /// Iterates entries in ascending time order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &[ConflictPair])> {
        self.entries.iter().map(|(time, pairs)| (time.into_inner(), pairs.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// The oriented footprint rectangle of one aircraft sample.
///
/// The fore half-length stretches with speed (saturating at speed 9) so that
/// fast aircraft claim more of the pavement ahead of them; the aft
/// half-length is the physical one.
#[must_use]
pub fn footprint(state: &AircraftState, size: AircraftSize) -> Obb {
    let half_length = size.length / 2.;
    let scale = 0.5 / (0.5 - (state.speed / 30.).min(0.3));
    Obb::new(
        state.position.xy(),
        state.heading,
        size.wingspan / 2.,
        half_length * scale,
        half_length,
    )
}

/// Runs the separation test over one snapshot.
///
/// Borrows the scenario's size table and per-aircraft metadata; detection
/// happens while the scenario is still being assembled, so the detector is
/// constructed fresh for each snapshot.
pub struct Detector<'a> {
    sizes: &'a SizeTable,
    fleet: &'a HashMap<Callsign, AircraftMeta>,
}

impl<'a> Detector<'a> {
    #[must_use]
    pub fn new(sizes: &'a SizeTable, fleet: &'a HashMap<Callsign, AircraftMeta>) -> Self {
        Self { sizes, fleet }
    }

    /// Tests every unordered pair in `snapshot`, marking conflicting
    /// aircraft, backfilling `timeline` over recent `history`, and returning
    /// the pairs found at this snapshot.
    ///
    /// Aircraft parked at a gate are never in conflict.
    pub fn detect(
        &self,
        time: f64,
        snapshot: &mut Snapshot,
        history: &[(f64, Snapshot)],
        timeline: &mut ConflictTimeline,
    ) -> Vec<ConflictPair> {
        let mut pairs = Vec::new();
        let callsigns: Vec<Callsign> = snapshot.keys().cloned().collect();
        for (index, first) in callsigns.iter().enumerate() {
            for second in &callsigns[index + 1..] {
                {
                    let a = &snapshot[first];
                    let b = &snapshot[second];
                    if a.status.is_gate() || b.status.is_gate() {
                        continue;
                    }
                    if !self.in_conflict(first, a, second, b) {
                        continue;
                    }
                }
                if let Some(state) = snapshot.get_mut(first) {
                    state.conflict = true;
                }
                if let Some(state) = snapshot.get_mut(second) {
                    state.conflict = true;
                }
                self.backfill(time, first, second, history, timeline);
                pairs.push((first.clone(), second.clone()));
            }
        }
        pairs
    }

    /// Whether two samples' footprints overlap.
    #[must_use]
    pub fn in_conflict(
        &self,
        first: &str,
        a: &AircraftState,
        second: &str,
        b: &AircraftState,
    ) -> bool {
        let size_a = self.size_for(first);
        let size_b = self.size_for(second);
        // Cheap circle reject before the separating-axis test: the combined
        // full lengths bound any possible footprint overlap.
        let reach = size_a.length + size_b.length;
        if a.position.xy().distance_squared(b.position.xy()) > reach * reach {
            return false;
        }
        footprint(a, size_a).intersects(&footprint(b, size_b))
    }

    fn size_for(&self, callsign: &str) -> AircraftSize {
        match self.fleet.get(callsign) {
            Some(meta) => self.sizes.resolve(&meta.model),
            None => {
                warn!("{callsign} has no recorded type; using default size");
                self.sizes.resolve("default")
            }
        }
    }

    /// Projects a conflict found at `time` backwards through `history`.
    ///
    /// Walks snapshots newest-first and stops at the lookback horizon, when
    /// either aircraft is absent, or when both were already flagged (an
    /// earlier detection has covered the rest).
    fn backfill(
        &self,
        time: f64,
        first: &Callsign,
        second: &Callsign,
        history: &[(f64, Snapshot)],
        timeline: &mut ConflictTimeline,
    ) {
        let horizon = time - LOOKBACK;
        for (past, snapshot) in history.iter().rev() {
            if *past <= horizon {
                break;
            }
            let (Some(a), Some(b)) = (snapshot.get(first), snapshot.get(second)) else {
                break;
            };
            if a.conflict && b.conflict {
                break;
            }
            timeline.push(*past, (first.clone(), second.clone()));
        }
    }
}
