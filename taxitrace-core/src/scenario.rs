//! Track store: parses a recorded surface-movement log into a navigable
//! sequence of time-indexed snapshots.

use std::collections::btree_map::Entry as SnapshotEntry;
use std::collections::hash_map::Entry as MetaEntry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use bevy_math::Vec3;
use math::Heading;
use tracing::{info, warn};

use crate::conflict::{ConflictPair, ConflictTimeline, Detector};
use crate::cursor::Cursor;
use crate::scan::{self, Source};


#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] scan::Error),
    #[error("{path}: no track records found")]
    NoRecords { path: PathBuf },
    #[error("{path}: no `default` aircraft size entry")]
    NoDefaultSize { path: PathBuf },
}

/// An aircraft identifier as it appears in the track log.
pub type Callsign = String;

/// All aircraft states at one discrete simulation timestamp.
///
/// Ordered by callsign so that iteration (and hence conflict pair
/// enumeration) is deterministic.
pub type Snapshot = BTreeMap<Callsign, AircraftState>;

/// An aircraft movement status code from the track log.
///
/// The set of codes is open-ended; only a few prefixes and suffixes carry
/// meaning for the analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status(String);

impl Status {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self { Self(code.into()) }

    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }

    /// Parked at a gate; parked aircraft cannot conflict.
    #[must_use]
    pub fn is_gate(&self) -> bool { self.0.starts_with("GATE") }

    /// Whether this status marks the aircraft as a departure
    /// (`VEC`, or any `DEP`-suffixed code).
    #[must_use]
    pub fn is_departure_marker(&self) -> bool { self.0 == "VEC" || self.0.ends_with("DEP") }

    /// En-route to a destination; a former departure reaching this status has
    /// changed destination rather than flipped to an arrival.
    #[must_use]
    pub fn is_enroute(&self) -> bool { self.0 == "ONRTE" }

    #[must_use]
    pub fn is_null(&self) -> bool { self.0 == "null" }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// One kinematic sample of one aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftState {
    pub status:   Status,
    pub position: Vec3,
    /// Degrees clockwise from north.
    pub heading:  Heading,
    pub speed:    f32,
    /// Simulation-relative time of the sample.
    pub time:     f64,
    /// Set transiently during conflict detection.
    pub conflict: bool,
}

impl AircraftState {
    fn same_kinematics(&self, other: &Self) -> bool {
        self.position == other.position
            && self.heading == other.heading
            && self.speed == other.speed
    }
}

/// Per-aircraft metadata accumulated over the scenario.
#[derive(Debug, Clone)]
pub struct AircraftMeta {
    /// The aircraft model, keying into the [`SizeTable`].
    pub model:        String,
    /// Sticky departure/arrival classification.
    pub is_departure: bool,
}

/// Aircraft footprint dimensions used for conflict geometry.
#[derive(Debug, Clone, Copy)]
pub struct AircraftSize {
    pub length:   f32,
    pub wingspan: f32,
}

/// Model name to footprint size table, with a guaranteed `default` entry.
#[derive(Debug, Clone)]
pub struct SizeTable {
    sizes:   HashMap<String, AircraftSize>,
    default: AircraftSize,
}

impl SizeTable {
    /// Creates an in-memory table with the given fallback entry.
    #[must_use]
    pub fn new(default: AircraftSize) -> Self { Self { sizes: HashMap::new(), default } }

    pub fn insert(&mut self, model: impl Into<String>, size: AircraftSize) {
        self.sizes.insert(model.into(), size);
    }

    /// Loads the size table from a flat-text file of
    /// `model textureFile length wingspan` lines.
    ///
    /// The file must contain a `default` row, which backs lookups of unknown
    /// models.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let source = Source::open(path)?;
        let mut sizes = HashMap::new();
        for mut line in source.lines() {
            let model = line.next_str("model")?.to_owned();
            let _texture = line.next_str("textureFile")?;
            let length: f32 = line.next("length")?;
            let wingspan: f32 = line.next("wingspan")?;
            sizes.insert(model, AircraftSize { length, wingspan });
        }
        let Some(&default) = sizes.get("default") else {
            return Err(Error::NoDefaultSize { path: path.to_owned() });
        };
        Ok(Self { sizes, default })
    }

    #[must_use]
    pub fn get(&self, model: &str) -> Option<AircraftSize> { self.sizes.get(model).copied() }

    /// Looks up a model, falling back to the `default` entry with a warning.
    #[must_use]
    pub fn resolve(&self, model: &str) -> AircraftSize {
        self.sizes.get(model).copied().unwrap_or_else(|| {
            warn!("aircraft model {model:?} not in size table; using default");
            self.default
        })
    }
}

/// A gap in one aircraft's track history.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackGap {
    pub callsign: Callsign,
    /// Relative time of the last sample before the gap.
    pub from:     f64,
    /// Relative time of the first sample after the gap.
    pub to:       f64,
}

/// Everything derived from one track file: the snapshot sequence,
/// per-aircraft track histories and metadata, and the conflict timeline.
///
/// Immutable once loaded; playback goes through [`Scenario::cursor`].
pub struct Scenario {
    snapshots:      Vec<(f64, Snapshot)>,
    tracks:         HashMap<Callsign, Vec<AircraftState>>,
    meta:           HashMap<Callsign, AircraftMeta>,
    sizes:          SizeTable,
    timeline:       ConflictTimeline,
    sim_start_time: f64,
    utc_start_time: i64,
    sim_length:     f64,
}

impl Scenario {
    /// Loads a track log and aircraft size table.
    ///
    /// When `detect_conflicts` is set, every snapshot is analyzed as it is
    /// closed and the conflict timeline is populated, including the
    /// predictive backward fill.
    pub fn load(
        track_file: impl AsRef<Path>,
        size_file: impl AsRef<Path>,
        detect_conflicts: bool,
    ) -> Result<Self, Error> {
        let track_file = track_file.as_ref();
        let sizes = SizeTable::load(size_file)?;
        let source = Source::open(track_file)?;

        let mut snapshots: Vec<(f64, Snapshot)> = Vec::new();
        let mut tracks: HashMap<Callsign, Vec<AircraftState>> = HashMap::new();
        let mut meta: HashMap<Callsign, AircraftMeta> = HashMap::new();
        let mut timeline = ConflictTimeline::default();

        let mut start: Option<(f64, i64)> = None;
        let mut prev_time = 0.;
        let mut open = Snapshot::new();

        for mut line in source.lines() {
            let sim_time: f64 = line.next("simTime")?;
            let utc_time: i64 = line.next("utcTime")?;
            let callsign = line.next_str("callsign")?;
            let model = line.next_str("acType")?;
            let _ = line.next_str("ignored")?;
            let status = Status::new(line.next_str("status")?);
            let x: f32 = line.next("x")?;
            let y: f32 = line.next("y")?;
            let z: f32 = line.next("z")?;
            let heading = Heading::from_degrees(line.next::<f32>("heading")?);
            let speed: f32 = line.next("speed")?;

            let sim_start = match start {
                Some((sim_start, _)) => sim_start,
                None => {
                    start = Some((sim_time, utc_time));
                    prev_time = sim_time;
                    sim_time
                }
            };

            if sim_time != prev_time {
                // A new raw timestamp closes the previous snapshot.
                flush(
                    prev_time - sim_start,
                    &mut open,
                    &mut snapshots,
                    &mut timeline,
                    detect_conflicts.then(|| Detector::new(&sizes, &meta)),
                );
                prev_time = sim_time;
            }

            let state = AircraftState {
                status,
                position: Vec3::new(x, y, z),
                heading,
                speed,
                time: sim_time - sim_start,
                conflict: false,
            };

            if state.status.is_null() {
                warn!("{callsign} has 'null' status at {sim_time}");
            }

            let is_departure = state.status.is_departure_marker();
            match meta.entry(callsign.to_owned()) {
                MetaEntry::Vacant(entry) => {
                    entry.insert(AircraftMeta { model: model.to_owned(), is_departure });
                }
                MetaEntry::Occupied(mut entry) => {
                    let known = entry.get_mut();
                    if known.model != model {
                        warn!(
                            "type mismatch for {callsign} at {sim_time} \
                             (was {}, now {model})",
                            known.model
                        );
                    }
                    if known.is_departure != is_departure
                        && !(known.is_departure && state.status.is_enroute())
                    {
                        // Not a former departure that changed to arrival for
                        // another destination.
                        warn!(
                            "departure/arrival flip for {callsign} at {sim_time} \
                             (current status {})",
                            state.status
                        );
                        known.is_departure = is_departure;
                    }
                }
            }

            match open.entry(callsign.to_owned()) {
                SnapshotEntry::Vacant(entry) => {
                    entry.insert(state.clone());
                }
                SnapshotEntry::Occupied(entry) => {
                    // First write wins; only differing kinematics are worth a
                    // diagnostic.
                    if !entry.get().same_kinematics(&state) {
                        warn!("{callsign}: multiple differing entries at {sim_time}");
                    }
                }
            }

            tracks.entry(callsign.to_owned()).or_default().push(state);
        }

        let Some((sim_start_time, utc_start_time)) = start else {
            return Err(Error::NoRecords { path: track_file.to_owned() });
        };
        if !open.is_empty() {
            flush(
                prev_time - sim_start_time,
                &mut open,
                &mut snapshots,
                &mut timeline,
                detect_conflicts.then(|| Detector::new(&sizes, &meta)),
            );
        }

        let Some(&(sim_length, _)) = snapshots.last() else {
            return Err(Error::NoRecords { path: track_file.to_owned() });
        };

        let mut prev = -1.;
        for &(time, _) in &snapshots {
            if time > prev + 1. + 1e-9 {
                warn!("snapshot missing at {}", sim_start_time + prev + 1.);
            }
            prev = time;
        }

        #[expect(clippy::cast_possible_truncation, reason = "formatting a duration")]
        {
            let minutes = (sim_length / 60.) as i64;
            info!(
                "scenario is {} hours, {} minutes long; {} aircraft tracked",
                minutes / 60,
                minutes % 60,
                meta.len()
            );
        }

        Ok(Self {
            snapshots,
            tracks,
            meta,
            sizes,
            timeline,
            sim_start_time,
            utc_start_time,
            sim_length,
        })
    }

    /// The snapshot sequence in ascending relative-time order.
    ///
    /// Never empty: loading fails on a track file with no records.
    #[must_use]
    pub fn snapshots(&self) -> &[(f64, Snapshot)] { &self.snapshots }

    /// Raw simulation time of the first record.
    #[must_use]
    pub fn sim_start_time(&self) -> f64 { self.sim_start_time }

    /// UTC epoch time of the first record.
    #[must_use]
    pub fn utc_start_time(&self) -> i64 { self.utc_start_time }

    /// Relative time of the final snapshot.
    #[must_use]
    pub fn sim_length(&self) -> f64 { self.sim_length }

    /// A fresh playback cursor positioned at the first snapshot.
    #[must_use]
    pub fn cursor(&self) -> Cursor<'_> { Cursor::new(self) }

    /// The model of an aircraft, or None (logged) for unknown callsigns.
    #[must_use]
    pub fn aircraft_type(&self, callsign: &str) -> Option<&str> {
        let found = self.meta.get(callsign).map(|meta| meta.model.as_str());
        if found.is_none() {
            warn!("{callsign} not found in aircraft database");
        }
        found
    }

    /// Whether an aircraft is a departure, or None (logged) for unknown
    /// callsigns.
    #[must_use]
    pub fn is_departure(&self, callsign: &str) -> Option<bool> {
        let found = self.meta.get(callsign).map(|meta| meta.is_departure);
        if found.is_none() {
            warn!("{callsign} not found in aircraft database");
        }
        found
    }

    /// The full track history of an aircraft across all snapshots.
    #[must_use]
    pub fn aircraft_track(&self, callsign: &str) -> Option<&[AircraftState]> {
        let found = self.tracks.get(callsign).map(Vec::as_slice);
        if found.is_none() {
            warn!("{callsign} not found in track database");
        }
        found
    }

    #[must_use]
    pub fn sizes(&self) -> &SizeTable { &self.sizes }

    /// The full conflict timeline keyed by relative time.
    #[must_use]
    pub fn conflict_timeline(&self) -> &ConflictTimeline { &self.timeline }

    /// Conflicting pairs recorded at one relative time; empty when the time
    /// has no entry.
    #[must_use]
    pub fn conflicts_at(&self, time: f64) -> &[ConflictPair] { self.timeline.at(time) }

    /// Audits every aircraft's track history for sampling gaps of more than
    /// one time unit between consecutive samples.
    #[must_use]
    pub fn track_gaps(&self) -> Vec<TrackGap> {
        let mut gaps = Vec::new();
        for (callsign, track) in &self.tracks {
            for pair in track.windows(2) {
                if pair[1].time - pair[0].time > 1. + 1e-9 {
                    gaps.push(TrackGap {
                        callsign: callsign.clone(),
                        from:     pair[0].time,
                        to:       pair[1].time,
                    });
                }
            }
        }
        gaps.sort_by(|a, b| {
            (&a.callsign, a.from).partial_cmp(&(&b.callsign, b.from)).unwrap_or(std::cmp::Ordering::Equal)
        });
        gaps
    }
}

/// Closes the open snapshot: runs conflict detection over it (when enabled)
/// and appends it to the finalized sequence.
fn flush(
    time: f64,
    open: &mut Snapshot,
    snapshots: &mut Vec<(f64, Snapshot)>,
    timeline: &mut ConflictTimeline,
    detector: Option<Detector<'_>>,
) {
    let mut snapshot = std::mem::take(open);
    if let Some(detector) = detector {
        let pairs = detector.detect(time, &mut snapshot, snapshots, timeline);
        timeline.set(time, pairs);
    }
    snapshots.push((time, snapshot));
}
