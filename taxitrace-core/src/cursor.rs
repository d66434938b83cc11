//! Seekable playback over a scenario's snapshot sequence.
//!
//! A cursor sits on one snapshot plus a fractional "ministep" carry in
//! `0..1`. Whole steps move between snapshots; a nonzero remainder
//! synthesizes an interpolated snapshot between the current one and the
//! next.

use std::borrow::Cow;

use bevy_math::FloatExt;

use crate::conflict::ConflictPair;
use crate::scenario::{Scenario, Snapshot};


/// One playback frame: either a stored snapshot (borrowed) or an
/// interpolated one (owned).
pub struct Frame<'a> {
    /// Relative time of the frame, interpolated when between snapshots.
    pub time:     f64,
    pub snapshot: Cow<'a, Snapshot>,
}

/// A playback position over a [`Scenario`].
///
/// The underlying snapshot sequence is never empty, so the cursor always has
/// a frame to return.
pub struct Cursor<'a> {
    scenario: &'a Scenario,
    index:    usize,
    ministep: f64, // always 0 <= ministep < 1
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(scenario: &'a Scenario) -> Self {
        Self { scenario, index: 0, ministep: 0. }
    }

    /// Relative time of the snapshot the cursor currently sits on.
    #[must_use]
    pub fn time(&self) -> f64 { self.scenario.snapshots()[self.index].0 }

    /// Jumps to the snapshot at `percent` (0 to 100) of the sequence,
    /// clamping out-of-range values and clearing any fractional carry.
    pub fn seek(&mut self, percent: f64) -> Frame<'a> {
        let count = self.scenario.snapshots().len();
        #[expect(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "index fits in f64 and negatives clamp to zero"
        )]
        let index = ((percent.max(0.) / 100.) * count as f64) as usize;
        self.index = index.min(count - 1);
        self.ministep = 0.;
        self.frame_at(self.index)
    }

    /// Advances (or rewinds, for negative `delta`) by a possibly fractional
    /// number of snapshot steps.
    ///
    /// Running off either end clamps to the boundary snapshot and zeroes the
    /// fractional carry.
    pub fn step(&mut self, delta: f64) -> Frame<'a> {
        let last = self.scenario.snapshots().len() - 1;
        let mut delta = delta;
        while delta >= 1. {
            delta -= 1.;
            if self.index == last {
                return self.clamp(last);
            }
            self.index += 1;
        }
        while delta <= -1. {
            delta += 1.;
            if self.index == 0 {
                return self.clamp(0);
            }
            self.index -= 1;
        }

        self.ministep += delta;
        if self.ministep >= 1. {
            self.ministep -= 1.;
            if self.index == last {
                return self.clamp(last);
            }
            self.index += 1;
        }
        if self.ministep < 0. {
            self.ministep += 1.;
            if self.index == 0 {
                return self.clamp(0);
            }
            self.index -= 1;
        }

        if self.ministep == 0. || self.index == last {
            return self.frame_at(self.index);
        }
        self.interpolated()
    }

    /// Conflicting pairs recorded at the cursor's current snapshot time.
    #[must_use]
    pub fn conflicts(&self) -> &'a [ConflictPair] { self.scenario.conflicts_at(self.time()) }

    fn clamp(&mut self, index: usize) -> Frame<'a> {
        self.index = index;
        self.ministep = 0.;
        self.frame_at(index)
    }

    fn frame_at(&self, index: usize) -> Frame<'a> {
        let (time, ref snapshot) = self.scenario.snapshots()[index];
        Frame { time, snapshot: Cow::Borrowed(snapshot) }
    }

    /// Synthesizes a snapshot between the current index and the next one at
    /// the fractional carry.
    fn interpolated(&self) -> Frame<'a> {
        let snapshots = self.scenario.snapshots();
        let (current_time, ref current) = snapshots[self.index];
        let (next_time, ref next) = snapshots[self.index + 1];
        let blend = self.ministep;
        #[expect(clippy::cast_possible_truncation, reason = "blend factor is in 0..1")]
        let blend32 = blend as f32;

        let mut blended = Snapshot::new();
        for (callsign, state) in current {
            let mut out = state.clone();
            if let Some(target) = next.get(callsign) {
                out.position = state.position.lerp(target.position, blend32);
                out.heading = state.heading.lerp_shortest(target.heading, blend32);
                out.speed = state.speed.lerp(target.speed, blend32);
                out.time = (1. - blend) * state.time + blend * target.time;
                // Status and the conflict flag stay with the earlier sample.
            } else {
                // The aircraft leaves the log before the next snapshot; keep
                // its last sample visible until the step completes.
                out.time = (1. - blend) * state.time + blend * next_time;
            }
            blended.insert(callsign.clone(), out);
        }

        Frame {
            time:     (1. - blend) * current_time + blend * next_time,
            snapshot: Cow::Owned(blended),
        }
    }
}
