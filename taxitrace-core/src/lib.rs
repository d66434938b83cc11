//! Replay and analysis of recorded airport surface movements.
//!
//! A [`Scenario`] holds a track log parsed into time-indexed snapshots,
//! with separation conflicts detected as the log is loaded and a playback
//! [`Cursor`] for stepping and seeking through it. Alongside the dynamic
//! data, a [`Network`] models the static taxiway graph and a
//! [`RouteSolver`] answers shortest-path queries over it.

#![warn(clippy::pedantic)]
#![cfg_attr(feature = "precommit-checks", deny(warnings, clippy::pedantic, clippy::dbg_macro))]
#![allow(clippy::collapsible_else_if)] // this is usually intentional
#![cfg_attr(not(feature = "precommit-checks"), allow(dead_code, unused_variables, unused_imports))]
#![cfg_attr(feature = "rust-analyzer", warn(warnings, clippy::pedantic, clippy::dbg_macro))]

pub mod scan;

pub mod scenario;
pub use scenario::{AircraftState, Callsign, Scenario, SizeTable, Snapshot, Status};

pub mod conflict;
pub use conflict::{ConflictPair, ConflictTimeline, Detector};

pub mod cursor;
pub use cursor::{Cursor, Frame};

pub mod network;
pub use network::Network;

pub mod route;
pub use route::RouteSolver;
