use std::collections::HashMap;

use bevy_math::Vec3;
use math::Heading;

use super::{ConflictTimeline, Detector, footprint};
use crate::scenario::{
    AircraftMeta, AircraftSize, AircraftState, Callsign, SizeTable, Snapshot, Status,
};

fn table() -> SizeTable {
    let mut sizes = SizeTable::new(AircraftSize { length: 20., wingspan: 20. });
    sizes.insert("B738", AircraftSize { length: 40., wingspan: 36. });
    sizes
}

fn fleet(callsigns: &[&str]) -> HashMap<Callsign, AircraftMeta> {
    callsigns
        .iter()
        .map(|callsign| {
            ((*callsign).to_owned(), AircraftMeta { model: "B738".to_owned(), is_departure: false })
        })
        .collect()
}

fn state(x: f32, y: f32, status: &str) -> AircraftState {
    AircraftState {
        status:   Status::new(status),
        position: Vec3::new(x, y, 0.),
        heading:  Heading::NORTH,
        speed:    5.,
        time:     0.,
        conflict: false,
    }
}

fn snapshot(entries: &[(&str, AircraftState)]) -> Snapshot {
    entries.iter().map(|(callsign, state)| ((*callsign).to_owned(), state.clone())).collect()
}

#[test]
fn overlapping_aircraft_conflict() {
    let sizes = table();
    let fleet = fleet(&["AAL1", "UAL2"]);
    let detector = Detector::new(&sizes, &fleet);
    let mut snap = snapshot(&[("AAL1", state(0., 0., "TAXI")), ("UAL2", state(10., 0., "TAXI"))]);
    let mut timeline = ConflictTimeline::default();

    let pairs = detector.detect(100., &mut snap, &[], &mut timeline);
    assert_eq!(pairs, vec![("AAL1".to_owned(), "UAL2".to_owned())]);
    assert!(snap["AAL1"].conflict);
    assert!(snap["UAL2"].conflict);
}

#[test]
fn gate_status_suppresses_conflict() {
    let sizes = table();
    let fleet = fleet(&["AAL1", "UAL2"]);
    let detector = Detector::new(&sizes, &fleet);
    let mut snap =
        snapshot(&[("AAL1", state(0., 0., "GATE_A1")), ("UAL2", state(10., 0., "TAXI"))]);
    let mut timeline = ConflictTimeline::default();

    let pairs = detector.detect(100., &mut snap, &[], &mut timeline);
    assert!(pairs.is_empty());
    assert!(!snap["UAL2"].conflict);
}

#[test]
fn distant_aircraft_do_not_conflict() {
    let sizes = table();
    let fleet = fleet(&["AAL1", "UAL2"]);
    let detector = Detector::new(&sizes, &fleet);
    let mut snap = snapshot(&[("AAL1", state(0., 0., "TAXI")), ("UAL2", state(500., 0., "TAXI"))]);
    let mut timeline = ConflictTimeline::default();

    assert!(detector.detect(100., &mut snap, &[], &mut timeline).is_empty());
    assert!(timeline.is_empty());
}

#[test]
fn backfill_projects_over_lookback_window() {
    let sizes = table();
    let fleet = fleet(&["AAL1", "UAL2"]);
    let detector = Detector::new(&sizes, &fleet);
    let past = snapshot(&[("AAL1", state(0., 0., "TAXI")), ("UAL2", state(200., 0., "TAXI"))]);
    let history = vec![(75., past.clone()), (85., past.clone()), (95., past)];

    let mut snap = snapshot(&[("AAL1", state(0., 0., "TAXI")), ("UAL2", state(10., 0., "TAXI"))]);
    let mut timeline = ConflictTimeline::default();
    detector.detect(100., &mut snap, &history, &mut timeline);

    let pair = ("AAL1".to_owned(), "UAL2".to_owned());
    assert_eq!(timeline.at(95.), &[pair.clone()]);
    assert_eq!(timeline.at(85.), &[pair]);
    // 75 is at the far edge of the 20-unit window.
    assert!(timeline.at(75.).is_empty());
}

#[test]
fn backfill_stops_when_an_aircraft_is_absent() {
    let sizes = table();
    let fleet = fleet(&["AAL1", "UAL2"]);
    let detector = Detector::new(&sizes, &fleet);
    let both = snapshot(&[("AAL1", state(0., 0., "TAXI")), ("UAL2", state(200., 0., "TAXI"))]);
    let only_one = snapshot(&[("AAL1", state(0., 0., "TAXI"))]);
    let history = vec![(85., both.clone()), (90., only_one), (95., both)];

    let mut snap = snapshot(&[("AAL1", state(0., 0., "TAXI")), ("UAL2", state(10., 0., "TAXI"))]);
    let mut timeline = ConflictTimeline::default();
    detector.detect(100., &mut snap, &history, &mut timeline);

    assert_eq!(timeline.at(95.).len(), 1);
    assert!(timeline.at(90.).is_empty());
    assert!(timeline.at(85.).is_empty());
}

#[test]
fn backfill_stops_at_already_flagged_pair() {
    let sizes = table();
    let fleet = fleet(&["AAL1", "UAL2"]);
    let detector = Detector::new(&sizes, &fleet);
    let mut flagged = snapshot(&[("AAL1", state(0., 0., "TAXI")), ("UAL2", state(8., 0., "TAXI"))]);
    for state in flagged.values_mut() {
        state.conflict = true;
    }
    let clean = snapshot(&[("AAL1", state(0., 0., "TAXI")), ("UAL2", state(200., 0., "TAXI"))]);
    let history = vec![(85., clean.clone()), (90., flagged), (95., clean)];

    let mut snap = snapshot(&[("AAL1", state(0., 0., "TAXI")), ("UAL2", state(10., 0., "TAXI"))]);
    let mut timeline = ConflictTimeline::default();
    detector.detect(100., &mut snap, &history, &mut timeline);

    assert_eq!(timeline.at(95.).len(), 1);
    assert!(timeline.at(90.).is_empty());
    assert!(timeline.at(85.).is_empty());
}

#[test]
fn fast_aircraft_project_a_longer_fore_extent() {
    let size = AircraftSize { length: 40., wingspan: 36. };
    let mut fast = state(0., 0., "TAXI");
    fast.speed = 9.;
    let mut slow = state(0., 0., "TAXI");
    slow.speed = 0.;

    let fast_max_y = footprint(&fast, size)
        .vertices()
        .iter()
        .map(|v| v.y)
        .fold(f32::NEG_INFINITY, f32::max);
    let slow_max_y = footprint(&slow, size)
        .vertices()
        .iter()
        .map(|v| v.y)
        .fold(f32::NEG_INFINITY, f32::max);

    // At speed 9 the stretch saturates at 2.5x the half-length.
    assert!((fast_max_y - 50.).abs() < 1e-4, "got {fast_max_y}");
    assert!((slow_max_y - 20.).abs() < 1e-4, "got {slow_max_y}");
}

#[test]
fn timeline_skips_empty_entries_and_deduplicates() {
    let mut timeline = ConflictTimeline::default();
    timeline.set(5., Vec::new());
    assert!(timeline.is_empty());

    let pair = ("AAL1".to_owned(), "UAL2".to_owned());
    timeline.push(5., pair.clone());
    timeline.push(5., pair.clone());
    assert_eq!(timeline.at(5.), &[pair.clone()]);

    timeline.set(5., vec![pair.clone(), ("DAL3".to_owned(), "SWA4".to_owned())]);
    assert_eq!(timeline.at(5.).len(), 2);

    let times: Vec<f64> = timeline.iter().map(|(time, _)| time).collect();
    assert_eq!(times, vec![5.]);
    assert!(timeline.at(f64::NAN).is_empty());
}
