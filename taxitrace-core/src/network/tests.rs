use super::{DashDelimitedSpotIds, Error, Network, NodeType, SpotIdNormalizer};

const NODES: &str = "\
# x y index smsId type out in
100 200 0 A9 GATE_NODE 2 2
300 200 1 RAMP-007-W SPOT_NODE 2 2
500 200 2 TWY-1 TAXI_NODE 2 1
700 200 3 RWY-1 DEPARTURE_NODE 1 1
";

const LINKS: &str = "\
0 0 1 u u B3 TAXI_LINK
1 1 2 u u B3 TAXI_LINK
2 2 3 u u C TAXI_LINK
";

const FIXES: &str = "\
MERIT 0 ARRIVAL_FIX
WAVEY 1 DEPARTURE_FIX
SHARED 3 ARRIVAL_FIX
SHARED 4 DEPARTURE_FIX
BOGUS 2 SOMETHING_ELSE
";

const RUNWAYS: &str = "\
10 10
20 10
20 90
10 90
22L DEPARTURE_NODE 3
22L ARRIVAL_NODE 2
30 10
40 10
40 90
04R RUNWAY_XING_NODE 1 0
";

fn write_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn standard_dir() -> tempfile::TempDir {
    write_dir(&[
        ("nodes.txt", NODES),
        ("links.txt", LINKS),
        ("fixes.txt", FIXES),
        ("runways.txt", RUNWAYS),
    ])
}

#[test]
fn loads_and_classifies_nodes() {
    let dir = standard_dir();
    let network = Network::load(dir.path()).unwrap();

    assert_eq!(network.nodes().len(), 4);
    assert_eq!(network.gate_node("A9"), Some(0));
    assert_eq!(network.spot_node("S7"), Some(1));
    assert_eq!(network.nodes()[2].node_type, NodeType::Other("TAXI_NODE".to_owned()));
    assert_eq!(network.gate_node("Z99"), None);
    assert_eq!(network.spot_node("S99"), None);
}

#[test]
fn declared_index_mismatch_is_fatal() {
    let dir = write_dir(&[
        ("nodes.txt", "100 200 5 A9 GATE_NODE 2 2\n"),
        ("links.txt", ""),
        ("fixes.txt", ""),
        ("runways.txt", ""),
    ]);
    let err = Network::load(dir.path()).unwrap_err();
    assert!(matches!(err, Error::IndexMismatch { position: 0, declared: 5, .. }));
}

#[test]
fn links_carry_derived_geometry() {
    let dir = standard_dir();
    let network = Network::load(dir.path()).unwrap();

    let link = &network.links()[0];
    assert_eq!((link.from, link.to), (0, 1));
    assert_eq!(link.label, "B3");
    assert!((link.length - 200.).abs() < 1e-3);
    // from is due west of to.
    assert_eq!(link.direction, 180);
    assert!(link.undirected);
}

#[test]
fn link_to_unknown_node_is_fatal() {
    let dir = write_dir(&[
        ("nodes.txt", "100 200 0 A9 GATE_NODE 2 2\n"),
        ("links.txt", "0 0 9 u u B3 TAXI_LINK\n"),
        ("fixes.txt", ""),
        ("runways.txt", ""),
    ]);
    let err = Network::load(dir.path()).unwrap_err();
    assert!(matches!(err, Error::UnknownNode { node: 9, nodes: 1, .. }));
}

#[test]
fn fixes_resolve_arrivals_before_departures() {
    let dir = standard_dir();
    let network = Network::load(dir.path()).unwrap();

    assert_eq!(network.fix_index("MERIT"), Some(0));
    assert_eq!(network.fix_index("WAVEY"), Some(1));
    assert_eq!(network.fix_index("SHARED"), Some(3));
    // Unknown fix types are skipped entirely.
    assert_eq!(network.fix_index("BOGUS"), None);
    // Only departure fixes are counted.
    assert_eq!(network.num_fixes(), 2);
}

#[test]
fn runways_interleave_outlines_and_node_declarations() {
    let dir = standard_dir();
    let network = Network::load(dir.path()).unwrap();

    assert_eq!(network.num_runways(), 2);
    assert_eq!(network.runway_index("22L"), Some(0));
    assert_eq!(network.runway_index("04R"), Some(1));
    assert_eq!(network.runway_name(1), Some("04R"));
    assert_eq!(network.runway_index("18C"), None);

    assert_eq!(network.node_runway(3), Some("22L"));
    assert_eq!(network.node_runway(2), Some("22L"));
    // A crossing claims both of its nodes.
    assert_eq!(network.node_runway(1), Some("04R"));
    assert_eq!(network.node_runway(0), Some("04R"));

    let polys = network.runway_polys();
    assert_eq!(polys.len(), 2);
    assert_eq!(polys[0].len(), 4);
    assert_eq!(polys[1].len(), 3);
}

#[test]
fn ramp_outline_is_optional() {
    let dir = standard_dir();
    let network = Network::load(dir.path()).unwrap();
    assert!(network.ramp_polys().is_empty());
}

#[test]
fn ramp_polygons_split_on_blank_lines() {
    let dir = write_dir(&[
        ("nodes.txt", NODES),
        ("links.txt", LINKS),
        ("fixes.txt", FIXES),
        ("runways.txt", RUNWAYS),
        ("ramp.txt", "1 2\n3 4\n5 6\n\n7 8\n9 10\n"),
    ]);
    let network = Network::load(dir.path()).unwrap();

    let polys = network.ramp_polys();
    assert_eq!(polys.len(), 2);
    assert_eq!(polys[0].len(), 3);
    assert_eq!(polys[1].len(), 2);
}

#[test]
fn comments_inside_ramp_outlines_do_not_split_polygons() {
    let dir = write_dir(&[
        ("nodes.txt", NODES),
        ("links.txt", LINKS),
        ("fixes.txt", FIXES),
        ("runways.txt", RUNWAYS),
        ("ramp.txt", "1 2\n3 4\n# surveyor note\n5 6\n"),
    ]);
    let network = Network::load(dir.path()).unwrap();

    let polys = network.ramp_polys();
    assert_eq!(polys.len(), 1);
    assert_eq!(polys[0].len(), 3);
}

#[test]
fn spot_ids_normalize_by_dash_delimiters() {
    let spots = DashDelimitedSpotIds;
    assert_eq!(spots.normalize("RAMP-007-W"), Some("S7".to_owned()));
    assert_eq!(spots.normalize("A-12-B"), Some("S12".to_owned()));
    // One dash, non-numeric digits, or all zeroes do not follow the
    // convention.
    assert_eq!(spots.normalize("NO-DASH"), None);
    assert_eq!(spots.normalize("A-12X-B"), None);
    assert_eq!(spots.normalize("X-000-Y"), None);
    assert_eq!(spots.normalize("PLAIN"), None);
}
