use std::collections::BTreeSet;

use converter::{convert, load_network, ConversionConfig, Error, Output};
use float_cmp::assert_approx_eq;
use typed_id::TypedId;
use vector_map::{JunctionKind, Lane, LaneId, VectorMap};

const NETWORK: &str = r#"{
    "ring": {
        "type": "Roundabout",
        "x": 0.0, "y": 0.0, "heading": 0.0,
        "radius": 12.0,
        "exits": [0.0, 1.5707963267948966, 3.141592653589793],
        "exit_length": 6.0,
        "lane_width": 3.5,
        "speed_limit": 20.0
    },
    "east": {
        "type": "StraightRoad",
        "x": 18.0, "y": 0.0, "heading": 0.0,
        "length": 40.0,
        "lane_count": 2, "lane_width": 3.5, "forward_lanes": 1,
        "stop_line": true
    },
    "north": {
        "type": "BendRoad",
        "x": 0.0, "y": 18.0, "heading": 1.5707963267948966,
        "radius": 30.0, "angle": -1.5707963267948966,
        "lane_count": 2, "lane_width": 3.5
    },
    "west": {
        "type": "StraightRoad",
        "x": -58.0, "y": 0.0, "heading": 0.0,
        "length": 40.0,
        "lane_count": 2, "lane_width": 3.5
    }
}"#;

#[test]
fn roundabout_with_three_roads() -> anyhow::Result<()> {
    let records = load_network(NETWORK)?;
    assert_eq!(records.len(), 4);

    let output = convert(&records, &ConversionConfig::default())?;
    let map = &output.map;

    assert!(!map.lanes.is_empty());
    for lane in map.lanes.values() {
        assert!(map.dtlanes.contains(lane.dtlane));
        assert!(map.nodes.contains(lane.start_node));
        assert!(map.nodes.contains(lane.end_node));
        for link in lane.before.iter().chain(lane.after.iter()) {
            assert!(map.lanes.contains(*link));
        }
    }
    for node in map.nodes.values() {
        assert!(map.points.contains(node.point));
    }
    for line in map.lines.values() {
        assert!(map.points.contains(line.start) && map.points.contains(line.end));
    }
    assert_eq!(map.white_lines.len() + map.road_edges.len(), map.lines.len());

    let merging = map
        .lanes
        .values()
        .filter(|lane| lane.junction == JunctionKind::LeftMerging)
        .count();
    let branching = map
        .lanes
        .values()
        .filter(|lane| lane.junction == JunctionKind::RightBranching)
        .count();
    assert_eq!((merging, branching), (3, 3));

    // the ring lanes are appended first and close on themselves
    let first = vector_map::LaneId::from_index(1);
    let ring = &map.lanes[first];
    assert!(ring.before.is_some());
    assert_eq!(ring.speed_limit, 20.0);
    assert_eq!(map.lanes[ring.before.unwrap()].after, Some(first));

    assert_eq!(output.stop_lines.len(), 1);
    assert_eq!(output.stop_lines[0].road, "east");
    assert_approx_eq!(f64, output.stop_lines[0].points[0].x, 58.0, epsilon = 1e-9);
    Ok(())
}

/// Follows one link from `from` until `stop` holds, at most once round the map.
fn walk(
    map: &VectorMap,
    from: LaneId,
    link: fn(&Lane) -> Option<LaneId>,
    stop: impl Fn(LaneId) -> bool,
) -> Option<Vec<LaneId>> {
    let mut visited = vec![from];
    let mut current = from;
    for _ in 0..map.lanes.len() {
        current = link(&map.lanes[current])?;
        visited.push(current);
        if stop(current) {
            return Some(visited);
        }
    }
    None
}

fn starting_near(map: &VectorMap, x: f64, y: f64) -> Option<LaneId> {
    map.lanes
        .iter()
        .find(|(_, lane)| {
            map.node_coord(lane.start_node).map_or(false, |start| {
                (start.x - x).abs() < 1e-6 && (start.y - y).abs() < 1e-6
            })
        })
        .map(|(id, _)| id)
}

#[test]
fn traffic_flows_through_the_roundabout() -> anyhow::Result<()> {
    let output = convert(&load_network(NETWORK)?, &ConversionConfig::default())?;
    let map = &output.map;

    let first = LaneId::from_index(1);
    let ring_walk = walk(map, first, |lane| lane.after, |id| id == first).unwrap();
    let ring: BTreeSet<LaneId> = ring_walk.into_iter().collect();
    assert!(ring
        .iter()
        .all(|id| map.lanes[*id].junction == JunctionKind::Normal));
    // one ring lane per gap between neighbouring exit lanes, each a few records long
    assert!(ring.len() > 6);

    // every lane coming in through an exit joins the ring where the ring continues
    let merging: Vec<LaneId> = map
        .lanes
        .iter()
        .filter(|(_, lane)| lane.junction == JunctionKind::LeftMerging)
        .map(|(id, _)| id)
        .collect();
    assert_eq!(merging.len(), 3);
    for id in merging {
        let path = walk(map, id, |lane| lane.after, |id| ring.contains(&id)).unwrap();
        let (joined, last) = (path[path.len() - 1], path[path.len() - 2]);
        assert_eq!(map.lanes[last].end_node, map.lanes[joined].start_node);
        assert!(ring.contains(&map.lanes[joined].before.unwrap()));
    }

    // every lane leaving through an exit starts where a ring record ends
    let branching: Vec<LaneId> = map
        .lanes
        .iter()
        .filter(|(_, lane)| lane.junction == JunctionKind::RightBranching)
        .map(|(id, _)| id)
        .collect();
    assert_eq!(branching.len(), 3);
    for id in branching {
        let path = walk(map, id, |lane| lane.before, |id| ring.contains(&id)).unwrap();
        let (ring_record, leaving) = (path[path.len() - 1], path[path.len() - 2]);
        assert_eq!(map.lanes[ring_record].end_node, map.lanes[leaving].start_node);
    }

    // westbound on the east road, all the way onto the ring
    let east_end = starting_near(map, 58.0, 1.75).unwrap();
    assert!(walk(map, east_end, |lane| lane.after, |id| ring.contains(&id)).is_some());
    Ok(())
}

#[test]
fn exit_roads_chain_into_exit_lanes() -> anyhow::Result<()> {
    let records = load_network(NETWORK)?;
    let output = convert(&records, &ConversionConfig::default())?;
    let map = &output.map;

    // the outgoing lane of the east exit ends where the east road's forward lane starts
    let east_start = starting_near(map, 18.0, -1.75).unwrap();
    let before = map.lanes[east_start].before.unwrap();
    assert_eq!(map.lanes[before].junction, JunctionKind::RightBranching);
    Ok(())
}

#[test]
fn without_merge_pass() -> anyhow::Result<()> {
    let records = load_network(NETWORK)?;
    let merged = convert(&records, &ConversionConfig::default())?;
    let raw = convert(
        &records,
        &ConversionConfig {
            run_merge_pass: false,
            ..ConversionConfig::default()
        },
    )?;
    assert_eq!(raw.map.lanes.len(), merged.map.lanes.len());
    assert!(raw.map.points.len() >= merged.map.points.len());
    Ok(())
}

#[test]
fn geometry_errors_abort_the_run() -> anyhow::Result<()> {
    let mut records = load_network(NETWORK)?;
    records.extend(load_network(
        r#"{"broken": {"type": "BendRoad", "x": 0.0, "y": 0.0, "heading": 0.0,
            "radius": 0.0, "angle": 1.0, "lane_count": 1, "lane_width": 3.0}}"#,
    )?);
    match convert(&records, &ConversionConfig::default()) {
        Err(Error::NetworkError(network::Error::Road(road::Error::GeometryError {
            road, ..
        }))) => assert_eq!(road, "broken"),
        other => panic!("expected a geometry error, got {:?}", other.map(|_| ())),
    }
    Ok(())
}

#[test]
fn output_survives_a_dump() -> anyhow::Result<()> {
    let output = convert(&load_network(NETWORK)?, &ConversionConfig::default())?;
    let loaded = Output::load(&output.dump()?)?;
    assert_eq!(loaded.map.lanes.len(), output.map.lanes.len());
    assert_eq!(loaded.map.points.len(), output.map.points.len());
    for (loaded, original) in loaded.map.lanes.values().zip(output.map.lanes.values()) {
        assert_eq!(loaded.before, original.before);
        assert_eq!(loaded.after, original.after);
        assert_eq!(loaded.junction, original.junction);
    }
    assert_eq!(loaded.stop_lines.len(), 1);
    Ok(())
}

#[test]
fn zero_ids_are_rejected_on_load() -> anyhow::Result<()> {
    let output = convert(&load_network(NETWORK)?, &ConversionConfig::default())?;
    let mut dumped: serde_json::Value = serde_json::from_str(&output.dump()?)?;
    dumped["map"]["lanes"][0]["start_node"] = serde_json::json!(0);
    match Output::load(&dumped.to_string()) {
        Err(Error::JsonError(error)) => assert!(error.to_string().contains("1-based")),
        other => panic!("expected a JSON error, got {:?}", other.map(|_| ())),
    }

    // a link of 0 is just no link
    dumped["map"]["lanes"][0]["start_node"] = serde_json::json!(1);
    dumped["map"]["lanes"][0]["before"] = serde_json::json!(0);
    let loaded = Output::load(&dumped.to_string())?;
    assert_eq!(loaded.map.lanes[LaneId::from_index(1)].before, None);
    Ok(())
}
