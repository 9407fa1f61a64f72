use derive_more::Constructor;
use float_cmp::assert_approx_eq;
use geometry::{Coord, GeometrySampler, Offset, Shape, UniformSampler};
use vector_map::{LaneAttributes, MapSettings, VectorMap};

#[derive(Constructor)]
struct Case {
    name: &'static str,
    shape: Shape,
    closed_loop: bool,
}

fn cases() -> Vec<Case> {
    vec![
        Case::new(
            "line",
            Shape::Line {
                start: Coord::new(3.0, -2.0),
                heading: 0.4,
                length: 17.5,
            },
            false,
        ),
        Case::new(
            "arc",
            Shape::Arc {
                start: Coord::new(0.0, 0.0),
                heading: 0.0,
                radius: 12.0,
                angle: -1.2,
            },
            false,
        ),
        Case::new(
            "bezier",
            Shape::Bezier {
                p0: Coord::new(0.0, 0.0),
                p1: Coord::new(8.0, 0.0),
                p2: Coord::new(8.0, 8.0),
                p3: Coord::new(16.0, 8.0),
            },
            false,
        ),
        Case::new(
            "ring",
            Shape::Circle {
                center: Coord::new(50.0, 50.0),
                radius: 9.0,
                start_angle: 0.3,
            },
            true,
        ),
    ]
}

fn attributes() -> LaneAttributes {
    LaneAttributes {
        speed_limit: 50.0,
        ref_speed: 45.0,
        ..LaneAttributes::default()
    }
}

#[test]
fn dtlane_distance_matches_arc_length() -> anyhow::Result<()> {
    use cgmath::MetricSpace;
    use itertools::Itertools;

    let sampler = UniformSampler::new(0.5);
    for case in cases() {
        let mut map = VectorMap::new(MapSettings::default());
        let polyline = sampler.polyline(&case.shape, Offset::constant(1.5));
        map.append_lane(&polyline, attributes(), case.closed_loop)?;

        let length: f64 = polyline
            .iter()
            .tuple_windows()
            .map(|(a, b)| a.distance(*b))
            .sum();
        let distances: Vec<f64> = map.dtlanes.values().map(|dtlane| dtlane.distance).collect();
        assert_eq!(distances.len(), polyline.len() - 1, "{}", case.name);
        assert!(
            distances.iter().tuple_windows().all(|(a, b)| b > a),
            "{}: distances must increase",
            case.name
        );
        assert_approx_eq!(f64, *distances.last().unwrap(), length, epsilon = 1e-9);

        let spans: f64 = map.lanes.values().map(|lane| lane.span).sum();
        assert_approx_eq!(f64, spans, length, epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn ring_closes_on_itself() -> anyhow::Result<()> {
    let sampler = UniformSampler::default();
    let ring = cases().into_iter().find(|case| case.closed_loop).unwrap();
    let polyline = sampler.polyline(&ring.shape, Offset::default());

    let mut map = VectorMap::new(MapSettings::default());
    let range = map.append_lane(&polyline, attributes(), true)?;
    let (first, last) = (*range.start(), *range.end());

    assert_eq!(map.lanes[first].before, Some(last));
    assert_eq!(map.lanes[last].after, Some(first));
    assert!(map
        .lanes
        .values()
        .all(|lane| lane.before.is_some() && lane.after.is_some()));
    // one node per distinct point of the ring
    assert_eq!(map.nodes.len(), polyline.len() - 1);

    map.finalize()?;
    assert_eq!(map.lanes[first].before, Some(last));
    assert_eq!(map.lanes[last].after, Some(first));
    Ok(())
}

#[test]
fn serialized_links_use_zero_for_none() -> anyhow::Result<()> {
    let mut map = VectorMap::new(MapSettings::default());
    map.append_lane(&[Coord::new(0.0, 0.0), Coord::new(1.0, 0.0)], attributes(), false)?;
    let json = serde_json::to_value(&map.lanes)?;
    assert_eq!(json[0]["before"], 0);
    assert_eq!(json[0]["after"], 0);
    assert_eq!(json[0]["dtlane"], 1);
    Ok(())
}
