use geometry::Coord;
use log::{debug, info};
use road::RoadHandle;

use crate::error::{Error, Side};
use crate::network::RoadNetwork;

/// Something that can hold a link: a plain road, or a junction's sub-segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Road(RoadHandle),
    Exit(RoadHandle, usize),
    Approach(RoadHandle, usize),
}

impl Owner {
    /// Handle other roads store when they link to this owner.
    fn handle(self) -> RoadHandle {
        match self {
            Owner::Road(handle) | Owner::Exit(handle, _) | Owner::Approach(handle, _) => handle,
        }
    }
}

/// Linkable end points of one owner. Sub-segments only link at their outer end.
#[derive(Debug, Clone, Copy)]
struct Endpoint {
    owner: Owner,
    start: Option<Coord>,
    end: Coord,
}

impl Endpoint {
    fn point(&self, side: Side) -> Option<Coord> {
        match side {
            Side::Start => self.start,
            Side::End => Some(self.end),
        }
    }
}

const COMBINATIONS: [(Side, Side); 4] = [
    (Side::Start, Side::Start),
    (Side::Start, Side::End),
    (Side::End, Side::Start),
    (Side::End, Side::End),
];

impl RoadNetwork {
    fn endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints = Vec::new();
        for road in self.roads() {
            if road.kind.is_junction() {
                for exit in road.exits() {
                    endpoints.push(Endpoint {
                        owner: Owner::Exit(road.handle, exit.index),
                        start: None,
                        end: exit.end,
                    });
                }
                for approach in road.approaches() {
                    endpoints.push(Endpoint {
                        owner: Owner::Approach(road.handle, approach.index),
                        start: None,
                        end: approach.end,
                    });
                }
            } else {
                endpoints.push(Endpoint {
                    owner: Owner::Road(road.handle),
                    start: Some(road.start()),
                    end: road.end(),
                });
            }
        }
        endpoints
    }

    fn describe(&self, owner: Owner) -> String {
        let id = self
            .road(owner.handle())
            .map(|road| road.id.clone())
            .unwrap_or_else(|| owner.handle().to_string());
        match owner {
            Owner::Road(_) => id,
            Owner::Exit(_, index) => format!("{} exit {}", id, index),
            Owner::Approach(_, index) => format!("{} approach {}", id, index),
        }
    }

    fn link(&mut self, owner: Owner, side: Side, target: RoadHandle) -> Result<(), Error> {
        let road = self.require(owner.handle())?;
        let current = match (owner, side) {
            (Owner::Road(_), Side::Start) => road.previous(),
            (Owner::Road(_), Side::End) => road.next(),
            (Owner::Exit(_, index), _) => road.exits()[index].next(),
            (Owner::Approach(_, index), _) => road.approaches()[index].next(),
        };
        if matches!(current, Some(current) if current != target) {
            return Err(Error::AmbiguousConnectivity {
                road: self.describe(owner),
                side,
            });
        }

        let road = self.require_mut(owner.handle())?;
        match (owner, side) {
            (Owner::Road(_), Side::Start) => road.set_previous(Some(target)),
            (Owner::Road(_), Side::End) => road.set_next(Some(target)),
            (Owner::Exit(_, index), _) => road.exits_mut()[index].set_next(Some(target)),
            (Owner::Approach(_, index), _) => {
                road.approaches_mut()[index].set_next(Some(target))
            }
        }
        Ok(())
    }

    fn clear_links(&mut self) {
        for road in self.roads.inner.values_mut() {
            road.set_next(None);
            road.set_previous(None);
            for exit in road.exits_mut() {
                exit.set_next(None);
            }
            for approach in road.approaches_mut() {
                approach.set_next(None);
            }
        }
    }

    /**
     * Links every pair of roads whose end points lie within `tolerance` of
     * each other, replacing any links set before.
     *
     * Of the four end point combinations of a pair, the first one in the order
     * start-start, start-end, end-start, end-end decides which sides get linked.
     * A side that would be linked to two different roads is an error. Junctions
     * link through their exits and approaches only; a road linked to one of
     * those stores the junction's handle.
     *
     * Returns the number of links made.
     */
    pub fn resolve(&mut self, tolerance: f64) -> Result<usize, Error> {
        use cgmath::MetricSpace;
        use itertools::Itertools;

        self.clear_links();
        let endpoints = self.endpoints();

        let mut links = 0;
        for (a, b) in endpoints.iter().tuple_combinations() {
            if a.owner.handle() == b.owner.handle() {
                continue;
            }
            let hit = COMBINATIONS.iter().find(|(side_a, side_b)| {
                match (a.point(*side_a), b.point(*side_b)) {
                    (Some(p), Some(q)) => p.distance(q) <= tolerance,
                    _ => false,
                }
            });
            if let Some((side_a, side_b)) = hit {
                self.link(a.owner, *side_a, b.owner.handle())?;
                self.link(b.owner, *side_b, a.owner.handle())?;
                debug!(
                    "linked the {} of {} to the {} of {}",
                    side_a,
                    self.describe(a.owner),
                    side_b,
                    self.describe(b.owner)
                );
                links += 1;
            }
        }

        info!("resolved {} links between {} roads", links, self.len());
        Ok(links)
    }
}

#[cfg(test)]
mod resolve_tests {
    use crate::*;
    use geometry::UniformSampler;
    use road::{BuildContext, LaneSpec, RoadRecord, SpeedSpec, StraightRoad};

    fn straight(x: f64, y: f64, heading: f64) -> RoadRecord {
        RoadRecord::StraightRoad(StraightRoad {
            x,
            y,
            heading,
            length: 20.0,
            lanes: LaneSpec {
                lane_count: 1,
                lane_width: 3.0,
                forward_lanes: None,
            },
            speed: SpeedSpec::default(),
            stop_line: false,
        })
    }

    fn network(records: Vec<(&str, RoadRecord)>) -> RoadNetwork {
        let sampler = UniformSampler::default();
        let context = BuildContext {
            sampler: &sampler,
            default_speed_limit: 40.0,
            default_ref_speed: 40.0,
        };
        let records = records
            .into_iter()
            .map(|(id, record)| (id.to_owned(), record))
            .collect();
        RoadNetwork::build(&records, &context).unwrap()
    }

    #[test]
    fn end_to_start() {
        let mut network = network(vec![
            ("a", straight(0.0, 0.0, 0.0)),
            ("b", straight(20.5, 0.0, 0.0)),
        ]);
        assert_eq!(network.resolve(1.0).unwrap(), 1);
        let a = network.handle("a").unwrap();
        let b = network.handle("b").unwrap();
        assert_eq!(network.road(a).unwrap().next(), Some(b));
        assert_eq!(network.road(a).unwrap().previous(), None);
        assert_eq!(network.road(b).unwrap().previous(), Some(a));
        assert!(network.validate().is_ok());
    }

    #[test]
    fn out_of_tolerance() {
        let mut network = network(vec![
            ("a", straight(0.0, 0.0, 0.0)),
            ("b", straight(21.5, 0.0, 0.0)),
        ]);
        assert_eq!(network.resolve(1.0).unwrap(), 0);
    }

    #[test]
    fn start_to_start() {
        use std::f64::consts::PI;

        // both roads point away from the origin
        let mut network = network(vec![
            ("a", straight(0.0, 0.0, 0.0)),
            ("b", straight(0.0, 0.0, PI)),
        ]);
        network.resolve(1.0).unwrap();
        let a = network.handle("a").unwrap();
        let b = network.handle("b").unwrap();
        assert_eq!(network.road(a).unwrap().previous(), Some(b));
        assert_eq!(network.road(b).unwrap().previous(), Some(a));
        assert_eq!(network.road(a).unwrap().next(), None);
        assert!(network.validate().is_ok());
    }

    #[test]
    fn three_roads_meeting() {
        use std::f64::consts::FRAC_PI_2;

        let mut network = network(vec![
            ("a", straight(0.0, 0.0, 0.0)),
            ("b", straight(20.0, 0.0, 0.0)),
            ("c", straight(20.0, 0.0, FRAC_PI_2)),
        ]);
        assert_eq!(
            network.resolve(1.0),
            Err(Error::AmbiguousConnectivity {
                road: "a".to_owned(),
                side: Side::End,
            })
        );
    }

    #[test]
    fn resolving_twice_gives_the_same_links() {
        let mut network = network(vec![
            ("a", straight(0.0, 0.0, 0.0)),
            ("b", straight(20.0, 0.0, 0.0)),
        ]);
        network.resolve(1.0).unwrap();
        let first: Vec<_> = network.roads().map(|road| (road.previous(), road.next())).collect();
        network.resolve(1.0).unwrap();
        let second: Vec<_> = network.roads().map(|road| (road.previous(), road.next())).collect();
        assert_eq!(first, second);
    }
}
