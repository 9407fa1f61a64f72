use std::collections::BTreeSet;

use log::{debug, info};
use road::RoadHandle;

use crate::error::{Error, Side};
use crate::network::RoadNetwork;

/// One step of a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathItem {
    Road(RoadHandle),
    /// The exit of a roundabout through which the path entered it.
    Exit(RoadHandle, usize),
}

/**
 * Lazy walk along `next` links, starting from one road.
 *
 * The walk ends at a dead end, at a road it already yielded, just before a
 * crossing, or just after the matching exit of a roundabout. Roads that point
 * back at the road before them are turned as the walk reaches them, so a
 * finished walk leaves its chain consistently oriented.
 */
pub struct Path<'a> {
    network: &'a mut RoadNetwork,
    start: RoadHandle,
    current: Option<RoadHandle>,
    visited: BTreeSet<RoadHandle>,
    done: bool,
}

impl<'a> Path<'a> {
    fn step(&mut self) -> Result<Option<PathItem>, Error> {
        let current = match self.current {
            Some(current) => current,
            None => {
                // a walk can't start inside a junction
                if self.network.require(self.start)?.kind.is_junction() {
                    return Ok(None);
                }
                self.visited.insert(self.start);
                self.current = Some(self.start);
                return Ok(Some(PathItem::Road(self.start)));
            }
        };

        let next = match self.network.require(current)?.next() {
            Some(next) => next,
            None => return Ok(None),
        };
        let next_road = self.network.require(next)?;

        if next_road.kind.is_crossing() {
            return Ok(None);
        }
        if next_road.kind.is_roundabout() {
            return self.entry_exit(current, next).map(Some);
        }
        if self.visited.contains(&next) {
            return Ok(None);
        }

        if next_road.next() == Some(current) {
            let next_road = self.network.require_mut(next)?;
            next_road.turn_road();
            debug!("turned road {}", next_road.id);
        }
        self.visited.insert(next);
        self.current = Some(next);
        Ok(Some(PathItem::Road(next)))
    }

    /// The exit of `roundabout` that the end of `current` is attached to.
    fn entry_exit(
        &self,
        current: RoadHandle,
        roundabout: RoadHandle,
    ) -> Result<PathItem, Error> {
        use cgmath::MetricSpace;

        let road = self.network.require(current)?;
        let ring = self.network.require(roundabout)?;
        let arrival = road.end();

        // a road can hold two exits of the same roundabout, one per end
        let mut exits: Vec<(f64, usize)> = ring
            .exits()
            .iter()
            .filter(|exit| exit.next() == Some(current))
            .map(|exit| (exit.end.distance(arrival), exit.index))
            .collect();
        exits.sort_by(|a, b| a.0.total_cmp(&b.0));

        match exits.as_slice() {
            [] => Err(Error::unresolved(format!(
                "roundabout {} has no exit towards road {}",
                ring.id, road.id
            ))),
            [(_, index)] => Ok(PathItem::Exit(roundabout, *index)),
            [(nearest, index), (second, _), ..] if nearest < second => {
                Ok(PathItem::Exit(roundabout, *index))
            }
            _ => Err(Error::AmbiguousConnectivity {
                road: road.id.clone(),
                side: Side::End,
            }),
        }
    }
}

impl<'a> Iterator for Path<'a> {
    type Item = Result<PathItem, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.step().transpose();
        if !matches!(item, Some(Ok(PathItem::Road(_)))) {
            self.done = true;
        }
        item
    }
}

impl RoadNetwork {
    /// Walks the chain starting at the road called `from_id`; see [`Path`].
    pub fn path(&mut self, from_id: &str) -> Result<Path<'_>, Error> {
        let start = self
            .handle(from_id)
            .ok_or_else(|| Error::unresolved(format!("no road called {}", from_id)))?;
        Ok(self.path_from(start))
    }

    pub fn path_from(&mut self, start: RoadHandle) -> Path<'_> {
        Path {
            network: self,
            start,
            current: None,
            visited: BTreeSet::new(),
            done: false,
        }
    }

    /// Follows `previous` links back to the first road of the chain, turning
    /// predecessors that point back along the way.
    fn chain_head(&mut self, handle: RoadHandle) -> Result<RoadHandle, Error> {
        let mut current = handle;
        let mut seen = BTreeSet::new();
        seen.insert(current);

        loop {
            let previous = match self.require(current)?.previous() {
                Some(previous) => previous,
                None => return Ok(current),
            };
            let previous_road = self.require(previous)?;
            if previous_road.kind.is_junction() || seen.contains(&previous) {
                return Ok(current);
            }
            if previous_road.previous() == Some(current) {
                let previous_road = self.require_mut(previous)?;
                previous_road.turn_road();
                debug!("turned road {}", previous_road.id);
            }
            seen.insert(previous);
            current = previous;
        }
    }

    /**
     * Orients every chain of plain roads so that `next` always points along
     * the chain. Must run after `resolve`.
     *
     * Returns the number of roads that ended up turned.
     */
    pub fn orient(&mut self) -> Result<usize, Error> {
        let before: Vec<(RoadHandle, bool)> = self
            .roads()
            .map(|road| (road.handle, road.is_turned()))
            .collect();

        let mut visited = BTreeSet::new();
        for (handle, _) in before.iter() {
            if visited.contains(handle) || self.require(*handle)?.kind.is_junction() {
                continue;
            }
            let head = self.chain_head(*handle)?;
            for item in self.path_from(head) {
                if let PathItem::Road(handle) = item? {
                    visited.insert(handle);
                }
            }
        }

        let mut turned = 0;
        for (handle, was_turned) in before {
            if self.require(handle)?.is_turned() != was_turned {
                turned += 1;
            }
        }
        info!("oriented {} roads, {} of them turned", visited.len(), turned);
        Ok(turned)
    }
}

#[cfg(test)]
mod path_tests {
    use crate::*;
    use geometry::UniformSampler;
    use road::{BuildContext, LaneSpec, RoadRecord, SpeedSpec, StraightRoad};

    fn straight(x: f64, heading: f64) -> RoadRecord {
        RoadRecord::StraightRoad(StraightRoad {
            x,
            y: 0.0,
            heading,
            length: 10.0,
            lanes: LaneSpec {
                lane_count: 2,
                lane_width: 3.0,
                forward_lanes: None,
            },
            speed: SpeedSpec::default(),
            stop_line: false,
        })
    }

    fn resolved(records: Vec<(&str, RoadRecord)>) -> RoadNetwork {
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
        let mut network = RoadNetwork::build(&records, &context).unwrap();
        network.resolve(1.0).unwrap();
        network
    }

    fn ids(network: &mut RoadNetwork, from: &str) -> Vec<String> {
        let handles: Vec<PathItem> = network
            .path(from)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        handles
            .into_iter()
            .map(|item| match item {
                PathItem::Road(handle) | PathItem::Exit(handle, _) => {
                    network.road(handle).unwrap().id.clone()
                }
            })
            .collect()
    }

    #[test]
    fn back_link_is_turned_once() {
        use std::f64::consts::PI;

        // b runs from x = 20 back to x = 10
        let mut network = resolved(vec![("a", straight(0.0, 0.0)), ("b", straight(20.0, PI))]);
        let a = network.handle("a").unwrap();
        let b = network.handle("b").unwrap();
        assert_eq!(network.road(b).unwrap().next(), Some(a));

        assert_eq!(ids(&mut network, "a"), vec!["a", "b"]);
        let road = network.road(b).unwrap();
        assert!(road.is_turned());
        assert_eq!(road.previous(), Some(a));
        assert_eq!(road.next(), None);

        assert_eq!(ids(&mut network, "a"), vec!["a", "b"]);
        assert!(network.road(b).unwrap().is_turned());
        assert!(network.validate().is_ok());
    }

    #[test]
    fn loop_terminates() {
        use std::f64::consts::FRAC_PI_2;

        let square = |x: f64, y: f64, heading: f64| {
            RoadRecord::StraightRoad(StraightRoad {
                x,
                y,
                heading,
                length: 10.0,
                lanes: LaneSpec {
                    lane_count: 1,
                    lane_width: 3.0,
                    forward_lanes: None,
                },
                speed: SpeedSpec::default(),
                stop_line: false,
            })
        };
        let mut network = resolved(vec![
            ("a", square(0.0, 0.0, 0.0)),
            ("b", square(10.0, 0.0, FRAC_PI_2)),
            ("c", square(10.0, 10.0, 2.0 * FRAC_PI_2)),
            ("d", square(0.0, 10.0, 3.0 * FRAC_PI_2)),
        ]);
        assert_eq!(ids(&mut network, "c"), vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn unknown_road() {
        let mut network = resolved(vec![("a", straight(0.0, 0.0))]);
        assert!(matches!(
            network.path("nope"),
            Err(Error::UnresolvedConnectivity { .. })
        ));
    }

    #[test]
    fn orient_chain() {
        use std::f64::consts::PI;

        let mut network = resolved(vec![
            ("a", straight(0.0, 0.0)),
            ("b", straight(20.0, PI)),
            ("c", straight(20.0, 0.0)),
        ]);
        assert_eq!(network.orient().unwrap(), 1);

        let a = network.handle("a").unwrap();
        let b = network.handle("b").unwrap();
        let c = network.handle("c").unwrap();
        assert_eq!(network.road(a).unwrap().next(), Some(b));
        assert_eq!(network.road(b).unwrap().next(), Some(c));
        assert_eq!(network.road(c).unwrap().previous(), Some(b));
        assert!(network.validate().is_ok());

        assert_eq!(network.orient().unwrap(), 0);
    }
}
