use std::collections::BTreeMap;

use log::{info, warn};
use road::{BuildContext, Road, RoadHandle, RoadRecord};
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub(crate) trait Handle: Copy + std::cmp::Ord + std::hash::Hash + Eq {
    fn create(id: u64) -> Self;
}

impl Handle for RoadHandle {
    fn create(id: u64) -> Self {
        RoadHandle::new(id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ManagedMap<K: Handle, V> {
    pub(crate) inner: BTreeMap<K, V>,
    counter: u64,
}

impl<K: Handle, V> ManagedMap<K, V> {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
            counter: 0,
        }
    }

    /// Like `add`, but the value may fail to build; the handle is only used up on success.
    pub fn try_add<F, E>(&mut self, value_f: F) -> Result<K, E>
    where
        F: FnOnce(K) -> Result<V, E>,
    {
        let id = Handle::create(self.counter);
        let value = value_f(id)?;
        self.counter += 1;
        self.inner.insert(id, value);
        Ok(id)
    }

    pub fn get(&self, id: K) -> Option<&V> {
        self.inner.get(&id)
    }

    pub fn get_mut(&mut self, id: K) -> Option<&mut V> {
        self.inner.get_mut(&id)
    }
}

/**
 * Arena of every road of one conversion run.
 *
 * Handles are handed out in insertion order, and `build` inserts in id
 * order, so iterating the arena is deterministic.
 */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadNetwork {
    pub(crate) roads: ManagedMap<RoadHandle, Road>,
    ids: BTreeMap<String, RoadHandle>,
}

impl Default for RoadNetwork {
    fn default() -> Self {
        Self {
            roads: ManagedMap::new(),
            ids: BTreeMap::new(),
        }
    }
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(
        records: &BTreeMap<String, RoadRecord>,
        context: &BuildContext,
    ) -> Result<Self, Error> {
        let mut network = Self::new();
        for (id, record) in records {
            network.add_road(id, record, context)?;
        }
        info!("built {} roads", network.len());
        Ok(network)
    }

    pub fn add_road(
        &mut self,
        id: &str,
        record: &RoadRecord,
        context: &BuildContext,
    ) -> Result<RoadHandle, Error> {
        if self.ids.contains_key(id) {
            return Err(Error::DuplicateRoad {
                road: id.to_owned(),
            });
        }
        let handle = self
            .roads
            .try_add(|handle| Road::new(handle, id, record, context))?;
        self.ids.insert(id.to_owned(), handle);
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.roads.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.inner.is_empty()
    }

    pub fn handle(&self, id: &str) -> Option<RoadHandle> {
        self.ids.get(id).copied()
    }

    pub fn road(&self, handle: RoadHandle) -> Option<&Road> {
        self.roads.get(handle)
    }

    pub fn road_mut(&mut self, handle: RoadHandle) -> Option<&mut Road> {
        self.roads.get_mut(handle)
    }

    pub fn road_by_id(&self, id: &str) -> Option<&Road> {
        self.handle(id).and_then(|handle| self.road(handle))
    }

    /// Roads in arena order.
    pub fn roads(&self) -> impl Iterator<Item = &Road> {
        self.roads.inner.values()
    }

    pub(crate) fn require(&self, handle: RoadHandle) -> Result<&Road, Error> {
        self.road(handle)
            .ok_or_else(|| Error::unresolved(format!("no road with handle {}", handle)))
    }

    pub(crate) fn require_mut(&mut self, handle: RoadHandle) -> Result<&mut Road, Error> {
        self.road_mut(handle)
            .ok_or_else(|| Error::unresolved(format!("no road with handle {}", handle)))
    }

    /// Whether `target` holds a link back to `from`, on any of its sides or sub-segments.
    fn links_back(target: &Road, from: RoadHandle) -> bool {
        if target.kind.is_junction() {
            target.exits().iter().any(|exit| exit.next() == Some(from))
                || target
                    .approaches()
                    .iter()
                    .any(|approach| approach.next() == Some(from))
        } else {
            target.next() == Some(from) || target.previous() == Some(from)
        }
    }

    /**
     * Validates the network.
     *
     * Specifically, makes sure that:
     *  - the arena and the id index agree on every road's handle and id
     *  - every link of a plain road points to an existing road which links back
     *  - every link of a roundabout exit or crossing approach does the same
     *
     * Every issue is logged; an error carrying the issue count is returned if
     * there was at least one.
     */
    pub fn validate(&self) -> Result<(), Error> {
        let mut issue_count = 0;

        for (handle, road) in self.roads.inner.iter() {
            if *handle != road.handle {
                warn!("mismatched handle, {} maps to road {}", handle, road.handle);
                issue_count += 1;
            }
        }
        for (id, handle) in self.ids.iter() {
            match self.road(*handle) {
                Some(road) if &road.id == id => {}
                Some(road) => {
                    warn!("id {} maps to road {} with id {}", id, handle, road.id);
                    issue_count += 1;
                }
                None => {
                    warn!("id {} maps to {}, but that road doesn't exist", id, handle);
                    issue_count += 1;
                }
            }
        }

        for road in self.roads() {
            let mut links = Vec::new();
            if road.kind.is_junction() {
                for exit in road.exits() {
                    links.push((format!("exit {}", exit.index), exit.next()));
                }
                for approach in road.approaches() {
                    links.push((format!("approach {}", approach.index), approach.next()));
                }
            } else {
                links.push(("previous link".to_owned(), road.previous()));
                links.push(("next link".to_owned(), road.next()));
            }

            for (name, link) in links {
                let target = match link {
                    Some(target) => target,
                    None => continue,
                };
                match self.road(target) {
                    Some(other) => {
                        if !Self::links_back(other, road.handle) {
                            warn!(
                                "{} of road {} points to {}, but that road doesn't agree",
                                name, road.id, other.id
                            );
                            issue_count += 1;
                        }
                    }
                    None => {
                        warn!(
                            "{} of road {} points to {}, but that road doesn't exist",
                            name, road.id, target
                        );
                        issue_count += 1;
                    }
                }
            }
        }

        if issue_count > 0 {
            Err(Error::Validation(issue_count))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod network_tests {
    use crate::*;
    use geometry::UniformSampler;
    use road::{BuildContext, LaneSpec, RoadRecord, SpeedSpec, StraightRoad};

    fn straight(x: f64, length: f64) -> RoadRecord {
        RoadRecord::StraightRoad(StraightRoad {
            x,
            y: 0.0,
            heading: 0.0,
            length,
            lanes: LaneSpec {
                lane_count: 2,
                lane_width: 3.5,
                forward_lanes: None,
            },
            speed: SpeedSpec::default(),
            stop_line: false,
        })
    }

    fn build(records: Vec<(&str, RoadRecord)>) -> Result<RoadNetwork, Error> {
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
        RoadNetwork::build(&records, &context)
    }

    #[test]
    fn handles_follow_id_order() {
        let network = build(vec![("b", straight(20.0, 20.0)), ("a", straight(0.0, 20.0))]).unwrap();
        assert_eq!(network.len(), 2);
        assert_eq!(network.handle("a").unwrap().inner(), 0);
        assert_eq!(network.handle("b").unwrap().inner(), 1);
        assert_eq!(network.road_by_id("b").unwrap().id, "b");
        assert!(network.validate().is_ok());
    }

    #[test]
    fn geometry_errors_name_the_road() {
        let result = build(vec![("broken", straight(0.0, 0.0))]);
        match result {
            Err(Error::Road(road::Error::GeometryError { road, .. })) => assert_eq!(road, "broken"),
            other => panic!("expected a geometry error, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_road() {
        let sampler = UniformSampler::default();
        let context = BuildContext {
            sampler: &sampler,
            default_speed_limit: 40.0,
            default_ref_speed: 40.0,
        };
        let mut network = RoadNetwork::new();
        network.add_road("a", &straight(0.0, 5.0), &context).unwrap();
        assert!(matches!(
            network.add_road("a", &straight(0.0, 5.0), &context),
            Err(Error::DuplicateRoad { .. })
        ));
        assert_eq!(network.len(), 1);
    }

    #[test]
    fn one_sided_link_is_reported() {
        let mut network = build(vec![("a", straight(0.0, 20.0)), ("b", straight(20.0, 20.0))]).unwrap();
        let b = network.handle("b").unwrap();
        let a = network.handle("a").unwrap();
        network.road_mut(a).unwrap().set_next(Some(b));
        assert_eq!(network.validate(), Err(Error::Validation(1)));
    }
}
