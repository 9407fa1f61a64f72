use std::collections::BTreeMap;

use geometry::UniformSampler;
use lanes::StopLine;
use log::info;
use network::RoadNetwork;
use road::{BuildContext, RoadRecord};
use serde::{Deserialize, Serialize};
use vector_map::VectorMap;

use crate::config::{self, ConversionConfig};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] config::Error),
    #[error("Road error: {0}")]
    RoadError(#[from] road::Error),
    #[error("Network error: {0}")]
    NetworkError(#[from] network::Error),
    #[error("Lane error: {0}")]
    LaneError(#[from] lanes::Error),
    #[error("Vector map error: {0}")]
    MapError(#[from] vector_map::Error),
}

/// Everything one conversion run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub map: VectorMap,
    pub stop_lines: Vec<StopLine>,
}

impl Output {
    pub fn load(data: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn load_file(path: &std::path::Path) -> Result<Self, Error> {
        Self::load(&std::fs::read_to_string(path)?)
    }

    pub fn dump(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn dump_file(&self, path: &std::path::Path) -> Result<(), Error> {
        Ok(std::fs::write(path, self.dump()?)?)
    }
}

/// Parses a road network description: a JSON object from road id to road record.
pub fn load_network(data: &str) -> Result<BTreeMap<String, RoadRecord>, Error> {
    Ok(serde_json::from_str(data)?)
}

pub fn load_network_file(path: &std::path::Path) -> Result<BTreeMap<String, RoadRecord>, Error> {
    load_network(&std::fs::read_to_string(path)?)
}

/**
 * Converts a road network description into a vector map.
 *
 * Roads are built and linked by their end points, chains are oriented, and
 * the lanes and lines of every road are appended to a fresh map. Unless the
 * config turns it off, near-duplicate points are merged and lanes re-chained
 * afterwards. Any error aborts the whole run.
 */
pub fn convert(
    records: &BTreeMap<String, RoadRecord>,
    config: &ConversionConfig,
) -> Result<Output, Error> {
    config.validate()?;
    info!("converting {} roads", records.len());

    let sampler = UniformSampler::new(config.sample_step);
    let context = BuildContext {
        sampler: &sampler,
        default_speed_limit: config.default_speed_limit,
        default_ref_speed: config.default_ref_speed,
    };
    let mut network = RoadNetwork::build(records, &context)?;
    network.resolve(config.proximity_tolerance)?;

    let assembly = lanes::assemble(&mut network)?;
    network.validate()?;

    let mut map = VectorMap::new(config.map_settings());
    assembly.append_to(&mut map)?;
    if config.run_merge_pass {
        map.finalize()?;
    }

    info!(
        "converted {} roads into {} lanes and {} stop lines",
        network.len(),
        map.lanes.len(),
        assembly.stop_lines.len()
    );
    Ok(Output {
        map,
        stop_lines: assembly.stop_lines,
    })
}

#[cfg(test)]
mod converter_tests {
    use crate::*;

    #[test]
    fn unknown_road_type() {
        let result = load_network(r#"{"r": {"type": "Tunnel", "x": 0.0, "y": 0.0}}"#);
        assert!(matches!(result, Err(Error::JsonError(_))));
    }

    #[test]
    fn empty_network() {
        let output = convert(&Default::default(), &ConversionConfig::default()).unwrap();
        assert!(output.map.lanes.is_empty());
        assert!(output.stop_lines.is_empty());
    }

    #[test]
    fn invalid_config() {
        let config = ConversionConfig {
            sample_step: -1.0,
            ..ConversionConfig::default()
        };
        assert!(matches!(
            convert(&Default::default(), &config),
            Err(Error::ConfigError(_))
        ));
    }
}
