use vector_map::MapSettings;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error parsing TOML: {0}")]
    TomlParsingError(#[from] toml::de::Error),
    #[error("Error serializing TOML: {0}")]
    TomlSerializingError(#[from] toml::ser::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid value {value} for {name}")]
    InvalidValue { name: &'static str, value: f64 },
}

/// Settings of one conversion run. Missing keys take their default.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /** Road ends closer than this (in meters) are linked. */
    pub proximity_tolerance: f64,
    /** Target distance between consecutive sampled points. */
    pub sample_step: f64,
    /** Points closer than this are merged after the map is built. */
    pub merge_epsilon: f64,
    pub default_speed_limit: f64,
    pub default_ref_speed: f64,
    pub ref_frame: u32,
    pub mesh_code: u32,
    pub dtlane_left_width: f64,
    pub dtlane_right_width: f64,
    pub white_line_width: f64,
    pub white_line_color: char,
    /** Whether to merge near-duplicate points and re-chain lanes at the end. */
    pub run_merge_pass: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            proximity_tolerance: 1.0,
            sample_step: 1.0,
            merge_epsilon: 1e-3,
            default_speed_limit: 40.0,
            default_ref_speed: 40.0,
            ref_frame: 7,
            mesh_code: 0,
            dtlane_left_width: 1.75,
            dtlane_right_width: 1.75,
            white_line_width: 0.15,
            white_line_color: 'W',
            run_merge_pass: true,
        }
    }
}

impl ConversionConfig {
    pub fn load(data: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_file(path: &std::path::Path) -> Result<Self, Error> {
        Self::load(&std::fs::read_to_string(path)?)
    }

    pub fn dump(&self) -> Result<String, Error> {
        Ok(toml::to_string(self)?)
    }

    pub fn dump_file(&self, path: &std::path::Path) -> Result<(), Error> {
        Ok(std::fs::write(path, self.dump()?)?)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let positive = [
            ("proximity_tolerance", self.proximity_tolerance),
            ("sample_step", self.sample_step),
            ("merge_epsilon", self.merge_epsilon),
            ("default_speed_limit", self.default_speed_limit),
            ("default_ref_speed", self.default_ref_speed),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidValue { name, value });
            }
        }
        Ok(())
    }

    /**
     * The attributes stamped on every vector map record.
     */
    pub fn map_settings(&self) -> MapSettings {
        MapSettings {
            ref_frame: self.ref_frame,
            mesh_code: self.mesh_code,
            dtlane_left_width: self.dtlane_left_width,
            dtlane_right_width: self.dtlane_right_width,
            white_line_width: self.white_line_width,
            white_line_color: self.white_line_color,
            merge_epsilon: self.merge_epsilon,
        }
    }
}
