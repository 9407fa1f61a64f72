use serde::{Deserialize, Serialize};

/// Radius written to lane descriptors of straight lanes.
pub const STRAIGHT_RADIUS: f64 = 90000000000.0;

/// Constant attributes stamped on the records of one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    pub ref_frame: u32,
    pub mesh_code: u32,
    pub dtlane_left_width: f64,
    pub dtlane_right_width: f64,
    pub white_line_width: f64,
    pub white_line_color: char,
    /// Points closer than this are merged by `merge_redundant_points`.
    pub merge_epsilon: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            ref_frame: 7,
            mesh_code: 0,
            dtlane_left_width: 1.75,
            dtlane_right_width: 1.75,
            white_line_width: 0.15,
            white_line_color: 'W',
            merge_epsilon: 1e-3,
        }
    }
}
