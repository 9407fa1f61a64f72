mod error;
mod junction;
mod layout;
mod record;
mod road;

pub use error::Error;
pub use junction::{Approach, ExitLane};
pub use layout::{LaneLayout, LanePolyline, LaneRole, TravelDirection};
pub use record::{
    AdapterRoad, BendRoad, CurvedRoad, EntryRoad, ExitRoad, LaneSpec, LocalPoint, RoadRecord,
    RoadShape, Roundabout, SpeedSpec, StraightRoad, XCrossing, YCrossing,
};
pub use road::{BuildContext, Geometry, Road, RoadHandle, RoadKind};
