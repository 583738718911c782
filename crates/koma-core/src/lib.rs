pub mod geometry;
pub mod id;
pub mod model;
pub mod serialize;

pub use geometry::{Point, Rect, ViewTransform};
pub use id::ElementId;
pub use model::*;
pub use serialize::{FORMAT_VERSION, SerializedState, StageSettings, serialize_page};
