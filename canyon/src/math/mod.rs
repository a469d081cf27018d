mod chainage;
mod law_of_cosines;

pub(crate) use chainage::{direction_at, point_at};
pub use law_of_cosines::law_of_cosines_angle;
