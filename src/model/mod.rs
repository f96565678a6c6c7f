pub use interval::{merge, total_length, Interval, InvalidInterval};
pub use progress::*;
pub use timestamp::*;
pub use video::*;

pub mod interval;

mod progress;
mod timestamp;
mod video;
