pub mod buffer;
pub mod chunk;
pub mod report;
pub mod segment;
pub mod video;

pub use buffer::*;
pub use chunk::*;
pub use report::*;
pub use segment::*;
pub use video::*;
