pub mod fragment;
pub mod stats;

pub use fragment::{to_fragments, Detection, EngineOutput, Fragment};
pub use stats::median_or;
