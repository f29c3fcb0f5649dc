pub mod conflicts;
pub mod timeline;

pub use conflicts::{ItemSpan, detect_conflicts};
pub use timeline::{
    HORIZON_DAYS, TimelineCalculator, compute_timelines, compute_timelines_default,
};
