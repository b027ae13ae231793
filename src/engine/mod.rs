pub mod forecast;
pub mod milestones;
pub mod outcome;
pub mod params;
pub mod regression;
pub mod series;
pub mod smoothing;
pub mod timeline;
pub mod trend;

pub use params::EngineParams;
pub use timeline::{TimelineBoth, TimelineResult, compute_timeline, rating_timeline_both};

pub(crate) const MS_PER_DAY: f64 = 86_400_000.0;
