pub mod filter;
pub mod normalize;
pub mod record;

pub use record::{GameRecord, group_by_control};
