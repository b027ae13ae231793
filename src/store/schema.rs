use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::outcome::OutcomeBreakdown;
use crate::engine::timeline::TimelineBoth;
use crate::game::normalize::Archive;
use crate::game::record::GameRecord;

pub const REPORT_VERSION: u32 = 1;

/// Accepted input files: already-normalized records, or a raw archive that
/// still has to be attributed to a user.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameInput {
    Records(Vec<GameRecord>),
    Archive(Archive),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportData {
    pub report_version: u32,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<String>,
    /// Controls included in the timeline, in output order.
    pub controls: Vec<String>,
    pub outcomes: OutcomeBreakdown,
    pub timeline: TimelineBoth,
}

impl ReportData {
    pub fn new(user: Option<String>, outcomes: OutcomeBreakdown, timeline: TimelineBoth) -> Self {
        Self {
            report_version: REPORT_VERSION,
            generated_at: Utc::now(),
            user,
            controls: timeline.normal.series.keys().cloned().collect(),
            outcomes,
            timeline,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.report_version == REPORT_VERSION
    }
}
