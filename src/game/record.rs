use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown color `{0}` (expected white or black)")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            _ => Err(ParseColorError(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Draw,
    Loss,
    #[default]
    Unknown,
}

/// One finished game from the player's point of view.
///
/// Only `date` and `rating` feed the analytics engine; the remaining fields
/// are carried for filtering and outcome statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub date: DateTime<Utc>,
    /// Post-game rating. Missing or non-positive ratings are ignored by the engine.
    #[serde(default)]
    pub rating: Option<i32>,
    pub control: String,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub outcome: Outcome,
    #[serde(default)]
    pub opponent: String,
    #[serde(default)]
    pub opponent_rating: Option<i32>,
    #[serde(default)]
    pub url: Option<String>,
}

impl GameRecord {
    pub fn new(date: DateTime<Utc>, rating: Option<i32>, control: &str) -> Self {
        Self {
            date,
            rating,
            control: control.to_string(),
            color: None,
            outcome: Outcome::Unknown,
            opponent: String::new(),
            opponent_rating: None,
            url: None,
        }
    }

    /// The rating if it is usable for analytics (present and positive).
    pub fn valid_rating(&self) -> Option<i32> {
        self.rating.filter(|&r| r > 0)
    }
}

/// Group records by time control, keeping each control's records in input order.
pub fn group_by_control(records: &[GameRecord]) -> BTreeMap<String, Vec<GameRecord>> {
    let mut by_control: BTreeMap<String, Vec<GameRecord>> = BTreeMap::new();
    for record in records {
        by_control
            .entry(record.control.clone())
            .or_default()
            .push(record.clone());
    }
    by_control
}
