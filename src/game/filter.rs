use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::record::{Color, GameRecord, ParseColorError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFilter {
    #[default]
    All,
    White,
    Black,
}

impl ColorFilter {
    pub fn matches(self, color: Option<Color>) -> bool {
        match self {
            ColorFilter::All => true,
            ColorFilter::White => color == Some(Color::White),
            ColorFilter::Black => color == Some(Color::Black),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseFilterError {
    #[error("unknown color filter `{0}` (expected all, white or black)")]
    Color(String),
    #[error("unknown date range `{0}` (expected all, 1y, 6m or 3m)")]
    Range(String),
}

impl FromStr for ColorFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(ColorFilter::All);
        }
        match s.parse::<Color>() {
            Ok(Color::White) => Ok(ColorFilter::White),
            Ok(Color::Black) => Ok(ColorFilter::Black),
            Err(ParseColorError(raw)) => Err(ParseFilterError::Color(raw)),
        }
    }
}

/// How far back from "now" games are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    #[default]
    All,
    Year,
    SixMonths,
    ThreeMonths,
}

impl DateRange {
    pub fn days(self) -> Option<i64> {
        match self {
            DateRange::All => None,
            DateRange::Year => Some(365),
            DateRange::SixMonths => Some(182),
            DateRange::ThreeMonths => Some(91),
        }
    }

    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|d| now - Duration::days(d))
    }
}

impl FromStr for DateRange {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(DateRange::All),
            "1y" => Ok(DateRange::Year),
            "6m" => Ok(DateRange::SixMonths),
            "3m" => Ok(DateRange::ThreeMonths),
            _ => Err(ParseFilterError::Range(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameFilter {
    pub color: ColorFilter,
    pub range: DateRange,
}

impl GameFilter {
    pub fn new(color: ColorFilter, range: DateRange) -> Self {
        Self { color, range }
    }

    /// Keep the games matching both the color and the date range, relative to `now`.
    pub fn apply(&self, games: &[GameRecord], now: DateTime<Utc>) -> Vec<GameRecord> {
        let cutoff = self.range.cutoff(now);
        games
            .iter()
            .filter(|g| self.color.matches(g.color))
            .filter(|g| cutoff.is_none_or(|c| g.date >= c))
            .cloned()
            .collect()
    }
}
