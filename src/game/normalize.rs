use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::record::{Color, GameRecord, Outcome};

static PGN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("static PGN tag pattern"));

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArchivePlayer {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub result: Option<String>,
}

/// A game as published in a monthly archive download.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArchiveGame {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub time_class: Option<String>,
    #[serde(default)]
    pub white: Option<ArchivePlayer>,
    #[serde(default)]
    pub black: Option<ArchivePlayer>,
    #[serde(default)]
    pub pgn: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Archive {
    #[serde(default)]
    pub games: Vec<ArchiveGame>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("game has no player information")]
    MissingPlayers,
    #[error("user `{0}` did not play this game")]
    UnknownUser(String),
    #[error("game has no usable end time")]
    MissingDate,
}

pub fn parse_pgn_tags(pgn: &str) -> HashMap<String, String> {
    PGN_TAG
        .captures_iter(pgn)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

fn outcome_for(ours: &str, theirs: &str) -> Outcome {
    if ours == "win" {
        return Outcome::Win;
    }
    if ours == "agreed"
        || ours == "stalemate"
        || ours.starts_with("repetition")
        || ours.contains("insufficient")
    {
        return Outcome::Draw;
    }
    if ours == "timeout" && theirs.contains("insufficient") {
        return Outcome::Draw;
    }
    if ours.is_empty() {
        Outcome::Unknown
    } else {
        Outcome::Loss
    }
}

fn end_date(game: &ArchiveGame, tags: &HashMap<String, String>) -> Option<DateTime<Utc>> {
    if let Some(secs) = game.end_time.filter(|&s| s > 0) {
        return DateTime::from_timestamp(secs, 0);
    }
    let tag = tags.get("Date")?;
    let day = NaiveDate::parse_from_str(tag, "%Y.%m.%d").ok()?;
    Some(day.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Convert one archive game into a record seen from `username`'s side.
pub fn normalize_game(game: &ArchiveGame, username: &str) -> Result<GameRecord, NormalizeError> {
    let user = username.trim().to_lowercase();
    if game.white.is_none() && game.black.is_none() {
        return Err(NormalizeError::MissingPlayers);
    }
    let empty = ArchivePlayer::default();
    let white = game.white.as_ref().unwrap_or(&empty);
    let black = game.black.as_ref().unwrap_or(&empty);

    let color = if white.username.to_lowercase() == user {
        Color::White
    } else if black.username.to_lowercase() == user {
        Color::Black
    } else {
        return Err(NormalizeError::UnknownUser(username.to_string()));
    };
    let (us, them, elo_tag) = match color {
        Color::White => (white, black, "WhiteElo"),
        Color::Black => (black, white, "BlackElo"),
    };

    let tags = parse_pgn_tags(game.pgn.as_deref().unwrap_or(""));
    let date = end_date(game, &tags).ok_or(NormalizeError::MissingDate)?;

    let rating = us
        .rating
        .filter(|&r| r > 0)
        .or_else(|| tags.get(elo_tag).and_then(|v| v.parse::<i32>().ok()))
        .filter(|&r| r > 0);

    let control = match game.time_class.as_deref() {
        Some(tc) if !tc.is_empty() => tc.to_string(),
        _ => tags.get("Event").map(|e| e.to_lowercase()).unwrap_or_default(),
    };

    let outcome = outcome_for(
        us.result.as_deref().unwrap_or(""),
        them.result.as_deref().unwrap_or(""),
    );

    Ok(GameRecord {
        date,
        rating,
        control,
        color: Some(color),
        outcome,
        opponent: them.username.clone(),
        opponent_rating: them.rating.filter(|&r| r > 0),
        url: game.url.clone(),
    })
}

/// Normalize a whole archive, skipping games that cannot be attributed to `username`.
pub fn normalize_archive(games: &[ArchiveGame], username: &str) -> Vec<GameRecord> {
    let mut records = Vec::with_capacity(games.len());
    for game in games {
        match normalize_game(game, username) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::warn!(url = game.url.as_deref().unwrap_or("-"), "skipping game: {err}");
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, rating: Option<i32>, result: &str) -> Option<ArchivePlayer> {
        Some(ArchivePlayer {
            username: name.to_string(),
            rating,
            result: Some(result.to_string()),
        })
    }

    fn game(white: Option<ArchivePlayer>, black: Option<ArchivePlayer>) -> ArchiveGame {
        ArchiveGame {
            url: Some("https://example.org/game/1".to_string()),
            end_time: Some(1_700_000_000),
            time_class: Some("blitz".to_string()),
            white,
            black,
            pgn: None,
        }
    }

    #[test]
    fn test_normalize_white_win() {
        let g = game(player("Alice", Some(1510), "win"), player("bob", Some(1490), "resigned"));
        let record = normalize_game(&g, "  ALICE ").unwrap();
        assert_eq!(record.color, Some(Color::White));
        assert_eq!(record.rating, Some(1510));
        assert_eq!(record.opponent, "bob");
        assert_eq!(record.opponent_rating, Some(1490));
        assert_eq!(record.outcome, Outcome::Win);
        assert_eq!(record.control, "blitz");
        assert_eq!(record.date.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_normalize_black_loss() {
        let g = game(player("bob", Some(1490), "win"), player("alice", Some(1510), "checkmated"));
        let record = normalize_game(&g, "alice").unwrap();
        assert_eq!(record.color, Some(Color::Black));
        assert_eq!(record.outcome, Outcome::Loss);
    }

    #[test]
    fn test_draw_variants() {
        for result in ["agreed", "stalemate", "repetition", "timevsinsufficient", "insufficient"] {
            let g = game(player("alice", Some(1500), result), player("bob", Some(1500), result));
            assert_eq!(normalize_game(&g, "alice").unwrap().outcome, Outcome::Draw, "{result}");
        }
        let g = game(
            player("alice", Some(1500), "timeout"),
            player("bob", Some(1500), "timevsinsufficient"),
        );
        assert_eq!(normalize_game(&g, "alice").unwrap().outcome, Outcome::Draw);
    }

    #[test]
    fn test_pgn_fallbacks() {
        let mut g = game(player("alice", None, "win"), player("bob", None, "resigned"));
        g.end_time = None;
        g.time_class = None;
        g.pgn = Some(
            "[Event \"Rapid\"]\n[Date \"2023.11.02\"]\n[WhiteElo \"1432\"]\n[BlackElo \"1400\"]\n\n1. e4 e5"
                .to_string(),
        );
        let record = normalize_game(&g, "alice").unwrap();
        assert_eq!(record.rating, Some(1432));
        assert_eq!(record.control, "rapid");
        assert_eq!(record.date.format("%Y-%m-%d").to_string(), "2023-11-02");
        assert_eq!(record.opponent_rating, None);
    }

    #[test]
    fn test_errors() {
        let g = game(None, None);
        assert_eq!(normalize_game(&g, "alice"), Err(NormalizeError::MissingPlayers));

        let g = game(player("carol", Some(1500), "win"), player("bob", Some(1500), "lose"));
        assert!(matches!(normalize_game(&g, "alice"), Err(NormalizeError::UnknownUser(_))));

        let mut g = game(player("alice", Some(1500), "win"), player("bob", Some(1500), "lose"));
        g.end_time = None;
        assert_eq!(normalize_game(&g, "alice"), Err(NormalizeError::MissingDate));
    }

    #[test]
    fn test_normalize_archive_skips_foreign_games() {
        let games = vec![
            game(player("alice", Some(1500), "win"), player("bob", Some(1500), "lose")),
            game(player("carol", Some(1500), "win"), player("bob", Some(1500), "lose")),
        ];
        assert_eq!(normalize_archive(&games, "alice").len(), 1);
    }
}
