use serde::{Deserialize, Serialize};

use crate::game::record::{Color, GameRecord, Outcome};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub total: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    /// Share of games won, 0.0 when there are none.
    pub rate: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ByColor {
    pub white: OutcomeCounts,
    pub black: OutcomeCounts,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeBreakdown {
    #[serde(flatten)]
    pub overall: OutcomeCounts,
    pub by_color: ByColor,
}

pub fn count_outcomes<'a>(games: impl IntoIterator<Item = &'a GameRecord>) -> OutcomeCounts {
    let mut counts = OutcomeCounts::default();
    for game in games {
        counts.total += 1;
        match game.outcome {
            Outcome::Win => counts.wins += 1,
            Outcome::Draw => counts.draws += 1,
            Outcome::Loss => counts.losses += 1,
            Outcome::Unknown => {}
        }
    }
    if counts.total > 0 {
        counts.rate = counts.wins as f64 / counts.total as f64;
    }
    counts
}

pub fn outcome_breakdown(games: &[GameRecord]) -> OutcomeBreakdown {
    let with_color = |color: Color| {
        count_outcomes(games.iter().filter(move |g| g.color == Some(color)))
    };
    OutcomeBreakdown {
        overall: count_outcomes(games),
        by_color: ByColor {
            white: with_color(Color::White),
            black: with_color(Color::Black),
        },
    }
}
