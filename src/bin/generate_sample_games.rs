use std::fs;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use ratingscope::game::normalize::{Archive, ArchiveGame, ArchivePlayer, normalize_archive};

const USER: &str = "sample_player";
const OPPONENTS: [&str; 6] = ["rook_lift", "zugzwanger", "fianchetto", "knightowl", "endgame_ed", "h_pawn"];

// ── Helpers ──────────────────────────────────────────────────────────────

struct ControlPlan {
    time_class: &'static str,
    games: usize,
    start_rating: i32,
    /// Average rating change per game.
    drift: f64,
    /// Hours between consecutive games.
    spacing_hours: i64,
}

fn start_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 3, 18, 0, 0).unwrap()
}

/// Result strings for (our side, their side) given the outcome.
fn results(rng: &mut SmallRng, won: Option<bool>) -> (&'static str, &'static str) {
    match won {
        Some(true) => ("win", if rng.gen_bool(0.6) { "resigned" } else { "checkmated" }),
        Some(false) => (if rng.gen_bool(0.3) { "timeout" } else { "resigned" }, "win"),
        None => {
            let draw = ["agreed", "repetition", "stalemate", "insufficient"][rng.gen_range(0..4)];
            (draw, draw)
        }
    }
}

fn player(username: &str, rating: i32, result: &str) -> ArchivePlayer {
    ArchivePlayer {
        username: username.to_string(),
        rating: Some(rating),
        result: Some(result.to_string()),
    }
}

/// Random walk around a drifting rating; wins push it up and losses pull it down.
fn build_games(rng: &mut SmallRng, plan: &ControlPlan, first_id: usize) -> Vec<ArchiveGame> {
    let mut rating = plan.start_rating as f64;
    let mut date = start_date();
    let mut games = Vec::with_capacity(plan.games);

    for i in 0..plan.games {
        let opponent_rating = (rating + rng.gen_range(-150.0..150.0)).round() as i32;
        let roll: f64 = rng.gen_range(0.0..1.0);
        let won = if roll < 0.08 {
            None
        } else {
            Some(roll < 0.54 + plan.drift / 40.0)
        };
        let delta = match won {
            Some(true) => rng.gen_range(4.0..12.0),
            Some(false) => -rng.gen_range(4.0..12.0),
            None => rng.gen_range(-2.0..2.0),
        };
        rating = (rating + delta + plan.drift).max(100.0);

        let (ours, theirs) = results(rng, won);
        let us = player(USER, rating.round() as i32, ours);
        let them = player(OPPONENTS[i % OPPONENTS.len()], opponent_rating, theirs);
        let (white, black) = if rng.gen_bool(0.5) { (us, them) } else { (them, us) };

        games.push(ArchiveGame {
            url: Some(format!("https://example.org/game/{}", first_id + i)),
            end_time: Some(date.timestamp()),
            time_class: Some(plan.time_class.to_string()),
            white: Some(white),
            black: Some(black),
            pgn: None,
        });

        let jitter = rng.gen_range(0..plan.spacing_hours.max(1));
        date += Duration::hours(plan.spacing_hours + jitter);
    }
    games
}

// ── Main ─────────────────────────────────────────────────────────────────

fn main() {
    fs::create_dir_all("sample-data").unwrap();
    let mut rng = SmallRng::seed_from_u64(42);

    let plans = [
        ControlPlan {
            time_class: "blitz",
            games: 420,
            start_rating: 1180,
            drift: 0.9,
            spacing_hours: 14,
        },
        ControlPlan {
            time_class: "rapid",
            games: 160,
            start_rating: 1350,
            drift: 1.6,
            spacing_hours: 40,
        },
        ControlPlan {
            time_class: "bullet",
            games: 250,
            start_rating: 1000,
            drift: -0.3,
            spacing_hours: 20,
        },
    ];

    let mut games = Vec::new();
    for plan in &plans {
        let first_id = games.len() + 1;
        games.extend(build_games(&mut rng, plan, first_id));
    }
    games.sort_by_key(|g| g.end_time);

    let archive = Archive { games };
    let records = normalize_archive(&archive.games, USER);

    let outputs = [
        ("sample-data/archive.json", serde_json::to_string_pretty(&archive).unwrap()),
        ("sample-data/records.json", serde_json::to_string_pretty(&records).unwrap()),
    ];
    for (path, json) in &outputs {
        fs::write(path, json).unwrap();
        println!("Wrote {path} ({} bytes)", json.len());
    }

    println!("\nGenerated {} games for {USER}.", records.len());
}
