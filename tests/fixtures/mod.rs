//! Test fixtures shared by the integration tests

use chrono::NaiveDate;
use wrestling_elo::types::{ContestRecord, DecisionKind, Outcome, RawContest};

pub fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// A raw contest line as the scraper would hand it over
pub fn raw_contest(event_id: &str, event_date: Option<NaiveDate>, text: &str) -> RawContest {
    RawContest {
        event_id: event_id.to_string(),
        event_date,
        weight_class: Some("132".to_string()),
        text: text.to_string(),
    }
}

/// A classified contest record built directly, bypassing the classifier
pub fn contest_record(
    sequence: u64,
    event_id: &str,
    event_date: Option<NaiveDate>,
    round: &str,
    winner: &str,
    loser: Option<&str>,
    kind: DecisionKind,
    score: Option<(u32, u32)>,
) -> ContestRecord {
    let is_bye = kind.is_no_contest();
    ContestRecord {
        sequence,
        event_id: event_id.to_string(),
        event_date,
        outcome: Outcome {
            round_label: Some(round.to_string()),
            winner_name: Some(winner.to_string()),
            winner_team: Some(format!("{} Club", winner)),
            loser_name: loser.map(str::to_string),
            loser_team: loser.map(|l| format!("{} Club", l)),
            decision_kind: kind,
            winner_points: if is_bye { None } else { score.map(|s| s.0) },
            loser_points: if is_bye { None } else { score.map(|s| s.1) },
            is_bye,
            ..Default::default()
        },
    }
}

/// Two small tournaments a month apart, in scraped (unsorted) order
pub fn sample_season() -> Vec<RawContest> {
    let first = date(2024, 1, 6);
    let second = date(2024, 2, 10);
    vec![
        raw_contest(
            "winter-open",
            first,
            "Final - John Smith (Team A) 5-0 won by fall over Jane Doe (Team B) 3-2 (Fall 2:15)",
        ),
        raw_contest(
            "winter-open",
            first,
            "Quarterfinal - John Smith (Team A) won by decision over Sam Hill (Vienna) (Dec 7-2)",
        ),
        raw_contest(
            "winter-open",
            first,
            "Quarterfinal - Jane Doe (Team B) won by major decision over Tim Roy (McLean) (MD 12-3)",
        ),
        raw_contest(
            "winter-open",
            first,
            "Semifinal - Jane Doe (Team B) won in double overtime over Kai Lane (Vienna) (2-OT 5-3)",
        ),
        raw_contest(
            "winter-open",
            first,
            "Semifinal - John Smith (Team A) received a bye",
        ),
        raw_contest(
            "spring-duals",
            second,
            "Sam Hill (Vienna) over Tim Roy (McLean) Dec 4-3",
        ),
        raw_contest(
            "spring-duals",
            second,
            "Champ. Round 1 - Kai Lane (Vienna) 9-6 won by forfeit over () (For.)",
        ),
        raw_contest(
            "spring-duals",
            second,
            "Round 5 - Cooper Green (CATHOLIC) 2-3 and Daniel Hasbun (HICKORY) 2-3 (DFF)",
        ),
        raw_contest("spring-duals", second, "this line is not a result"),
    ]
}
