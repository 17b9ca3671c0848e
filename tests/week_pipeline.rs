use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use nfl_bet_tracker::espn_api::{parse_scoreboard, week_for_date, WeekSchedule};
use nfl_bet_tracker::odds_api::{filter_window, parse_odds_events};
use nfl_bet_tracker::sheet::read_rows;
use nfl_bet_tracker::week::NflWeek;
use nfl_bet_tracker::{Error, HomeAway, MarketKind, SettlementResult, Side};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn schedule() -> WeekSchedule {
    let scoreboard = parse_scoreboard(&read_fixture("scoreboard_week12.json"))
        .expect("scoreboard fixture should parse");
    WeekSchedule::from_scoreboard(&scoreboard, None).expect("week 12 should normalize")
}

fn assembled_week() -> NflWeek {
    let schedule = schedule();
    let events = parse_odds_events(&read_fixture("odds_week12.json"))
        .expect("odds fixture should parse");
    let events = filter_window(events, schedule.start, schedule.end);
    NflWeek::assemble(schedule, &events).expect("week should assemble")
}

#[test]
fn normalizes_scoreboard_week() {
    let schedule = schedule();
    assert_eq!(schedule.week, 12);
    assert_eq!(
        schedule.start,
        Utc.with_ymd_and_hms(2022, 11, 23, 8, 0, 0).unwrap()
    );
    assert_eq!(
        schedule.end,
        Utc.with_ymd_and_hms(2022, 11, 30, 7, 59, 0).unwrap()
    );
    assert_eq!(schedule.games.len(), 2);

    let final_game = &schedule.games[0];
    assert_eq!(final_game.teams.away, "Team A");
    assert_eq!(final_game.teams.home, "Team H");
    assert_eq!(final_game.location, "City, ST");
    assert_eq!(final_game.score, Some(HomeAway::new(31, 30)));

    let live_game = &schedule.games[1];
    assert_eq!(live_game.location, "London");
    assert!(live_game.score.is_none());
}

#[test]
fn unknown_week_is_an_error() {
    let scoreboard = parse_scoreboard(&read_fixture("scoreboard_week12.json")).unwrap();
    assert!(matches!(
        WeekSchedule::from_scoreboard(&scoreboard, Some(19)),
        Err(Error::UnknownWeek(19))
    ));
}

#[test]
fn resolves_week_for_date() {
    let scoreboard = parse_scoreboard(&read_fixture("scoreboard_week12.json")).unwrap();
    let at = |d, h, m| Utc.with_ymd_and_hms(2022, 11, d, h, m, 0).unwrap();
    assert_eq!(week_for_date(&scoreboard, at(24, 17, 30)), Some(12));
    assert_eq!(week_for_date(&scoreboard, at(23, 8, 0)), Some(12));
    assert_eq!(week_for_date(&scoreboard, at(20, 12, 0)), Some(11));
    assert_eq!(week_for_date(&scoreboard, at(30, 7, 59)), None);
}

#[test]
fn week_falls_back_to_first_kickoff() {
    let mut scoreboard = parse_scoreboard(&read_fixture("scoreboard_week12.json")).unwrap();
    scoreboard.week = None;
    let schedule = WeekSchedule::from_scoreboard(&scoreboard, None).unwrap();
    assert_eq!(schedule.week, 12);

    scoreboard.events.clear();
    assert!(matches!(
        WeekSchedule::from_scoreboard(&scoreboard, None),
        Err(Error::MissingField("week"))
    ));
}

#[test]
fn assembles_odds_for_matching_games() {
    let week = assembled_week();
    assert_eq!(week.games.len(), 2);

    let quoted = week.game("Team A", "Team H").unwrap();
    assert_eq!(quoted.price(MarketKind::H2h, Side::Away), 160);
    assert_eq!(quoted.spread_points(Side::Home), Some(-3.5));
    assert_eq!(quoted.total_points(), Some(40.5));

    let unquoted = week.game("Team B", "Team C").unwrap();
    assert!(unquoted.odds.is_none());
}

#[test]
fn settles_week_from_bet_sheet() {
    let mut week = assembled_week();
    let rows = read_rows(read_fixture("bets_week12.csv").as_bytes()).unwrap();
    assert_eq!(week.apply_wagers(&rows), 2);

    // Odds for the unquoted game come from the sheet
    let from_sheet = week.game("Team B", "Team C").unwrap();
    assert_eq!(from_sheet.price(MarketKind::H2h, Side::Home), 100);
    assert_eq!(from_sheet.stake(MarketKind::Total, Side::Home), 40.0);

    let total = week.settle();
    assert_eq!(total, SettlementResult::new(3, 3, 0, -560.78));
    assert!(week.to_string().ends_with("Week 12 Results: 3-3-0 -$560.78"));

    // The in-progress game is deferred
    assert!(week.game("Team B", "Team C").unwrap().settlement.is_none());

    let rows = week.to_rows();
    assert_eq!(rows[0].away_team_score, Some(31));
    assert_eq!(rows[0].wins, Some(3));
    assert_eq!(rows[0].net, Some(-560.78));
    assert_eq!(rows[1].home_team_h2h_bet, 25.0);
    assert_eq!(rows[1].wins, None);
}

#[test]
fn resettles_after_scores_arrive() {
    let mut week = assembled_week();
    let rows = read_rows(read_fixture("bets_week12.csv").as_bytes()).unwrap();
    week.apply_wagers(&rows);
    week.settle();

    let mut latest = schedule();
    latest.games[1].score = Some(HomeAway::new(3, 24));
    week.update_scores(&latest);

    let total = week.settle();
    let late_game = week.game("Team B", "Team C").unwrap();
    assert_eq!(late_game.settlement, Some(SettlementResult::new(1, 1, 0, -15.0)));
    assert_eq!(total, SettlementResult::new(4, 4, 0, -575.78));

    // Settling again must not double count
    assert_eq!(week.settle(), total);
}

#[test]
fn stale_refresh_keeps_final_scores() {
    let mut week = assembled_week();
    let rows = read_rows(read_fixture("bets_week12.csv").as_bytes()).unwrap();
    week.apply_wagers(&rows);

    let mut stale = schedule();
    stale.games[0].score = None;
    week.update_scores(&stale);

    let kept = week.game("Team A", "Team H").unwrap();
    assert!(kept.is_final());
    assert_eq!(kept.score, Some(HomeAway::new(31, 30)));
    assert_eq!(week.settle(), SettlementResult::new(3, 3, 0, -560.78));
}
