use crate::models::{
    GameRecord, H2hOdds, HomeAway, ScoreLine, SettlementResult, Side, SpreadOdds, TotalOdds,
    WagerAmount,
};
use tracing::debug;

/// Net result of a single wager, rounded to cents
///
/// A price of `0` means no market was recorded, so nothing is won or lost.
/// Positive prices pay `price` per 100 staked, negative prices pay 100 per
/// `|price|` staked.
pub fn payout(won: bool, price: i32, stake: f64) -> f64 {
    if price == 0 {
        return 0.0;
    }
    if !won {
        return -stake;
    }
    let price = price as f64;
    let multiplier = if price > 0.0 {
        1.0 + price / 100.0
    } else {
        1.0 - 100.0 / price
    };
    round_cents(multiplier * stake - stake)
}

/// Round half away from zero to two decimal places
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Settle both sides of one market
///
/// With no stake on either side the result is all-zero. A push voids the
/// whole market. Otherwise each staked side is scored on its own, so a
/// hedged market records one win and one loss.
fn settle_sides(
    wager: &WagerAmount,
    price: &HomeAway<i32>,
    push: bool,
    won: impl Fn(Side) -> bool,
) -> SettlementResult {
    if !wager.any() {
        return SettlementResult::default();
    }
    if push {
        return SettlementResult::push();
    }

    let mut result = SettlementResult::default();
    for side in Side::BOTH {
        let stake = wager[side];
        if stake <= 0.0 {
            continue;
        }
        let side_won = won(side);
        if side_won {
            result.wins += 1;
        } else {
            result.losses += 1;
        }
        result.net += payout(side_won, price[side], stake);
    }
    result.net = round_cents(result.net);
    result
}

/// Moneyline: a side wins by outscoring the other, a tie is a push
pub fn settle_h2h(score: &ScoreLine, market: &H2hOdds) -> SettlementResult {
    settle_sides(
        &market.wager,
        &market.quote.price,
        score.away == score.home,
        |side| score[side] > score[side.opposite()],
    )
}

/// Against the spread: each side's handicap is added to its own score
///
/// The push check uses the away handicap only; the two handicaps are
/// expected to mirror each other.
pub fn settle_spread(score: &ScoreLine, market: &SpreadOdds) -> SettlementResult {
    let points = &market.quote.points;
    settle_sides(
        &market.wager,
        &market.quote.price,
        score.away as f64 + points.away == score.home as f64,
        |side| score[side] as f64 + points[side] > score[side.opposite()] as f64,
    )
}

/// Over/under: the away slot is the under, the home slot is the over
pub fn settle_total(score: &ScoreLine, market: &TotalOdds) -> SettlementResult {
    let combined = (score.away + score.home) as f64;
    let line = market.quote.points;
    settle_sides(
        &market.wager,
        &market.quote.price,
        combined == line,
        |side| match side {
            Side::Away => combined < line,
            Side::Home => combined > line,
        },
    )
}

/// Settle every market of a game and store the per-market and game results
///
/// Does nothing until the game has both a final score and odds. Re-running
/// recomputes everything from scratch.
pub fn settle(game: &mut GameRecord) {
    let (Some(score), Some(odds)) = (game.score, game.odds.as_mut()) else {
        return;
    };

    let mut total = SettlementResult::default();
    if let Some(h2h) = odds.h2h.as_mut() {
        let result = settle_h2h(&score, h2h);
        h2h.result = Some(result);
        total += result;
    }
    if let Some(spread) = odds.spread.as_mut() {
        let result = settle_spread(&score, spread);
        spread.result = Some(result);
        total += result;
    }
    if let Some(market) = odds.total.as_mut() {
        let result = settle_total(&score, market);
        market.result = Some(result);
        total += result;
    }
    total.net = round_cents(total.net);

    debug!(
        "Settled {} at {}: {}",
        game.teams.away, game.teams.home, total
    );
    game.settlement = Some(total);
}

/// Owned variant of [`settle`]
pub fn settled(mut game: GameRecord) -> GameRecord {
    settle(&mut game);
    game
}

/// Settle a batch of games and fold their results into one aggregate
pub fn settle_all(games: &mut [GameRecord]) -> SettlementResult {
    let mut total = SettlementResult::default();
    for game in games.iter_mut() {
        settle(game);
        total = total.combine(game.settlement.as_ref());
    }
    total.net = round_cents(total.net);
    total
}
