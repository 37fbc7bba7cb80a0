//! Aggregate game statistics for a user.

use serde::Serialize;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::GameResult;

/// Game counts per outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ResultCounts {
    pub win: i64,
    pub loss: i64,
    pub draw: i64,
}

impl ResultCounts {
    pub fn add(&mut self, result: GameResult, count: i64) {
        match result {
            GameResult::Win => self.win += count,
            GameResult::Loss => self.loss += count,
            GameResult::Draw => self.draw += count,
        }
    }
}

/// Summary returned by the stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GameStats {
    pub total: i64,
    pub results: ResultCounts,
    /// Game count per perf type
    pub by_type: BTreeMap<String, i64>,
    /// Percentage of games won, one decimal place
    pub win_rate: f64,
}

impl GameStats {
    pub fn new(total: i64, results: ResultCounts, by_type: BTreeMap<String, i64>) -> Self {
        let win_rate = win_rate(results.win, total);
        Self {
            total,
            results,
            by_type,
            win_rate,
        }
    }
}

/// Win percentage rounded to one decimal, ties to even; 0 when there
/// are no games.
pub fn win_rate(wins: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (wins as f64 / total as f64 * 1000.0).round_ties_even() / 10.0
}
