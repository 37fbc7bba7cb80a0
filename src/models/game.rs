//! Game model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

/// Outcome of a game from the owning user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    /// Result for `user_color` given the winning color (`None` is a draw).
    pub fn from_winner(user_color: Color, winner: Option<Color>) -> Self {
        match winner {
            None => GameResult::Draw,
            Some(w) if w == user_color => GameResult::Win,
            Some(_) => GameResult::Loss,
        }
    }
}

/// A stored game. One row per Lichess game id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Game {
    /// Lichess game ID
    pub id: String,
    /// Owning local user
    #[serde(skip_serializing)]
    pub user_id: String,

    pub rated: bool,
    pub variant: String,
    pub speed: String,
    pub perf_type: String,

    // ─── Time Control ────────────────────────────────────────────
    /// Initial clock in seconds
    pub time_control_initial: Option<i32>,
    /// Increment in seconds
    pub time_control_increment: Option<i32>,

    // ─── Players ─────────────────────────────────────────────────
    pub white_username: String,
    pub white_rating: Option<i32>,
    pub white_rating_diff: Option<i32>,
    pub black_username: String,
    pub black_rating: Option<i32>,
    pub black_rating_diff: Option<i32>,

    // ─── Outcome ─────────────────────────────────────────────────
    pub user_color: Color,
    pub result: GameResult,
    /// Lichess status code (mate, resign, outoftime, ...)
    pub status: String,
    pub winner: Option<Color>,

    // ─── Timestamps ──────────────────────────────────────────────
    /// When the game was played
    pub created_at: DateTime<Utc>,
    pub last_move_at: Option<DateTime<Utc>>,

    // ─── Opening ─────────────────────────────────────────────────
    pub opening_eco: Option<String>,
    pub opening_name: Option<String>,
}

impl Game {
    /// Opponent username and rating.
    pub fn opponent(&self) -> (&str, Option<i32>) {
        match self.user_color {
            Color::White => (&self.black_username, self.black_rating),
            Color::Black => (&self.white_username, self.white_rating),
        }
    }
}

/// Optional filters for game listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameFilters {
    pub perf_type: Option<String>,
    pub result: Option<GameResult>,
    pub rated: Option<bool>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

/// Game as returned by the API, with opponent fields resolved.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GameResponse {
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub game: Game,
    pub opponent_username: String,
    pub opponent_rating: Option<i32>,
    pub lichess_url: String,
}

impl GameResponse {
    pub fn new(game: Game, lichess_base_url: &str) -> Self {
        let (opponent_username, opponent_rating) = game.opponent();
        let opponent_username = opponent_username.to_string();
        let lichess_url = format!("{}/{}", lichess_base_url.trim_end_matches('/'), game.id);
        Self {
            game,
            opponent_username,
            opponent_rating,
            lichess_url,
        }
    }
}

/// Paginated game listing.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GameListResponse {
    pub games: Vec<GameResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

/// Whether rows remain past the current page.
pub fn has_more(page: u32, page_size: u32, total: i64) -> bool {
    i64::from(page) * i64::from(page_size) < total
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_game(id: &str, user_color: Color, winner: Option<Color>) -> Game {
        Game {
            id: id.to_string(),
            user_id: "alice".to_string(),
            rated: true,
            variant: "standard".to_string(),
            speed: "blitz".to_string(),
            perf_type: "blitz".to_string(),
            time_control_initial: Some(180),
            time_control_increment: Some(2),
            white_username: "Alice".to_string(),
            white_rating: Some(1500),
            white_rating_diff: Some(6),
            black_username: "Bob".to_string(),
            black_rating: Some(1480),
            black_rating_diff: Some(-6),
            user_color,
            result: GameResult::from_winner(user_color, winner),
            status: "mate".to_string(),
            winner,
            created_at: DateTime::from_timestamp(1_704_103_200, 0).unwrap(),
            last_move_at: None,
            opening_eco: Some("B20".to_string()),
            opening_name: Some("Sicilian Defense".to_string()),
        }
    }

    #[test]
    fn test_result_from_winner() {
        assert_eq!(
            GameResult::from_winner(Color::White, None),
            GameResult::Draw
        );
        assert_eq!(
            GameResult::from_winner(Color::White, Some(Color::White)),
            GameResult::Win
        );
        assert_eq!(
            GameResult::from_winner(Color::Black, Some(Color::White)),
            GameResult::Loss
        );
    }

    #[test]
    fn test_has_more() {
        assert!(has_more(1, 20, 45));
        assert!(has_more(2, 20, 45));
        assert!(!has_more(3, 20, 45));
        assert!(!has_more(1, 20, 20));
        assert!(!has_more(1, 20, 0));
    }

    #[test]
    fn test_response_resolves_opponent() {
        let game = sample_game("abcd1234", Color::Black, Some(Color::Black));
        let response = GameResponse::new(game, "https://lichess.org/");

        assert_eq!(response.opponent_username, "Alice");
        assert_eq!(response.opponent_rating, Some(1500));
        assert_eq!(response.lichess_url, "https://lichess.org/abcd1234");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["result"], "win");
        assert_eq!(json["user_color"], "black");
        assert_eq!(json["id"], "abcd1234");
        assert!(json.get("user_id").is_none());
    }
}
