//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Rating categories tracked per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum PerfCategory {
    Bullet,
    Blitz,
    Rapid,
    Classical,
    Correspondence,
    Chess960,
    Puzzle,
}

impl PerfCategory {
    pub const ALL: [PerfCategory; 7] = [
        PerfCategory::Bullet,
        PerfCategory::Blitz,
        PerfCategory::Rapid,
        PerfCategory::Classical,
        PerfCategory::Correspondence,
        PerfCategory::Chess960,
        PerfCategory::Puzzle,
    ];

    /// Key used by Lichess in the `perfs` object.
    pub fn as_str(self) -> &'static str {
        match self {
            PerfCategory::Bullet => "bullet",
            PerfCategory::Blitz => "blitz",
            PerfCategory::Rapid => "rapid",
            PerfCategory::Classical => "classical",
            PerfCategory::Correspondence => "correspondence",
            PerfCategory::Chess960 => "chess960",
            PerfCategory::Puzzle => "puzzle",
        }
    }
}

/// Rating record for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PerfRating {
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub games: i32,
    /// Recent rating progress
    #[serde(default)]
    pub prog: i32,
    /// Rating deviation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rd: Option<i32>,
    /// Provisional rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prov: Option<bool>,
}

/// Ratings keyed by category.
pub type Ratings = BTreeMap<PerfCategory, PerfRating>;

/// Build the ratings table from a Lichess `perfs` object.
///
/// Categories we don't track (storm, racer, ...) and entries that don't
/// look like a rating record are ignored.
pub fn ratings_from_perfs(perfs: &serde_json::Map<String, serde_json::Value>) -> Ratings {
    PerfCategory::ALL
        .iter()
        .filter_map(|category| {
            let value = perfs.get(category.as_str())?;
            let rating = serde_json::from_value::<PerfRating>(value.clone()).ok()?;
            Some((*category, rating))
        })
        .collect()
}

/// Free-form profile as published on Lichess.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<String>,
}

/// User row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Lowercase Lichess username (primary key)
    pub id: String,
    pub lichess_id: String,
    /// Display username
    pub username: String,
    pub title: Option<String>,
    pub patron: bool,
    pub created_at_lichess: Option<DateTime<Utc>>,
    pub seen_at: Option<DateTime<Utc>>,
    /// Seconds played
    pub play_time_total: i64,
    /// Seconds on Lichess TV
    pub play_time_tv: i64,
    pub ratings: Json<Ratings>,
    pub profile: Json<Profile>,

    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_games_sync: Option<DateTime<Utc>>,
}

/// OAuth tokens obtained from Lichess.
#[derive(Debug, Clone)]
pub struct UserTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Profile fields written on login or refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct UserUpsert {
    pub lichess_id: String,
    pub username: String,
    pub title: Option<String>,
    pub patron: bool,
    pub created_at_lichess: Option<DateTime<Utc>>,
    pub seen_at: Option<DateTime<Utc>>,
    pub play_time_total: i64,
    pub play_time_tv: i64,
    pub ratings: Ratings,
    pub profile: Profile,
}

impl UserUpsert {
    /// Local user id: the lowercase username.
    pub fn id(&self) -> String {
        self.username.to_lowercase()
    }
}

/// Public user profile returned by the API.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub title: Option<String>,
    pub patron: bool,
    pub created_at_lichess: Option<DateTime<Utc>>,
    pub seen_at: Option<DateTime<Utc>>,
    pub play_time_total: i64,
    pub play_time_tv: i64,
    pub ratings: Ratings,
    pub profile: Profile,
    /// Last successful game sync (only known for local users)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_games_sync: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            title: user.title,
            patron: user.patron,
            created_at_lichess: user.created_at_lichess,
            seen_at: user.seen_at,
            play_time_total: user.play_time_total,
            play_time_tv: user.play_time_tv,
            ratings: user.ratings.0,
            profile: user.profile.0,
            last_games_sync: user.last_games_sync,
        }
    }
}

impl From<UserUpsert> for UserResponse {
    fn from(user: UserUpsert) -> Self {
        Self {
            id: user.id(),
            username: user.username,
            title: user.title,
            patron: user.patron,
            created_at_lichess: user.created_at_lichess,
            seen_at: user.seen_at,
            play_time_total: user.play_time_total,
            play_time_tv: user.play_time_tv,
            ratings: user.ratings,
            profile: user.profile,
            last_games_sync: None,
        }
    }
}

/// Session summary for `/auth/me`.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub id: String,
    pub username: String,
    pub title: Option<String>,
    pub patron: bool,
}

impl From<&User> for MeResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            title: user.title.clone(),
            patron: user.patron,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ratings_from_perfs_keeps_known_categories() {
        let perfs = json!({
            "blitz": {"games": 120, "rating": 1650, "rd": 45, "prog": 12},
            "puzzle": {"games": 30, "rating": 1900, "rd": 80, "prog": -4, "prov": true},
            "storm": {"runs": 5, "score": 31},
            "racer": {"runs": 1, "score": 12}
        });
        let ratings = ratings_from_perfs(perfs.as_object().unwrap());

        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[&PerfCategory::Blitz].rating, 1650);
        assert_eq!(ratings[&PerfCategory::Blitz].rd, Some(45));
        assert_eq!(ratings[&PerfCategory::Puzzle].prov, Some(true));
        assert!(!ratings.contains_key(&PerfCategory::Bullet));
    }

    #[test]
    fn test_ratings_serialize_by_category_name() {
        let mut ratings = Ratings::new();
        ratings.insert(
            PerfCategory::Chess960,
            PerfRating {
                rating: 1500,
                ..Default::default()
            },
        );
        let json = serde_json::to_value(&ratings).unwrap();
        assert_eq!(json["chess960"]["rating"], 1500);
    }

    #[test]
    fn test_profile_uses_lichess_field_names() {
        let profile: Profile = serde_json::from_value(json!({
            "country": "NO",
            "firstName": "Magnus",
            "bio": "hi"
        }))
        .unwrap();
        assert_eq!(profile.first_name.as_deref(), Some("Magnus"));
        assert_eq!(profile.last_name, None);
    }
}
