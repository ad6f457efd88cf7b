use serde::{Deserialize, Serialize};

/// Read-only projection of the game stats + icon upstream responses.
/// Numeric fields default to 0 when upstream omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub universe_id: i64,
    pub name: String,
    pub creator_name: String,
    pub playing: u64,
    pub visits: u64,
    pub favorites: u64,
    pub icon_url: String,
    /// True when a non-fatal call failed and a placeholder was substituted.
    #[serde(default)]
    pub degraded: bool,
}

/// Read-only projection of the user profile + presence + avatar responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: i64,
    pub display_name: String,
    pub username: String,
    pub bio: String,
    pub created: String,
    pub presence: PresenceState,
    pub last_location: Option<String>,
    pub avatar_url: String,
    #[serde(default)]
    pub degraded: bool,
}

/// Real-time online status as reported by the presence service.
/// Upstream codes: 0 = Offline, 1 = Online, 2 = InGame. Anything else
/// (including codes added upstream later) maps to Offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PresenceState {
    #[default]
    Offline,
    Online,
    InGame,
}

impl PresenceState {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Online,
            2 => Self::InGame,
            _ => Self::Offline,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Offline => 0,
            Self::Online => 1,
            Self::InGame => 2,
        }
    }
}
