use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExtractError;

static GAMES_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"games/(\d+)").expect("games URL regex"));
static USERS_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"users/(\d+)").expect("users URL regex"));

/// A resolved lookup target. Immutable once produced by extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Place(i64),
    Universe(i64),
    User(i64),
    Username(String),
}

impl Identifier {
    /// Normalized cache key for this identifier.
    pub fn cache_key(&self) -> String {
        match self {
            Self::Place(id) => format!("place:{id}"),
            Self::Universe(id) => format!("universe:{id}"),
            Self::User(id) => format!("user:{id}"),
            Self::Username(name) => format!("username:{}", name.to_lowercase()),
        }
    }
}

/// Parse free-form `/game` input into a place identifier.
///
/// Accepts a full game URL (`.../games/<id>/...`) or a bare numeric ID.
/// Games cannot be looked up by name, so anything else is an error.
pub fn extract_game(input: &str) -> Result<Identifier, ExtractError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ExtractError::EmptyInput);
    }
    if let Some(caps) = GAMES_URL_RE.captures(input) {
        return place(&caps[1]);
    }
    if is_numeric(input) {
        return place(input);
    }
    Err(ExtractError::InvalidGameLink)
}

/// Parse free-form `/user` input into a user identifier.
///
/// Accepts a profile URL (`.../users/<id>/profile`), a bare numeric ID
/// (treated as a UserId, not a numeric username), or a username.
pub fn extract_user(input: &str) -> Result<Identifier, ExtractError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ExtractError::EmptyInput);
    }
    if let Some(caps) = USERS_URL_RE.captures(input) {
        return user(&caps[1]);
    }
    if is_numeric(input) {
        return user(input);
    }
    Ok(Identifier::Username(input.to_string()))
}

fn is_numeric(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

// A digit run too long for i64 is rejected with the error matching the
// lookup kind it came from.
fn place(digits: &str) -> Result<Identifier, ExtractError> {
    parse_id(digits)
        .map(Identifier::Place)
        .ok_or(ExtractError::InvalidGameLink)
}

fn user(digits: &str) -> Result<Identifier, ExtractError> {
    parse_id(digits)
        .map(Identifier::User)
        .ok_or(ExtractError::InvalidUserLink)
}

fn parse_id(digits: &str) -> Option<i64> {
    digits.parse().ok()
}
