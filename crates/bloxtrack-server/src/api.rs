use std::time::{Duration, SystemTime};

use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use bloxtrack_core::error::LookupError;
use bloxtrack_core::identifier::{self, Identifier};
use bloxtrack_core::summary::{GameSummary, UserSummary};

use crate::aggregator;
use crate::cache::CachedSummary;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub query: Option<String>,
}

/// Wire shape for `GET /game`, matching what the dashboard renders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub success: bool,
    pub id: i64,
    pub name: String,
    pub creator: String,
    pub playing: u64,
    pub visits: u64,
    pub favorites: u64,
    pub icon: String,
    /// Set when a non-fatal call failed and a placeholder was substituted.
    #[serde(skip_serializing_if = "is_false")]
    pub degraded: bool,
    /// Set when this is a cached record served because the live lookup failed.
    #[serde(skip_serializing_if = "is_false")]
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<u64>,
}

/// Wire shape for `GET /user`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub success: bool,
    pub id: i64,
    pub display_name: String,
    pub name: String,
    pub bio: String,
    pub created: String,
    pub presence: PresenceBody,
    pub avatar: String,
    #[serde(skip_serializing_if = "is_false")]
    pub degraded: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceBody {
    pub user_presence_type: i64,
    pub last_location: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl GameResponse {
    fn fresh(s: GameSummary) -> Self {
        Self::build(s, None)
    }

    fn stale(s: GameSummary, fetched_at: SystemTime) -> Self {
        Self::build(s, Some(fetched_at))
    }

    fn build(s: GameSummary, fetched_at: Option<SystemTime>) -> Self {
        Self {
            success: true,
            id: s.universe_id,
            name: s.name,
            creator: s.creator_name,
            playing: s.playing,
            visits: s.visits,
            favorites: s.favorites,
            icon: s.icon_url,
            degraded: s.degraded,
            stale: fetched_at.is_some(),
            fetched_at: fetched_at.map(unix_secs),
        }
    }
}

impl UserResponse {
    fn fresh(s: UserSummary) -> Self {
        Self::build(s, None)
    }

    fn stale(s: UserSummary, fetched_at: SystemTime) -> Self {
        Self::build(s, Some(fetched_at))
    }

    fn build(s: UserSummary, fetched_at: Option<SystemTime>) -> Self {
        Self {
            success: true,
            id: s.user_id,
            display_name: s.display_name,
            name: s.username,
            bio: s.bio,
            created: s.created,
            presence: PresenceBody {
                user_presence_type: s.presence.code(),
                last_location: s.last_location,
            },
            avatar: s.avatar_url,
            degraded: s.degraded,
            stale: fetched_at.is_some(),
            fetched_at: fetched_at.map(unix_secs),
        }
    }
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Only availability failures fall back to the cache. NotFound is an
/// authoritative upstream answer and InvalidInput never reached upstream.
fn cache_eligible(err: &LookupError) -> bool {
    matches!(
        err,
        LookupError::UpstreamUnavailable(_) | LookupError::Timeout
    )
}

fn require_query(params: LookupQuery) -> Result<String, AppError> {
    match params.query {
        Some(q) if !q.trim().is_empty() => Ok(q),
        _ => Err(AppError::BadRequest("Missing query parameter".to_string())),
    }
}

async fn run_with_deadline<T>(
    state: &AppState,
    fut: impl Future<Output = Result<T, LookupError>>,
) -> Result<T, LookupError> {
    let deadline = Duration::from_secs(state.config.limits.request_deadline_secs);
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        // Deadline expiry drops the aggregation future, cancelling any
        // in-flight upstream calls.
        Err(_) => Err(LookupError::Timeout),
    }
}

/// GET /game?query= — aggregate live stats for a game link or place ID.
pub async fn get_game(
    State(state): State<AppState>,
    Query(params): Query<LookupQuery>,
) -> Result<Json<GameResponse>, AppError> {
    let raw = require_query(params)?;
    let key = identifier::extract_game(&raw).ok().map(|id| id.cache_key());

    let result = run_with_deadline(&state, aggregator::game_summary(&state.roblox, &raw)).await;
    match result {
        Ok(summary) => {
            if state.config.cache.enabled
                && let Some(key) = &key
            {
                let mut cache = state.cache.write().await;
                cache.put(key, CachedSummary::Game(summary.clone()));
            }
            Ok(Json(GameResponse::fresh(summary)))
        },
        Err(err) => {
            if state.config.cache.enabled
                && cache_eligible(&err)
                && let Some(key) = &key
                && let Some((CachedSummary::Game(summary), fetched_at)) =
                    state.cache.read().await.get(key)
            {
                tracing::info!(%key, error = %err, "Serving stale game summary from cache");
                return Ok(Json(GameResponse::stale(summary, fetched_at)));
            }
            Err(err.into())
        },
    }
}

/// GET /user?query= — aggregate profile, presence, and avatar for a user.
pub async fn get_user(
    State(state): State<AppState>,
    Query(params): Query<LookupQuery>,
) -> Result<Json<UserResponse>, AppError> {
    let raw = require_query(params)?;
    let key = identifier::extract_user(&raw).ok().map(|id| id.cache_key());

    let result = run_with_deadline(&state, aggregator::user_summary(&state.roblox, &raw)).await;
    match result {
        Ok(summary) => {
            if state.config.cache.enabled
                && let Some(key) = &key
            {
                let mut cache = state.cache.write().await;
                // A username lookup also warms the user-id key so later
                // numeric lookups for the same user can degrade too.
                cache.put(key, CachedSummary::User(summary.clone()));
                let id_key = Identifier::User(summary.user_id).cache_key();
                if *key != id_key {
                    cache.put(&id_key, CachedSummary::User(summary.clone()));
                }
            }
            Ok(Json(UserResponse::fresh(summary)))
        },
        Err(err) => {
            if state.config.cache.enabled
                && cache_eligible(&err)
                && let Some(key) = &key
                && let Some((CachedSummary::User(summary), fetched_at)) =
                    state.cache.read().await.get(key)
            {
                tracing::info!(%key, error = %err, "Serving stale user summary from cache");
                return Ok(Json(UserResponse::stale(summary, fetched_at)));
            }
            Err(err.into())
        },
    }
}
