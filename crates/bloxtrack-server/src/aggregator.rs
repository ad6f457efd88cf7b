use bloxtrack_core::error::LookupError;
use bloxtrack_core::identifier::{self, Identifier};
use bloxtrack_core::summary::{GameSummary, UserSummary};

use bloxtrack_roblox::{RobloxClient, UpstreamError};

/// Served when a non-fatal thumbnail call fails. A broken thumbnail is
/// cosmetic; missing stats is a real failure.
pub const PLACEHOLDER_IMAGE_URL: &str = "/img/placeholder.svg";

/// Resolve raw `/game` input to a merged summary.
///
/// Universe resolution runs first: stats and icon endpoints key on universe,
/// not place, so nothing downstream can be issued before it succeeds. Stats
/// and icon are then fetched concurrently; a stats failure is fatal and
/// cancels the in-flight icon call, an icon failure degrades to a placeholder.
pub async fn game_summary(client: &RobloxClient, raw: &str) -> Result<GameSummary, LookupError> {
    let place_id = match identifier::extract_game(raw)? {
        Identifier::Place(id) => id,
        other => {
            return Err(LookupError::InvalidInput(format!(
                "Expected a game link, got {other:?}"
            )));
        },
    };

    let universe_id = client
        .resolve_universe(place_id)
        .await
        .map_err(|e| required_call_failed("Game not found", e))?;

    let (stats, icon_result) = tokio::try_join!(
        client.fetch_game_stats(universe_id),
        wrap_best_effort(client.fetch_game_icon(universe_id)),
    )
    .map_err(|e| required_call_failed("Game not found", e))?;

    let (icon_url, degraded) = match icon_result {
        Ok(url) => (url, false),
        Err(e) => {
            tracing::warn!(universe_id, error = %e, "Icon fetch failed, using placeholder");
            (PLACEHOLDER_IMAGE_URL.to_string(), true)
        },
    };

    Ok(GameSummary {
        universe_id,
        name: stats.name,
        creator_name: stats.creator.name,
        playing: stats.playing,
        visits: stats.visits,
        favorites: stats.favorited_count,
        icon_url,
        degraded,
    })
}

/// Resolve raw `/user` input to a merged summary.
///
/// A username goes through the batched resolution endpoint first (banned
/// users are excluded upstream). Profile, presence, and avatar are fetched
/// concurrently; only the profile is required. Presence or avatar failure
/// degrades the summary instead of failing it.
pub async fn user_summary(client: &RobloxClient, raw: &str) -> Result<UserSummary, LookupError> {
    let user_id = match identifier::extract_user(raw)? {
        Identifier::User(id) => id,
        Identifier::Username(name) => {
            let resolved = client
                .resolve_user_id(&name)
                .await
                .map_err(|e| required_call_failed("User not found", e))?;
            resolved.ok_or_else(|| LookupError::NotFound("User not found".to_string()))?
        },
        other => {
            return Err(LookupError::InvalidInput(format!(
                "Expected a username or profile link, got {other:?}"
            )));
        },
    };

    let (profile, presence_result, avatar_result) = tokio::try_join!(
        client.fetch_user_profile(user_id),
        wrap_best_effort(client.fetch_user_presence(user_id)),
        wrap_best_effort(client.fetch_user_avatar(user_id)),
    )
    .map_err(|e| required_call_failed("User not found", e))?;

    let mut degraded = false;

    let presence = presence_result.unwrap_or_else(|e| {
        tracing::warn!(user_id, error = %e, "Presence fetch failed, defaulting to offline");
        degraded = true;
        Default::default()
    });
    let avatar_url = avatar_result.unwrap_or_else(|e| {
        tracing::warn!(user_id, error = %e, "Avatar fetch failed, using placeholder");
        degraded = true;
        PLACEHOLDER_IMAGE_URL.to_string()
    });

    Ok(UserSummary {
        user_id,
        display_name: profile.display_name,
        username: profile.name,
        bio: profile.description,
        created: profile.created,
        presence: presence.state,
        last_location: presence.last_location,
        avatar_url,
        degraded,
    })
}

/// Lift a best-effort call into the `try_join!` so a sibling required-call
/// failure still cancels it, while its own failure never aborts the join.
async fn wrap_best_effort<T>(
    fut: impl Future<Output = Result<T, UpstreamError>>,
) -> Result<Result<T, UpstreamError>, UpstreamError> {
    Ok(fut.await)
}

/// Map a required upstream call failure into the lookup taxonomy. The
/// upstream detail goes to the log, never to the client.
fn required_call_failed(not_found_msg: &str, err: UpstreamError) -> LookupError {
    tracing::warn!(service = err.service, status = ?err.status, error = %err, "Required upstream call failed");
    if err.is_not_found() {
        LookupError::NotFound(not_found_msg.to_string())
    } else {
        LookupError::UpstreamUnavailable("Roblox API unavailable".to_string())
    }
}
