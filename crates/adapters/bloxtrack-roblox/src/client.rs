use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use bloxtrack_core::summary::PresenceState;

use crate::config::RobloxApiConfig;

/// Failure of a single upstream call. Each call has its own failure domain;
/// the caller decides whether the failure is fatal for the enclosing lookup.
#[derive(Debug, Clone)]
pub struct UpstreamError {
    /// Which upstream capability failed, e.g. "game-stats".
    pub service: &'static str,
    /// HTTP status when the upstream answered at all.
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    fn network(service: &'static str, err: &reqwest::Error) -> Self {
        Self {
            service,
            status: None,
            message: err.to_string(),
        }
    }

    fn status(service: &'static str, status: u16) -> Self {
        Self {
            service,
            status: Some(status),
            message: format!("upstream returned {status}"),
        }
    }

    fn malformed(service: &'static str, detail: &str) -> Self {
        Self {
            service,
            status: None,
            message: format!("unexpected response shape: {detail}"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.service, self.message)
    }
}

/// Live game stats for one universe, zero-filled where upstream omits counts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub creator: CreatorInfo,
    #[serde(default)]
    pub playing: u64,
    #[serde(default)]
    pub visits: u64,
    #[serde(default)]
    pub favorited_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatorInfo {
    #[serde(default)]
    pub name: String,
}

/// Profile fields for one user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created: String,
}

/// Presence for one user. Default is offline with no location, which is also
/// what an empty presence array decodes to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPresence {
    pub state: PresenceState,
    pub last_location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UniverseEnvelope {
    #[serde(rename = "universeId")]
    universe_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailEntry {
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsernameMatch {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct PresenceEnvelope {
    #[serde(rename = "userPresences", default)]
    user_presences: Vec<PresenceEntry>,
}

#[derive(Debug, Deserialize)]
struct PresenceEntry {
    #[serde(rename = "userPresenceType", default)]
    presence_type: i64,
    #[serde(rename = "lastLocation", default)]
    last_location: Option<String>,
}

/// Client for the public Roblox web APIs.
///
/// One method per upstream capability. Every call carries its own timeout so
/// a slow service cannot stall a sibling call issued concurrently.
pub struct RobloxClient {
    config: RobloxApiConfig,
    client: reqwest::Client,
}

impl RobloxClient {
    pub fn new(config: RobloxApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bloxtrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    /// Resolve a place to its parent universe. Stats and thumbnails key on
    /// universe, not place, so this runs before any other game call.
    /// Fails when the place is private or deleted.
    pub async fn resolve_universe(&self, place_id: i64) -> Result<i64, UpstreamError> {
        let url = format!(
            "{}/universes/v1/places/{place_id}/universe",
            self.config.apis_url
        );
        let envelope: UniverseEnvelope = self.get_json("place-universe", &url).await?;
        envelope
            .universe_id
            .ok_or_else(|| UpstreamError::malformed("place-universe", "universeId is null"))
    }

    pub async fn fetch_game_stats(&self, universe_id: i64) -> Result<GameStats, UpstreamError> {
        let url = format!(
            "{}/v1/games?universeIds={universe_id}",
            self.config.games_url
        );
        let mut envelope: DataEnvelope<GameStats> = self.get_json("game-stats", &url).await?;
        if envelope.data.is_empty() {
            return Err(UpstreamError::malformed("game-stats", "empty data array"));
        }
        Ok(envelope.data.remove(0))
    }

    pub async fn fetch_game_icon(&self, universe_id: i64) -> Result<String, UpstreamError> {
        let url = format!(
            "{}/v1/games/icons?universeIds={universe_id}&size=512x512&format=Png",
            self.config.thumbnails_url
        );
        let envelope: DataEnvelope<ThumbnailEntry> = self.get_json("game-icon", &url).await?;
        first_image_url(envelope, "game-icon")
    }

    /// Resolve a username to a user ID via the batched lookup endpoint.
    /// Banned users are excluded upstream. `Ok(None)` means zero matches.
    pub async fn resolve_user_id(&self, username: &str) -> Result<Option<i64>, UpstreamError> {
        let url = format!("{}/v1/usernames/users", self.config.users_url);
        let body = serde_json::json!({
            "usernames": [username],
            "excludeBannedUsers": true,
        });
        let envelope: DataEnvelope<UsernameMatch> =
            self.post_json("username-lookup", &url, &body).await?;
        Ok(envelope.data.first().map(|m| m.id))
    }

    pub async fn fetch_user_profile(&self, user_id: i64) -> Result<UserProfile, UpstreamError> {
        let url = format!("{}/v1/users/{user_id}", self.config.users_url);
        self.get_json("user-profile", &url).await
    }

    /// Fetch presence for a user. An empty presence array and unknown
    /// presence codes both degrade to offline rather than erroring.
    pub async fn fetch_user_presence(&self, user_id: i64) -> Result<UserPresence, UpstreamError> {
        let url = format!("{}/v1/presence/users", self.config.presence_url);
        let body = serde_json::json!({ "userIds": [user_id] });
        let envelope: PresenceEnvelope = self.post_json("user-presence", &url, &body).await?;
        Ok(envelope
            .user_presences
            .into_iter()
            .next()
            .map(|entry| UserPresence {
                state: PresenceState::from_code(entry.presence_type),
                last_location: entry.last_location,
            })
            .unwrap_or_default())
    }

    pub async fn fetch_user_avatar(&self, user_id: i64) -> Result<String, UpstreamError> {
        let url = format!(
            "{}/v1/users/avatar-headshot?userIds={user_id}&size=150x150&format=Png",
            self.config.thumbnails_url
        );
        let envelope: DataEnvelope<ThumbnailEntry> = self.get_json("user-avatar", &url).await?;
        first_image_url(envelope, "user-avatar")
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
    ) -> Result<T, UpstreamError> {
        let resp = self
            .client
            .get(url)
            .timeout(self.call_timeout())
            .send()
            .await
            .map_err(|e| UpstreamError::network(service, &e))?;
        Self::decode(service, resp).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, UpstreamError> {
        let resp = self
            .client
            .post(url)
            .timeout(self.call_timeout())
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::network(service, &e))?;
        Self::decode(service, resp).await
    }

    async fn decode<T: DeserializeOwned>(
        service: &'static str,
        resp: reqwest::Response,
    ) -> Result<T, UpstreamError> {
        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(service, status = status.as_u16(), "Upstream call failed");
            return Err(UpstreamError::status(service, status.as_u16()));
        }
        resp.json()
            .await
            .map_err(|e| UpstreamError::network(service, &e))
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.config.call_timeout_secs)
    }
}

fn first_image_url(
    envelope: DataEnvelope<ThumbnailEntry>,
    service: &'static str,
) -> Result<String, UpstreamError> {
    envelope
        .data
        .into_iter()
        .next()
        .and_then(|t| t.image_url)
        .ok_or_else(|| UpstreamError::malformed(service, "no imageUrl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_stats_decode_with_all_fields() {
        let json = r#"{"data":[{"id":66654135,"name":"Adopt Me!",
            "creator":{"name":"Uplift Games"},
            "playing":245678,"visits":45200000000,"favoritedCount":12000000}]}"#;
        let envelope: DataEnvelope<GameStats> = serde_json::from_str(json).unwrap();
        let stats = &envelope.data[0];
        assert_eq!(stats.name, "Adopt Me!");
        assert_eq!(stats.creator.name, "Uplift Games");
        assert_eq!(stats.playing, 245678);
        assert_eq!(stats.favorited_count, 12000000);
    }

    #[test]
    fn game_stats_zero_fill_missing_counts() {
        let json = r#"{"data":[{"name":"Mystery Game"}]}"#;
        let envelope: DataEnvelope<GameStats> = serde_json::from_str(json).unwrap();
        let stats = &envelope.data[0];
        assert_eq!(stats.playing, 0);
        assert_eq!(stats.visits, 0);
        assert_eq!(stats.favorited_count, 0);
        assert_eq!(stats.creator.name, "");
    }

    #[test]
    fn universe_envelope_null_id() {
        let envelope: UniverseEnvelope = serde_json::from_str(r#"{"universeId":null}"#).unwrap();
        assert!(envelope.universe_id.is_none());
        let envelope: UniverseEnvelope =
            serde_json::from_str(r#"{"universeId":66654135}"#).unwrap();
        assert_eq!(envelope.universe_id, Some(66654135));
    }

    #[test]
    fn empty_presence_decodes_to_offline() {
        let envelope: PresenceEnvelope = serde_json::from_str(r#"{"userPresences":[]}"#).unwrap();
        let presence = envelope
            .user_presences
            .into_iter()
            .next()
            .map(|e| UserPresence {
                state: PresenceState::from_code(e.presence_type),
                last_location: e.last_location,
            })
            .unwrap_or_default();
        assert_eq!(presence, UserPresence::default());
        assert_eq!(presence.state, PresenceState::Offline);
        assert!(presence.last_location.is_none());
    }

    #[test]
    fn presence_entry_decodes_in_game() {
        let json = r#"{"userPresences":[{"userPresenceType":2,"lastLocation":"Adopt Me!"}]}"#;
        let envelope: PresenceEnvelope = serde_json::from_str(json).unwrap();
        let entry = &envelope.user_presences[0];
        assert_eq!(PresenceState::from_code(entry.presence_type), PresenceState::InGame);
        assert_eq!(entry.last_location.as_deref(), Some("Adopt Me!"));
    }

    #[test]
    fn unknown_presence_code_is_offline() {
        let json = r#"{"userPresences":[{"userPresenceType":7}]}"#;
        let envelope: PresenceEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(
            PresenceState::from_code(envelope.user_presences[0].presence_type),
            PresenceState::Offline
        );
    }

    #[test]
    fn thumbnail_missing_image_url_is_error() {
        let envelope: DataEnvelope<ThumbnailEntry> =
            serde_json::from_str(r#"{"data":[{"imageUrl":null}]}"#).unwrap();
        assert!(first_image_url(envelope, "game-icon").is_err());
    }

    #[test]
    fn upstream_error_display_hides_detail() {
        let err = UpstreamError::status("game-stats", 503);
        assert_eq!(err.to_string(), "game-stats: upstream returned 503");
        assert!(!err.is_not_found());
        assert!(UpstreamError::status("user-profile", 404).is_not_found());
    }
}
