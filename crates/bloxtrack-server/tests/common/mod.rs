use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use bloxtrack_roblox::RobloxApiConfig;
use bloxtrack_server::build_app;
use bloxtrack_server::config::{CacheConfig, LimitsConfig, ServerConfig};

// Canned upstream data used across tests.
pub const PLACE_ID: i64 = 920587237;
pub const UNIVERSE_ID: i64 = 66654135;
pub const USER_ID: i64 = 156;
pub const USERNAME: &str = "builderman";
pub const GAME_ICON_URL: &str = "https://tr.rbxcdn.com/game-icon.png";
pub const AVATAR_URL: &str = "https://tr.rbxcdn.com/avatar.png";

/// Per-endpoint knobs and hit counters for the in-process Roblox stand-in.
#[derive(Default)]
pub struct MockKnobs {
    pub universe_hits: AtomicUsize,
    pub stats_hits: AtomicUsize,
    pub icon_hits: AtomicUsize,
    pub username_hits: AtomicUsize,
    pub profile_hits: AtomicUsize,
    pub presence_hits: AtomicUsize,
    pub avatar_hits: AtomicUsize,

    pub fail_universe: AtomicBool,
    pub fail_stats: AtomicBool,
    pub fail_icon: AtomicBool,
    pub fail_profile: AtomicBool,
    pub fail_presence: AtomicBool,
    pub fail_avatar: AtomicBool,

    /// Place endpoint answers 404, as for a deleted place.
    pub place_gone: AtomicBool,
    /// Presence endpoint answers with an empty presence array.
    pub empty_presence: AtomicBool,
    /// Stats endpoint stalls long enough to trip the request deadline.
    pub slow_stats: AtomicBool,
    /// Icon endpoint stalls, for exercising sibling cancellation.
    pub slow_icon: AtomicBool,
}

impl MockKnobs {
    pub fn set(&self, flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    pub fn hits(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// In-process stand-in for the five Roblox API services, all on one host.
pub struct MockRoblox {
    pub addr: SocketAddr,
    pub knobs: Arc<MockKnobs>,
    _server: tokio::task::JoinHandle<()>,
}

impl MockRoblox {
    pub async fn start() -> Self {
        let knobs = Arc::new(MockKnobs::default());

        let app = Router::new()
            .route(
                "/universes/v1/places/{place_id}/universe",
                axum::routing::get(mock_universe),
            )
            .route("/v1/games", axum::routing::get(mock_stats))
            .route("/v1/games/icons", axum::routing::get(mock_icon))
            .route("/v1/usernames/users", axum::routing::post(mock_usernames))
            .route("/v1/users/avatar-headshot", axum::routing::get(mock_avatar))
            .route("/v1/users/{user_id}", axum::routing::get(mock_profile))
            .route("/v1/presence/users", axum::routing::post(mock_presence))
            .with_state(Arc::clone(&knobs));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            knobs,
            _server: server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

fn failing(flag: &AtomicBool) -> bool {
    flag.load(Ordering::SeqCst)
}

async fn mock_universe(
    State(knobs): State<Arc<MockKnobs>>,
    Path(place_id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    knobs.universe_hits.fetch_add(1, Ordering::SeqCst);
    if failing(&knobs.fail_universe) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    if failing(&knobs.place_gone) || place_id != PLACE_ID {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(serde_json::json!({ "universeId": UNIVERSE_ID })))
}

async fn mock_stats(
    State(knobs): State<Arc<MockKnobs>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    knobs.stats_hits.fetch_add(1, Ordering::SeqCst);
    if failing(&knobs.slow_stats) {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    if failing(&knobs.fail_stats) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(serde_json::json!({
        "data": [{
            "id": UNIVERSE_ID,
            "name": "Adopt Me!",
            "creator": { "name": "Uplift Games" },
            "playing": 245678u64,
            "visits": 45_200_000_000u64,
            "favoritedCount": 12_000_000u64,
        }]
    })))
}

async fn mock_icon(
    State(knobs): State<Arc<MockKnobs>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    knobs.icon_hits.fetch_add(1, Ordering::SeqCst);
    if failing(&knobs.slow_icon) {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    if failing(&knobs.fail_icon) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(serde_json::json!({
        "data": [{ "targetId": UNIVERSE_ID, "imageUrl": GAME_ICON_URL }]
    })))
}

async fn mock_usernames(
    State(knobs): State<Arc<MockKnobs>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    knobs.username_hits.fetch_add(1, Ordering::SeqCst);
    let requested = body["usernames"][0].as_str().unwrap_or_default();
    let data = if requested.eq_ignore_ascii_case(USERNAME) {
        serde_json::json!([{ "id": USER_ID, "name": USERNAME }])
    } else {
        serde_json::json!([])
    };
    Json(serde_json::json!({ "data": data }))
}

async fn mock_profile(
    State(knobs): State<Arc<MockKnobs>>,
    Path(user_id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    knobs.profile_hits.fetch_add(1, Ordering::SeqCst);
    if failing(&knobs.fail_profile) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    if user_id != USER_ID {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(serde_json::json!({
        "name": USERNAME,
        "displayName": "Builderman",
        "description": "Welcome to Roblox!",
        "created": "2006-02-27T21:06:40.3Z",
    })))
}

async fn mock_presence(
    State(knobs): State<Arc<MockKnobs>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    knobs.presence_hits.fetch_add(1, Ordering::SeqCst);
    if failing(&knobs.fail_presence) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    if failing(&knobs.empty_presence) {
        return Ok(Json(serde_json::json!({ "userPresences": [] })));
    }
    Ok(Json(serde_json::json!({
        "userPresences": [{
            "userPresenceType": 2,
            "lastLocation": "Adopt Me!",
            "userId": USER_ID,
        }]
    })))
}

async fn mock_avatar(
    State(knobs): State<Arc<MockKnobs>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    knobs.avatar_hits.fetch_add(1, Ordering::SeqCst);
    if failing(&knobs.fail_avatar) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(serde_json::json!({
        "data": [{ "targetId": USER_ID, "imageUrl": AVATAR_URL }]
    })))
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub mock: MockRoblox,
    _server: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a server wired to a fresh mock upstream, cache enabled.
    pub async fn new() -> Self {
        Self::with_config_fn(|_| {}).await
    }

    /// Start a server with the cache disabled, so fatal upstream failures
    /// surface as errors instead of stale records.
    pub async fn without_cache() -> Self {
        Self::with_config_fn(|cfg| cfg.cache.enabled = false).await
    }

    /// Start a server after applying `adjust` to the default test config.
    pub async fn with_config_fn(adjust: impl FnOnce(&mut ServerConfig)) -> Self {
        let mock = MockRoblox::start().await;

        let mut config = ServerConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            web_root: "web".to_string(),
            roblox: RobloxApiConfig {
                call_timeout_secs: 2,
                ..RobloxApiConfig::single_host(&mock.base_url())
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 100,
            },
            limits: LimitsConfig {
                request_deadline_secs: 2,
                // Tests all come from 127.0.0.1; keep the limiter out of the way
                rate_limit_burst: 10_000.0,
                rate_limit_per_sec: 10_000.0,
                ..LimitsConfig::default()
            },
            ..ServerConfig::default()
        };
        adjust(&mut config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, _state) = build_app(config);
        let server = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            mock,
            _server: server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn get_json(&self, path: &str) -> (u16, serde_json::Value) {
        let resp = reqwest::get(format!("{}{path}", self.base_url()))
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}
