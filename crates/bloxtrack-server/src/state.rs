use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use bloxtrack_roblox::RobloxClient;

use crate::accounts::UserStore;
use crate::auth::AuthConfig;
use crate::cache::SummaryCache;
use crate::config::ServerConfig;
use crate::rate_limit::IpRateLimiter;

pub type SharedSummaryCache = Arc<RwLock<SummaryCache>>;
pub type SharedUserStore = Arc<RwLock<UserStore>>;

#[derive(Clone)]
pub struct AppState {
    pub roblox: Arc<RobloxClient>,
    pub cache: SharedSummaryCache,
    pub users: SharedUserStore,
    pub auth: AuthConfig,
    pub limiter: Arc<IpRateLimiter>,
    pub config: Arc<ServerConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let auth = AuthConfig::from_file_config(&config.auth);
        let limiter = IpRateLimiter::new(
            config.limits.rate_limit_burst,
            config.limits.rate_limit_per_sec,
        );
        Self {
            roblox: Arc::new(RobloxClient::new(config.roblox.clone())),
            cache: Arc::new(RwLock::new(SummaryCache::with_capacity(
                config.cache.max_entries,
            ))),
            users: Arc::new(RwLock::new(UserStore::with_capacity(
                config.limits.max_accounts,
            ))),
            auth,
            limiter: Arc::new(limiter),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}
