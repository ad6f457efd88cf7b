use serde::Deserialize;

use bloxtrack_roblox::RobloxApiConfig;

/// Top-level server configuration, loaded from `bloxtrack.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    pub auth: AuthFileConfig,
    pub roblox: RobloxApiConfig,
    pub cache: CacheConfig,
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            web_root: "web".to_string(),
            auth: AuthFileConfig::default(),
            roblox: RobloxApiConfig::default(),
            cache: CacheConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Auth section of the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthFileConfig {
    /// HMAC secret for bearer tokens. None = a random per-process secret is
    /// generated at startup, so tokens do not survive a restart.
    pub token_secret: Option<String>,
    /// Lifetime of an issued bearer token.
    pub token_ttl_secs: u64,
}

impl Default for AuthFileConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_secs: 86_400,
        }
    }
}

/// Last-known-good summary cache settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 500,
        }
    }
}

/// Infrastructure limits (deadlines, rate limits, account caps).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Whole-request deadline for a lookup; pending upstream calls are
    /// cancelled when it expires.
    pub request_deadline_secs: u64,
    /// Lookup endpoint rate limit: max burst tokens per IP.
    pub rate_limit_burst: f64,
    /// Lookup endpoint rate limit: token refill rate (requests per second) per IP.
    pub rate_limit_per_sec: f64,
    /// Maximum registered accounts held in the in-memory store.
    pub max_accounts: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_deadline_secs: 10,
            rate_limit_burst: 20.0,
            rate_limit_per_sec: 2.0, // ~120 req/min
            max_accounts: 10_000,
        }
    }
}

impl ServerConfig {
    /// Validate configuration, logging errors and exiting on fatal issues.
    pub fn validate(&self) {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            tracing::error!(
                addr = %self.listen_addr,
                "listen_addr is not a valid socket address"
            );
            std::process::exit(1);
        }

        if self.auth.token_secret.is_some() {
            tracing::warn!(
                "token_secret is set in config file — use BLOXTRACK_TOKEN_SECRET env var in production"
            );
        }
        if self.auth.token_ttl_secs == 0 {
            tracing::error!("auth.token_ttl_secs must be > 0");
            std::process::exit(1);
        }

        if self.roblox.call_timeout_secs == 0 {
            tracing::error!("roblox.call_timeout_secs must be > 0");
            std::process::exit(1);
        }
        if self.limits.request_deadline_secs == 0 {
            tracing::error!("limits.request_deadline_secs must be > 0");
            std::process::exit(1);
        }
        if self.limits.request_deadline_secs <= self.roblox.call_timeout_secs {
            tracing::warn!(
                "request deadline ({}s) does not exceed the per-call timeout ({}s); \
                 the deadline will fire first on any slow call",
                self.limits.request_deadline_secs,
                self.roblox.call_timeout_secs
            );
        }

        if self.limits.rate_limit_burst <= 0.0 {
            tracing::error!("limits.rate_limit_burst must be > 0");
            std::process::exit(1);
        }
        if self.limits.rate_limit_per_sec <= 0.0 {
            tracing::error!("limits.rate_limit_per_sec must be > 0");
            std::process::exit(1);
        }
        if self.limits.max_accounts == 0 {
            tracing::error!("limits.max_accounts must be > 0");
            std::process::exit(1);
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            tracing::error!("cache.max_entries must be > 0 when the cache is enabled");
            std::process::exit(1);
        }
    }

    /// Load config from `bloxtrack.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("bloxtrack.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from bloxtrack.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse bloxtrack.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No bloxtrack.toml found, using defaults");
                ServerConfig::default()
            },
        };

        if let Ok(addr) = std::env::var("BLOXTRACK_LISTEN_ADDR")
            && !addr.is_empty()
        {
            config.listen_addr = addr;
        }
        if let Ok(root) = std::env::var("BLOXTRACK_WEB_ROOT")
            && !root.is_empty()
        {
            config.web_root = root;
        }
        if let Ok(secret) = std::env::var("BLOXTRACK_TOKEN_SECRET")
            && !secret.is_empty()
        {
            config.auth.token_secret = Some(secret);
        }
        if let Ok(val) = std::env::var("BLOXTRACK_REQUEST_DEADLINE_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.limits.request_deadline_secs = n;
        }
        if let Ok(val) = std::env::var("BLOXTRACK_CACHE_ENABLED")
            && let Ok(b) = val.parse::<bool>()
        {
            config.cache.enabled = b;
        }

        config
    }
}
