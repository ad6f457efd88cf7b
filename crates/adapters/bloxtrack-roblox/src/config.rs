use serde::Deserialize;

/// Base URLs and timeouts for the five Roblox API services.
///
/// Each service is addressed independently so tests (and self-hosted mirrors)
/// can point individual services at a local stand-in.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RobloxApiConfig {
    /// apis.roblox.com — place → universe resolution.
    pub apis_url: String,
    /// games.roblox.com — per-universe game stats.
    pub games_url: String,
    /// thumbnails.roblox.com — game icons and avatar headshots.
    pub thumbnails_url: String,
    /// users.roblox.com — username resolution and profiles.
    pub users_url: String,
    /// presence.roblox.com — real-time user presence.
    pub presence_url: String,
    /// Timeout applied to each upstream call, independent of siblings.
    pub call_timeout_secs: u64,
}

impl Default for RobloxApiConfig {
    fn default() -> Self {
        Self {
            apis_url: "https://apis.roblox.com".to_string(),
            games_url: "https://games.roblox.com".to_string(),
            thumbnails_url: "https://thumbnails.roblox.com".to_string(),
            users_url: "https://users.roblox.com".to_string(),
            presence_url: "https://presence.roblox.com".to_string(),
            call_timeout_secs: 5,
        }
    }
}

impl RobloxApiConfig {
    /// Point every service at one base URL. Test seam.
    pub fn single_host(base: &str) -> Self {
        Self {
            apis_url: base.to_string(),
            games_url: base.to_string(),
            thumbnails_url: base.to_string(),
            users_url: base.to_string(),
            presence_url: base.to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_production_services() {
        let cfg = RobloxApiConfig::default();
        assert_eq!(cfg.apis_url, "https://apis.roblox.com");
        assert_eq!(cfg.call_timeout_secs, 5);
    }

    #[test]
    fn single_host_rewrites_every_service() {
        let cfg = RobloxApiConfig::single_host("http://127.0.0.1:9000");
        assert_eq!(cfg.games_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.presence_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.call_timeout_secs, 5);
    }
}
