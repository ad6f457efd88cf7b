pub mod client;
pub mod config;

pub use client::{GameStats, RobloxClient, UpstreamError, UserPresence, UserProfile};
pub use config::RobloxApiConfig;
