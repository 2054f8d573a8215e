// Centralized configuration for the info bot

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Default location of the persisted channel configuration
pub const DEFAULT_CONFIG_PATH: &str = "info_channels.json";

/// Player info API endpoint
pub const DEFAULT_INFO_API_URL: &str = "https://rawthug.onrender.com/info";

/// Profile card image generator endpoint
pub const DEFAULT_CARD_API_URL: &str = "https://profile-generator.up.railway.app/api/profile_card";

/// Port for the keep-alive endpoint
pub const DEFAULT_PORT: u16 = 8080;

/// Maximum number of users tracked by the cooldown cache
pub const DEFAULT_COOLDOWN_CAPACITY: usize = 10_000;

/// Seconds to wait for the profile API before giving up
pub const HTTP_TIMEOUT_SECS: u64 = 15;

/// Mute applied on a repeated moderation violation (1 hour)
pub const MUTE_DURATION_SECS: i64 = 60 * 60;

/// Discord embed colors
pub mod colors {
    pub const PRIMARY: u32 = 0x00bfff;
    pub const SUCCESS: u32 = 0x2ecc71;
    pub const ERROR: u32 = 0xff0000;
    pub const WARNING: u32 = 0xffff00;
    pub const INFO: u32 = 0x3498db;
}

/// Runtime settings read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: String,
    pub config_path: String,
    pub info_api_url: String,
    pub card_api_url: String,
    pub admin_ids: Vec<u64>,
    pub port: u16,
    pub cooldown_capacity: usize,
}

impl Settings {
    /// Read settings from the environment. Only `DISCORD_TOKEN` is required.
    pub fn from_env() -> Result<Self, env::VarError> {
        let discord_token = env::var("DISCORD_TOKEN")?;

        Ok(Self {
            discord_token,
            config_path: env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
            info_api_url: env::var("INFO_API_URL").unwrap_or_else(|_| DEFAULT_INFO_API_URL.to_string()),
            card_api_url: env::var("CARD_API_URL").unwrap_or_else(|_| DEFAULT_CARD_API_URL.to_string()),
            admin_ids: env::var("ADMIN_IDS")
                .map(|raw| parse_id_list(&raw))
                .unwrap_or_default(),
            port: parse_or("PORT", DEFAULT_PORT),
            cooldown_capacity: parse_or("COOLDOWN_CAPACITY", DEFAULT_COOLDOWN_CAPACITY),
        })
    }
}

/// Parse a comma-separated list of Discord ids, skipping junk entries
pub fn parse_id_list(raw: &str) -> Vec<u64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Ignoring invalid id in ADMIN_IDS: {}", s);
                None
            }
        })
        .collect()
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value for {}: {:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("1, 2,3"), vec![1, 2, 3]);
        assert_eq!(parse_id_list(""), Vec::<u64>::new());
    }

    #[test]
    fn test_parse_id_list_skips_garbage() {
        assert_eq!(parse_id_list("42,abc,,7"), vec![42, 7]);
    }
}
