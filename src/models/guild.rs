use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_COOLDOWN: u64 = 30;
pub const DEFAULT_DAILY_LIMIT: u64 = 30;
/// Longest cooldown a guild can configure (24 hours)
pub const MAX_COOLDOWN: u64 = 24 * 60 * 60;

fn default_cooldown() -> u64 {
    DEFAULT_COOLDOWN
}

fn default_daily_limit() -> u64 {
    DEFAULT_DAILY_LIMIT
}

/// Whole persisted configuration file
///
/// Every field carries a serde default so that older or hand-edited files
/// are repaired on load instead of rejected.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ConfigData {
    /// Guild id -> guild configuration
    #[serde(default)]
    pub servers: BTreeMap<String, GuildConfig>,
    #[serde(default)]
    pub global_settings: GlobalSettings,
}

/// Fallback values for guilds without an override
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GlobalSettings {
    /// Reserved default for new guilds
    #[serde(default)]
    pub default_all_channels: bool,
    #[serde(default = "default_cooldown")]
    pub default_cooldown: u64,
    /// Reserved, not enforced
    #[serde(default = "default_daily_limit")]
    pub default_daily_limit: u64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            default_all_channels: false,
            default_cooldown: DEFAULT_COOLDOWN,
            default_daily_limit: DEFAULT_DAILY_LIMIT,
        }
    }
}

/// Guild (Server) specific configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GuildConfig {
    /// Channels where info commands are allowed; empty means every channel
    #[serde(default)]
    pub info_channels: Vec<String>,
    #[serde(default)]
    pub config: GuildSettings,
}

/// Per-guild overrides
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GuildSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<u64>,
    /// Keys written by other tools, kept as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
