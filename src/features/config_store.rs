// Channel allow-list and cooldown configuration, persisted as JSON

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::models::guild::{ConfigData, GuildConfig, MAX_COOLDOWN};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of adding a channel to a guild's allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddChannel {
    Added,
    AlreadyPresent,
}

/// Result of removing a channel from a guild's allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveChannel {
    Removed,
    /// The guild has a configuration but the channel isn't in it
    NotFound,
    /// The guild has never been configured
    NoConfiguration,
}

/// A guild's allow-list as seen by callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelList {
    /// No allow-list, every channel may be used
    Unrestricted,
    Restricted(Vec<String>),
}

/// File-backed store of per-guild settings.
///
/// Every mutation holds the write lock until the file has been rewritten, so
/// there is a single writer at a time. If the write fails the in-memory change
/// is rolled back and memory keeps matching disk.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<ConfigData>,
    /// Set when `open` replaced an unreadable file with defaults. Until an
    /// admin changes something, `save` leaves that file alone.
    recovered: AtomicBool,
}

impl ConfigStore {
    /// Build a store around already-loaded data
    pub fn with_data(path: impl Into<PathBuf>, data: ConfigData) -> Self {
        Self {
            path: path.into(),
            data: RwLock::new(data),
            recovered: AtomicBool::new(false),
        }
    }

    /// Load the store from `path`.
    ///
    /// A missing file is not an error and yields the defaults. Missing fields
    /// are backfilled by the serde defaults on [`ConfigData`].
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, starting with defaults", path.display());
                return Ok(Self::with_data(path, ConfigData::default()));
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        match serde_json::from_str::<ConfigData>(&raw) {
            Ok(data) => {
                info!(
                    "Loaded config from {} ({} guilds)",
                    path.display(),
                    data.servers.len()
                );
                Ok(Self::with_data(path, data))
            }
            Err(source) => Err(ConfigError::Parse { path, source }),
        }
    }

    /// Load the store, falling back to defaults on any error
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(path.clone()).await {
            Ok(store) => store,
            Err(e) => {
                warn!("Error loading config, using defaults: {}", e);
                let store = Self::with_data(path, ConfigData::default());
                store.recovered.store(true, Ordering::SeqCst);
                store
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current state
    #[allow(dead_code)]
    pub async fn snapshot(&self) -> ConfigData {
        self.data.read().await.clone()
    }

    /// Write the whole store to disk, replacing the previous file.
    ///
    /// Skipped while the store only holds defaults standing in for a file
    /// that failed to load.
    pub async fn save(&self) -> Result<(), ConfigError> {
        let data = self.data.write().await;
        if self.recovered.load(Ordering::SeqCst) {
            warn!(
                "Not overwriting unreadable config at {} with defaults",
                self.path.display()
            );
            return Ok(());
        }
        write_config(&self.path, &data).await
    }

    /// Whether commands may run in `channel_id`.
    ///
    /// No guild context means no. A guild without an allow-list allows every
    /// channel.
    pub async fn is_channel_allowed(&self, guild_id: Option<&str>, channel_id: &str) -> bool {
        let Some(guild_id) = guild_id else {
            return false;
        };

        let data = self.data.read().await;
        match data.servers.get(guild_id) {
            Some(guild) if !guild.info_channels.is_empty() => {
                guild.info_channels.iter().any(|c| c == channel_id)
            }
            _ => true,
        }
    }

    pub async fn add_allowed_channel(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> Result<AddChannel, ConfigError> {
        self.mutate(|data| {
            let guild = data.servers.entry(guild_id.to_string()).or_default();
            if guild.info_channels.iter().any(|c| c == channel_id) {
                return (AddChannel::AlreadyPresent, false);
            }
            guild.info_channels.push(channel_id.to_string());
            (AddChannel::Added, true)
        })
        .await
    }

    pub async fn remove_allowed_channel(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> Result<RemoveChannel, ConfigError> {
        self.mutate(|data| {
            let Some(guild) = data.servers.get_mut(guild_id) else {
                return (RemoveChannel::NoConfiguration, false);
            };
            match guild.info_channels.iter().position(|c| c == channel_id) {
                Some(index) => {
                    guild.info_channels.remove(index);
                    (RemoveChannel::Removed, true)
                }
                None => (RemoveChannel::NotFound, false),
            }
        })
        .await
    }

    pub async fn list_allowed_channels(&self, guild_id: &str) -> ChannelList {
        let data = self.data.read().await;
        match data.servers.get(guild_id) {
            Some(guild) if !guild.info_channels.is_empty() => {
                ChannelList::Restricted(guild.info_channels.clone())
            }
            _ => ChannelList::Unrestricted,
        }
    }

    /// Guild cooldown override, or the global default, capped at [`MAX_COOLDOWN`]
    pub async fn effective_cooldown(&self, guild_id: &str) -> u64 {
        let data = self.data.read().await;
        data.servers
            .get(guild_id)
            .and_then(|g| g.config.cooldown)
            .unwrap_or(data.global_settings.default_cooldown)
            .min(MAX_COOLDOWN)
    }

    /// Guild daily limit override, or the global default. Not enforced.
    pub async fn effective_daily_limit(&self, guild_id: &str) -> u64 {
        let data = self.data.read().await;
        data.servers
            .get(guild_id)
            .and_then(|g| g.config.daily_limit)
            .unwrap_or(data.global_settings.default_daily_limit)
    }

    /// Set or clear (`None`) the guild's cooldown override.
    /// Values above [`MAX_COOLDOWN`] are clamped.
    pub async fn set_cooldown(&self, guild_id: &str, seconds: Option<u64>) -> Result<(), ConfigError> {
        let seconds = seconds.map(|s| s.min(MAX_COOLDOWN));
        self.mutate(|data| {
            let guild = data
                .servers
                .entry(guild_id.to_string())
                .or_insert_with(GuildConfig::default);
            let changed = guild.config.cooldown != seconds;
            guild.config.cooldown = seconds;
            ((), changed)
        })
        .await
    }

    /// Apply `f` under the write lock and persist when it reports a change
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut ConfigData) -> (T, bool),
    ) -> Result<T, ConfigError> {
        let mut data = self.data.write().await;
        let before = data.clone();

        let (outcome, changed) = f(&mut data);
        if changed {
            if let Err(e) = write_config(&self.path, &data).await {
                *data = before;
                return Err(e);
            }
            self.recovered.store(false, Ordering::SeqCst);
        }

        Ok(outcome)
    }
}

/// Serialize with 4-space indentation and swap the file in via rename
async fn write_config(path: &Path, data: &ConfigData) -> Result<(), ConfigError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut ser).map_err(ConfigError::Serialize)?;

    let tmp = path.with_extension("json.tmp");
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::write(&tmp, &buf).await.map_err(write_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_err)?;

    debug!("Saved config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}.json", name, rand::random::<u64>()))
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let store = ConfigStore::load(temp_path("missing")).await.unwrap();
        let data = store.snapshot().await;
        assert!(data.servers.is_empty());
        assert_eq!(data.global_settings.default_cooldown, 30);
        assert_eq!(data.global_settings.default_daily_limit, 30);
        assert!(!data.global_settings.default_all_channels);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error_but_open_recovers() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ConfigStore::load(path.clone()).await,
            Err(ConfigError::Parse { .. })
        ));

        let store = ConfigStore::open(path.clone()).await;
        assert_eq!(store.snapshot().await, ConfigData::default());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_save_keeps_unreadable_file() {
        let path = temp_path("trailing-comma");
        let original = r#"{"servers": {"1": {"info_channels": ["10"],}}}"#;
        std::fs::write(&path, original).unwrap();

        let store = ConfigStore::open(path.clone()).await;
        store.save().await.unwrap();

        let after = std::fs::read_to_string(&path).unwrap();
        assert_eq!(after, original);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_admin_change_replaces_unreadable_file() {
        let path = temp_path("replaced");
        std::fs::write(&path, "{ not json").unwrap();

        let store = ConfigStore::open(path.clone()).await;
        store.add_allowed_channel("1", "10").await.unwrap();
        store.save().await.unwrap();

        let reloaded = ConfigStore::load(path.clone()).await.unwrap();
        assert_eq!(
            reloaded.list_allowed_channels("1").await,
            ChannelList::Restricted(vec!["10".to_string()])
        );
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_missing_daily_limit_backfilled_on_load() {
        let path = temp_path("partial");
        std::fs::write(
            &path,
            r#"{"servers": {}, "global_settings": {"default_all_channels": false, "default_cooldown": 12}}"#,
        )
        .unwrap();

        let store = ConfigStore::load(path.clone()).await.unwrap();
        let data = store.snapshot().await;
        assert_eq!(data.global_settings.default_cooldown, 12);
        assert_eq!(data.global_settings.default_daily_limit, 30);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_unrestricted_guild_allows_every_channel() {
        let store = ConfigStore::with_data(temp_path("open"), ConfigData::default());
        assert!(store.is_channel_allowed(Some("1"), "10").await);
        assert!(store.is_channel_allowed(Some("1"), "99999").await);
    }

    #[tokio::test]
    async fn test_no_guild_context_denied() {
        let store = ConfigStore::with_data(temp_path("dm"), ConfigData::default());
        assert!(!store.is_channel_allowed(None, "10").await);
    }

    #[tokio::test]
    async fn test_restricted_guild_checks_membership() {
        let path = temp_path("restricted");
        let store = ConfigStore::with_data(path.clone(), ConfigData::default());
        store.add_allowed_channel("1", "10").await.unwrap();
        store.add_allowed_channel("1", "11").await.unwrap();

        assert!(store.is_channel_allowed(Some("1"), "10").await);
        assert!(store.is_channel_allowed(Some("1"), "11").await);
        assert!(!store.is_channel_allowed(Some("1"), "12").await);
        // other guilds are unaffected
        assert!(store.is_channel_allowed(Some("2"), "12").await);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let path = temp_path("idempotent");
        let store = ConfigStore::with_data(path.clone(), ConfigData::default());

        assert_eq!(store.add_allowed_channel("1", "10").await.unwrap(), AddChannel::Added);
        assert_eq!(
            store.add_allowed_channel("1", "10").await.unwrap(),
            AddChannel::AlreadyPresent
        );
        assert_eq!(
            store.list_allowed_channels("1").await,
            ChannelList::Restricted(vec!["10".to_string()])
        );
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_remove_outcomes() {
        let path = temp_path("remove");
        let store = ConfigStore::with_data(path.clone(), ConfigData::default());

        assert_eq!(
            store.remove_allowed_channel("1", "10").await.unwrap(),
            RemoveChannel::NoConfiguration
        );

        store.add_allowed_channel("1", "10").await.unwrap();
        assert_eq!(
            store.remove_allowed_channel("1", "11").await.unwrap(),
            RemoveChannel::NotFound
        );
        assert_eq!(
            store.remove_allowed_channel("1", "10").await.unwrap(),
            RemoveChannel::Removed
        );
        assert_eq!(store.list_allowed_channels("1").await, ChannelList::Unrestricted);
        // the guild entry stays, so this is now "not found"
        assert_eq!(
            store.remove_allowed_channel("1", "10").await.unwrap(),
            RemoveChannel::NotFound
        );
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_effective_cooldown() {
        let path = temp_path("cooldown");
        let store = ConfigStore::with_data(path.clone(), ConfigData::default());
        assert_eq!(store.effective_cooldown("1").await, 30);

        store.set_cooldown("1", Some(5)).await.unwrap();
        assert_eq!(store.effective_cooldown("1").await, 5);
        assert_eq!(store.effective_cooldown("2").await, 30);

        store.set_cooldown("1", None).await.unwrap();
        assert_eq!(store.effective_cooldown("1").await, 30);
        assert_eq!(store.effective_daily_limit("1").await, 30);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_cooldown_clamped_to_max() {
        let path = temp_path("clamp");
        let mut data = ConfigData::default();
        data.global_settings.default_cooldown = 999_999;
        let store = ConfigStore::with_data(path.clone(), data);
        assert_eq!(store.effective_cooldown("2").await, MAX_COOLDOWN);

        store.set_cooldown("1", Some(200_000)).await.unwrap();
        assert_eq!(store.effective_cooldown("1").await, MAX_COOLDOWN);
        assert_eq!(
            store.snapshot().await.servers["1"].config.cooldown,
            Some(MAX_COOLDOWN)
        );
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let path = temp_path("roundtrip");
        let store = ConfigStore::with_data(path.clone(), ConfigData::default());
        store.add_allowed_channel("100", "1").await.unwrap();
        store.add_allowed_channel("100", "2").await.unwrap();
        store.add_allowed_channel("200", "3").await.unwrap();
        store.set_cooldown("200", Some(0)).await.unwrap();
        store.save().await.unwrap();

        let reloaded = ConfigStore::load(path.clone()).await.unwrap();
        assert_eq!(reloaded.snapshot().await, store.snapshot().await);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"info_channels\""));
        assert!(raw.contains("\n    \"global_settings\""));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let path = std::env::temp_dir()
            .join(format!("no-such-dir-{}", rand::random::<u64>()))
            .join("config.json");
        let store = ConfigStore::with_data(path, ConfigData::default());

        let result = store.add_allowed_channel("1", "10").await;
        assert!(matches!(result, Err(ConfigError::Write { .. })));
        assert_eq!(store.list_allowed_channels("1").await, ChannelList::Unrestricted);
        assert!(store.snapshot().await.servers.is_empty());
    }
}
