// Combined channel + cooldown check run before any profile fetch

use std::time::{Duration, Instant};

use crate::features::config_store::ConfigStore;
use crate::features::rate_limiter::{Cooldown, RateLimiter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Invoked outside a guild
    NoGuild,
    ChannelNotAllowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied(DenyReason),
    Throttled { remaining_secs: u64 },
}

/// Decide whether `user_id` may run a rate-limited command in this channel.
///
/// The channel check comes first so a denied invocation never starts a
/// cooldown.
pub async fn check_access(
    store: &ConfigStore,
    limiter: &RateLimiter,
    guild_id: Option<&str>,
    channel_id: &str,
    user_id: u64,
    now: Instant,
) -> Access {
    let Some(guild) = guild_id else {
        return Access::Denied(DenyReason::NoGuild);
    };

    if !store.is_channel_allowed(Some(guild), channel_id).await {
        return Access::Denied(DenyReason::ChannelNotAllowed);
    }

    let cooldown = Duration::from_secs(store.effective_cooldown(guild).await);
    match limiter.check_at(user_id, cooldown, now).await {
        Cooldown::Allowed => Access::Allowed,
        Cooldown::Throttled { remaining_secs } => Access::Throttled { remaining_secs },
    }
}
