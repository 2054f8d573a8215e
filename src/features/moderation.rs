// Moderation - admin mention and link spam rules
// First offence gets a warning, the second a one-hour timeout.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use poise::serenity_prelude as serenity;
use regex::Regex;
use poise::serenity_prelude::Mentionable;
use tracing::{debug, warn};

use crate::utils::config::{colors, MUTE_DURATION_SECS};
use crate::Data;

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    AdminMention,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Warn,
    Mute,
}

#[derive(Debug, Default, Clone, Copy)]
struct Strikes {
    mention: u32,
    link: u32,
}

/// Per-user strike counters, one per violation kind
#[derive(Debug, Default)]
pub struct ModerationTracker {
    strikes: DashMap<u64, Strikes>,
}

impl ModerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a violation and return what to do about it.
    /// A mute resets that counter.
    pub fn record(&self, user_id: u64, violation: Violation) -> Action {
        let mut entry = self.strikes.entry(user_id).or_default();
        let counter = match violation {
            Violation::AdminMention => &mut entry.mention,
            Violation::Link => &mut entry.link,
        };

        *counter += 1;
        let action = if *counter >= 2 {
            *counter = 0;
            Action::Mute
        } else {
            Action::Warn
        };

        drop(entry);
        // Re-checked under the shard lock, a concurrent strike keeps the entry
        self.strikes
            .remove_if(&user_id, |_, s| s.mention == 0 && s.link == 0);

        action
    }

    #[allow(dead_code)]
    pub fn strikes(&self, user_id: u64, violation: Violation) -> u32 {
        self.strikes
            .get(&user_id)
            .map(|s| match violation {
                Violation::AdminMention => s.mention,
                Violation::Link => s.link,
            })
            .unwrap_or(0)
    }
}

pub fn contains_link(content: &str) -> bool {
    URL_REGEX.is_match(content)
}

pub fn mentions_admin(mentioned: &[serenity::User], admin_ids: &[u64]) -> bool {
    mentioned.iter().any(|u| admin_ids.contains(&u.id.get()))
}

/// Apply the moderation rules to a new guild message
pub async fn handle_moderation_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), anyhow::Error> {
    if msg.author.bot {
        return Ok(());
    }
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };
    let user_id = msg.author.id.get();
    if data.settings.admin_ids.contains(&user_id) {
        return Ok(());
    }

    // A failing rule is logged and never stops the next one
    for violation in violations(msg, &data.settings.admin_ids) {
        let action = data.moderation.record(user_id, violation);
        debug!("{:?} by {}: {:?}", violation, user_id, action);

        if violation == Violation::Link {
            if let Err(e) = msg.delete(&ctx.http).await {
                warn!("Could not delete link message {}: {:?}", msg.id, e);
            }
        }
        if let Err(e) = enforce(ctx, msg, guild_id, action, violation).await {
            warn!("Failed to enforce {:?} rule for {}: {:?}", violation, user_id, e);
        }
    }

    Ok(())
}

/// Rules broken by a message, in the order they are enforced
pub fn violations(msg: &serenity::Message, admin_ids: &[u64]) -> Vec<Violation> {
    let mut found = Vec::new();
    if mentions_admin(&msg.mentions, admin_ids) {
        found.push(Violation::AdminMention);
    }
    if contains_link(&msg.content) {
        found.push(Violation::Link);
    }
    found
}

async fn enforce(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    guild_id: serenity::GuildId,
    action: Action,
    violation: Violation,
) -> Result<(), anyhow::Error> {
    let mention = msg.author.mention();

    let embed = match action {
        Action::Warn => {
            let text = match violation {
                Violation::AdminMention => "you mentioned an admin. Next time you will be muted ⚠️",
                Violation::Link => "you can't send links. Next time you will be muted ⚠️",
            };
            serenity::CreateEmbed::new()
                .description(format!("**{} {}**", mention, text))
                .color(colors::WARNING)
        }
        Action::Mute => {
            let until = chrono::Utc::now().timestamp() + MUTE_DURATION_SECS;
            let result = match serenity::Timestamp::from_unix_timestamp(until) {
                Ok(ts) => guild_id
                    .edit_member(
                        &ctx.http,
                        msg.author.id,
                        serenity::EditMember::new().disable_communication_until_datetime(ts),
                    )
                    .await
                    .map(|_| ())
                    .map_err(anyhow::Error::from),
                Err(e) => Err(anyhow::anyhow!("invalid mute timestamp: {}", e)),
            };

            if let Err(e) = result {
                warn!("Failed to mute {}: {:?}", msg.author.id, e);
                msg.channel_id
                    .say(&ctx.http, format!("❌ Could not mute the member: {}", e))
                    .await?;
                return Ok(());
            }

            let reason = match violation {
                Violation::AdminMention => "repeatedly mentioning an admin",
                Violation::Link => "repeatedly posting links",
            };
            serenity::CreateEmbed::new()
                .description(format!("**{} has been muted for one hour for {} ⛔**", mention, reason))
                .color(colors::ERROR)
        }
    };

    msg.channel_id
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
        .await?;

    Ok(())
}
