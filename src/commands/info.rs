// Info command - look up a Free Fire player

use std::time::Instant;

use poise::serenity_prelude as serenity;
use tracing::{debug, error};

use crate::api::profile::{self, PlayerProfile, Section};
use crate::features::access::{check_access, Access, DenyReason};
use crate::utils::config::colors;
use crate::utils::formatters::{format_unix_timestamp, is_valid_uid};
use crate::{Context, Error};

const NOT_FOUND: &str = "Not found";

/// Displays information about a Free Fire player
#[poise::command(slash_command, prefix_command)]
pub async fn info(
    ctx: Context<'_>,
    #[description = "FREE FIRE UID"] uid: String,
) -> Result<(), Error> {
    if !is_valid_uid(&uid) {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ Invalid UID! It must be numeric and at least 6 digits long.")
                .reply(true),
        )
        .await?;
        return Ok(());
    }

    let data = ctx.data();
    let guild_id = ctx.guild_id().map(|id| id.to_string());
    let channel_id = ctx.channel_id().to_string();

    let access = check_access(
        &data.config,
        &data.rate_limiter,
        guild_id.as_deref(),
        &channel_id,
        ctx.author().id.get(),
        Instant::now(),
    )
    .await;

    let refusal = match access {
        Access::Allowed => None,
        Access::Denied(DenyReason::NoGuild) => {
            Some("This command can only be used in a server.".to_string())
        }
        Access::Denied(DenyReason::ChannelNotAllowed) => {
            Some("🚫 This command is not allowed in this channel.".to_string())
        }
        Access::Throttled { remaining_secs } => Some(format!(
            "⏱ Please wait {}s before using this command again",
            remaining_secs
        )),
    };
    if let Some(message) = refusal {
        debug!("Refused info for {}: {:?}", ctx.author().id, access);
        ctx.send(poise::CreateReply::default().content(message).ephemeral(true))
            .await?;
        return Ok(());
    }

    ctx.defer().await?;

    let player = match profile::fetch_profile(&data.http_client, &data.settings.info_api_url, &uid).await {
        Ok(Some(player)) => player,
        Ok(None) => {
            ctx.say(format!("❌ Player with UID `{}` not found.", uid)).await?;
            return Ok(());
        }
        Err(e) => {
            error!("Failed to fetch profile {}: {:?}", uid, e);
            ctx.say("⚠️ API error. Try again later.").await?;
            return Ok(());
        }
    };

    ctx.say(profile::card_url(&data.settings.card_api_url, &uid)).await?;

    let mut embed = serenity::CreateEmbed::new()
        .title("Player Information")
        .color(colors::SUCCESS)
        .thumbnail(ctx.author().face())
        .footer(serenity::CreateEmbedFooter::new("DEVELOPED BY MIDOU X CHEAT"))
        .timestamp(serenity::Timestamp::now());
    for (name, value) in profile_fields(&player, &uid) {
        embed = embed.field(name, value, false);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

fn timestamp_of(section: &Section, key: &str) -> String {
    format_unix_timestamp(section.int(key).unwrap_or(0))
}

fn rank(section: &Section, show_key: &str, points_key: &str) -> String {
    if section.flag(show_key) {
        section.text(points_key, "?")
    } else {
        NOT_FOUND.to_string()
    }
}

/// Embed sections for a profile, as (title, body) pairs
pub fn profile_fields(player: &PlayerProfile, uid: &str) -> Vec<(&'static str, String)> {
    let basic = &player.basic_info;
    let captain = &player.captain_basic_info;
    let clan = &player.clan_basic_info;
    let pet = &player.pet_info;
    let profile_info = &player.profile_info;

    let signature = match player.social_info.text("signature", "") {
        s if s.trim().is_empty() => "None".to_string(),
        s => s,
    };

    let mut fields = vec![
        (
            "ACCOUNT BASIC INFO",
            [
                format!("Name: {}", basic.text("nickname", NOT_FOUND)),
                format!("UID: `{}`", uid),
                format!(
                    "Level: {} (Exp: {})",
                    basic.text("level", NOT_FOUND),
                    basic.text("exp", "?")
                ),
                format!("Region: {}", basic.text("region", NOT_FOUND)),
                format!("Likes: {}", basic.text("liked", NOT_FOUND)),
                format!(
                    "Honor Score: {}",
                    player.credit_score_info.text("creditScore", NOT_FOUND)
                ),
                format!("Signature: {}", signature),
            ]
            .join("\n"),
        ),
        (
            "ACCOUNT ACTIVITY",
            [
                format!("Most Recent OB: {}", basic.text("releaseVersion", "?")),
                format!("Current BP Badges: {}", basic.text("badgeCnt", NOT_FOUND)),
                format!("BR Rank: {}", rank(basic, "showBrRank", "rankingPoints")),
                format!("CS Rank: {}", rank(basic, "showCsRank", "csRankingPoints")),
                format!("Created At: {}", timestamp_of(basic, "createAt")),
                format!("Last Login: {}", timestamp_of(basic, "lastLoginAt")),
            ]
            .join("\n"),
        ),
        (
            "ACCOUNT OVERVIEW",
            [
                format!("Avatar ID: {}", profile_info.text("avatarId", NOT_FOUND)),
                format!("Banner ID: {}", basic.text("bannerId", NOT_FOUND)),
                format!(
                    "Pin ID: {}",
                    if captain.is_present() {
                        captain.text("pinId", NOT_FOUND)
                    } else {
                        "Default".to_string()
                    }
                ),
                format!(
                    "Equipped Skills: {}",
                    profile_info.text("equipedSkills", NOT_FOUND)
                ),
            ]
            .join("\n"),
        ),
        (
            "PET DETAILS",
            [
                format!(
                    "Equipped?: {}",
                    if pet.flag("isSelected") { "Yes" } else { "Not Found" }
                ),
                format!("Pet Name: {}", pet.text("name", "Not Found")),
                format!("Pet Exp: {}", pet.text("exp", "Not Found")),
                format!("Pet Level: {}", pet.text("level", "Not Found")),
            ]
            .join("\n"),
        ),
    ];

    if clan.is_present() {
        let mut lines = vec![
            format!("Guild Name: {}", clan.text("clanName", NOT_FOUND)),
            format!("Guild ID: `{}`", clan.text("clanId", NOT_FOUND)),
            format!("Guild Level: {}", clan.text("clanLevel", NOT_FOUND)),
            format!(
                "Live Members: {}/{}",
                clan.text("memberNum", NOT_FOUND),
                clan.text("capacity", "?")
            ),
        ];
        if captain.is_present() {
            lines.extend([
                format!("Leader Name: {}", captain.text("nickname", NOT_FOUND)),
                format!("Leader UID: `{}`", captain.text("accountId", NOT_FOUND)),
                format!(
                    "Leader Level: {} (Exp: {})",
                    captain.text("level", NOT_FOUND),
                    captain.text("exp", "?")
                ),
                format!("Last Login: {}", timestamp_of(captain, "lastLoginAt")),
                format!("Title: {}", captain.text("title", NOT_FOUND)),
                format!("BP Badges: {}", captain.text("badgeCnt", "?")),
                format!("BR Rank: {}", rank(captain, "showBrRank", "rankingPoints")),
                format!("CS Rank: {}", rank(captain, "showCsRank", "csRankingPoints")),
            ]);
        }
        fields.push(("GUILD INFO", lines.join("\n")));
    }

    fields
}
