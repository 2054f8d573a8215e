use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::features::config_store::{AddChannel, ChannelList, RemoveChannel};
use crate::utils::config::colors;
use crate::utils::formatters::channel_mention;
use crate::{Context, Error};

/// Manage where info commands may be used
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("add", "remove", "list", "cooldown")
)]
pub async fn infochannel(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

fn guild_key(ctx: &Context<'_>) -> Option<String> {
    ctx.guild_id().map(|id| id.to_string())
}

async fn reply_embed(ctx: Context<'_>, title: &str, description: String, color: u32) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(color);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Allow info commands in a channel
#[poise::command(slash_command, prefix_command)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Channel to allow"] channel: serenity::Channel,
) -> Result<(), Error> {
    let Some(guild_id) = guild_key(&ctx) else {
        ctx.say("This command can only be used in a server.").await?;
        return Ok(());
    };
    let channel_id = channel.id().to_string();

    match ctx.data().config.add_allowed_channel(&guild_id, &channel_id).await {
        Ok(AddChannel::Added) => {
            info!("Guild {} allowed channel {}", guild_id, channel_id);
            reply_embed(
                ctx,
                "Channel Added",
                format!("Info commands are now allowed in {}", channel_mention(&channel_id)),
                colors::SUCCESS,
            )
            .await
        }
        Ok(AddChannel::AlreadyPresent) => {
            reply_embed(
                ctx,
                "Already Allowed",
                format!("{} is already in the list", channel_mention(&channel_id)),
                colors::WARNING,
            )
            .await
        }
        Err(e) => {
            error!("Failed to save channel config: {:?}", e);
            ctx.say("Failed to save configuration.").await?;
            Ok(())
        }
    }
}

/// Stop allowing info commands in a channel
#[poise::command(slash_command, prefix_command)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Channel to remove"] channel: serenity::Channel,
) -> Result<(), Error> {
    let Some(guild_id) = guild_key(&ctx) else {
        ctx.say("This command can only be used in a server.").await?;
        return Ok(());
    };
    let channel_id = channel.id().to_string();

    match ctx.data().config.remove_allowed_channel(&guild_id, &channel_id).await {
        Ok(RemoveChannel::Removed) => {
            info!("Guild {} removed channel {}", guild_id, channel_id);
            reply_embed(
                ctx,
                "Channel Removed",
                format!("{} was removed from the list", channel_mention(&channel_id)),
                colors::SUCCESS,
            )
            .await
        }
        Ok(RemoveChannel::NotFound) => {
            reply_embed(
                ctx,
                "Not Found",
                format!("{} is not in the list", channel_mention(&channel_id)),
                colors::WARNING,
            )
            .await
        }
        Ok(RemoveChannel::NoConfiguration) => {
            reply_embed(
                ctx,
                "No Configuration",
                "This server has no channel configuration yet.".to_string(),
                colors::WARNING,
            )
            .await
        }
        Err(e) => {
            error!("Failed to save channel config: {:?}", e);
            ctx.say("Failed to save configuration.").await?;
            Ok(())
        }
    }
}

/// Show the channels where info commands are allowed
#[poise::command(slash_command, prefix_command)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = guild_key(&ctx) else {
        ctx.say("This command can only be used in a server.").await?;
        return Ok(());
    };

    let config = &ctx.data().config;
    let channels = match config.list_allowed_channels(&guild_id).await {
        ChannelList::Unrestricted => "All channels are allowed.".to_string(),
        ChannelList::Restricted(ids) => ids
            .iter()
            .map(|id| format!("• {}", channel_mention(id)))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    let cooldown = config.effective_cooldown(&guild_id).await;
    let daily_limit = config.effective_daily_limit(&guild_id).await;

    let embed = serenity::CreateEmbed::new()
        .title("Info Channels")
        .description(channels)
        .field("Cooldown", format!("{}s", cooldown), true)
        .field("Daily Limit", format!("{} (not enforced)", daily_limit), true)
        .color(colors::INFO);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Set the per-user cooldown for this server
#[poise::command(slash_command, prefix_command)]
pub async fn cooldown(
    ctx: Context<'_>,
    #[description = "Seconds between uses (leave empty for the default)"]
    #[max = 86400]
    seconds: Option<u64>,
) -> Result<(), Error> {
    let Some(guild_id) = guild_key(&ctx) else {
        ctx.say("This command can only be used in a server.").await?;
        return Ok(());
    };

    let config = &ctx.data().config;
    if let Err(e) = config.set_cooldown(&guild_id, seconds).await {
        error!("Failed to save cooldown: {:?}", e);
        ctx.say("Failed to save configuration.").await?;
        return Ok(());
    }

    let effective = config.effective_cooldown(&guild_id).await;
    info!("Guild {} cooldown set to {:?}", guild_id, seconds);
    reply_embed(
        ctx,
        "Cooldown Updated",
        format!("Users must now wait **{}s** between info commands", effective),
        colors::SUCCESS,
    )
    .await
}
