// Help command - show usage guide

use poise::serenity_prelude as serenity;
use crate::{Context, Error};
use crate::utils::config::colors;

/// Show help and usage guide
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("📚 Info Bot - Help")
        .description("Free Fire player lookups for your server")
        .color(colors::PRIMARY)
        .field(
            "🔎 Player Info",
            "`/info <uid>` - Show a player's profile card and details\n\
            The UID must be numeric and at least 6 digits",
            false,
        )
        .field(
            "⚙️ Configuration",
            "`/infochannel add` - Allow info commands in a channel\n\
            `/infochannel remove` - Remove an allowed channel\n\
            `/infochannel list` - View allowed channels and cooldown\n\
            `/infochannel cooldown` - Set the per-user cooldown",
            false,
        )
        .field(
            "🛡️ Moderation",
            "• Mentioning an admin: warning, then a 1 hour mute\n\
            • Posting links: deleted, warning, then a 1 hour mute",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(
            "Built with Serenity & Poise",
        ));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
