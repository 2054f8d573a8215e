// Info Bot
// A Discord bot for Free Fire player lookups with light moderation

mod commands;
mod api;
mod features;
mod models;
mod utils;

use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::features::config_store::ConfigStore;
use crate::features::moderation::{self, ModerationTracker};
use crate::features::rate_limiter::RateLimiter;
use crate::features::keep_alive;
use crate::models::guild::MAX_COOLDOWN;
use crate::utils::config::{Settings, HTTP_TIMEOUT_SECS};

/// How often stale cooldown entries are dropped
const PRUNE_INTERVAL: Duration = Duration::from_secs(10 * 60);
/// Cooldown entries older than the longest allowed cooldown are never consulted again
const COOLDOWN_RETENTION: Duration = Duration::from_secs(MAX_COOLDOWN);

/// User data shared across all commands
pub struct Data {
    pub http_client: reqwest::Client,
    pub config: Arc<ConfigStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub moderation: ModerationTracker,
    pub settings: Settings,
}

// Manual Debug impl so the token in settings never reaches the logs
impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("http_client", &"reqwest::Client")
            .field("config", &self.config.path())
            .field("rate_limiter", &"RateLimiter")
            .field("admin_ids", &self.settings.admin_ids)
            .finish()
    }
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Register all slash commands
fn get_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        commands::info::info(),
        commands::channels::infochannel(),
        commands::help::help(),
    ]
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Bot is ready as {}", data_about_bot.user.name);
        }
        serenity::FullEvent::Message { new_message } => {
            moderation::handle_moderation_message(ctx, new_message, data).await?;
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "info_bot=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = Settings::from_env().expect("DISCORD_TOKEN must be set");

    info!("Starting Info Bot...");

    // Build HTTP client for API calls
    let http_client = reqwest::Client::builder()
        .user_agent("Info-Bot/1.0")
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client");

    let config = Arc::new(ConfigStore::open(settings.config_path.clone()).await);
    let rate_limiter = Arc::new(RateLimiter::new(settings.cooldown_capacity));
    info!("Channel config loaded from {}", settings.config_path);

    // Keep-alive endpoint
    let port = settings.port;
    tokio::spawn(async move {
        if let Err(e) = keep_alive::serve(port).await {
            error!("Keep-alive server error: {:?}", e);
        }
    });

    // Drop cooldowns nobody will look at again
    let pruner = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let pruned = pruner.prune(Instant::now(), COOLDOWN_RETENTION).await;
            debug!("Cooldown prune removed {} entries", pruned);
        }
    });

    let data = Data {
        http_client,
        config: config.clone(),
        rate_limiter: rate_limiter.clone(),
        moderation: ModerationTracker::new(),
        settings: settings.clone(),
    };

    // Setup framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Command error: {:?}", error);
                            let _ = ctx.say("⚠️ Unexpected error, please try again later.").await;
                        }
                        poise::FrameworkError::EventHandler { error, .. } => {
                            warn!("Event handler error: {:?}", error);
                        }
                        err => {
                            if let Err(e) = poise::builtins::on_error(err).await {
                                error!("Error while handling error: {:?}", e);
                            }
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                info!("Registering commands...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered successfully!");

                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(&settings.discord_token, intents)
        .framework(framework)
        .await
        .expect("Failed to create client");

    // Run with graceful shutdown
    let shard_manager = client.shard_manager.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to register Ctrl+C handler");
        info!("Shutting down...");
        shard_manager.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    // Config is persisted on every change, only the cooldowns need dropping
    rate_limiter.clear().await;

    info!("Goodbye!");
}
