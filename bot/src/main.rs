use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::{init_tracing, Config};
use teloxide::Bot;

mod commands;

/// Telegram webhook management for the signal relay.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: BotCommand,
}

#[derive(Subcommand, Debug)]
enum BotCommand {
    /// Register `<PUBLIC_BASE_URL>/api/telegram` as the bot webhook
    SetWebhook {
        /// Full webhook URL, overrides PUBLIC_BASE_URL
        #[arg(long)]
        url: Option<String>,
        /// Drop updates queued while no webhook was set
        #[arg(long)]
        drop_pending: bool,
    },
    /// Remove the webhook
    DeleteWebhook {
        #[arg(long)]
        drop_pending: bool,
    },
    /// Show what Telegram currently has registered
    WebhookInfo,
    /// Print build information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    if let BotCommand::Version = args.command {
        println!("{}", commands::version::version_info());
        return Ok(());
    }

    let config = Config::from_env()?;
    let token = config
        .bot_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("BOT_TOKEN must be set"))?;
    let bot = Bot::new(token);

    match args.command {
        BotCommand::SetWebhook { url, drop_pending } => {
            commands::webhook::set_webhook(&bot, &config, url.as_deref(), drop_pending).await
        }
        BotCommand::DeleteWebhook { drop_pending } => {
            commands::webhook::delete_webhook(&bot, drop_pending).await
        }
        BotCommand::WebhookInfo => commands::webhook::webhook_info(&bot).await,
        BotCommand::Version => Ok(()),
    }
}
