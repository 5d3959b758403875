use anyhow::{Context, Result};
use shared::Config;
use teloxide::prelude::*;
use teloxide::types::AllowedUpdate;
use tracing::info;
use url::Url;

/// Update kinds the relay reads. Everything else is never delivered.
pub const ALLOWED_UPDATES: [AllowedUpdate; 2] = [AllowedUpdate::Message, AllowedUpdate::ChannelPost];

/// Explicit `--url` wins over `PUBLIC_BASE_URL`. Telegram only calls https webhooks.
pub fn resolve_webhook_url(explicit: Option<&str>, config: &Config) -> Result<Url> {
    let raw = match explicit {
        Some(url) => url.to_string(),
        None => config
            .webhook_url()
            .context("PUBLIC_BASE_URL or --url must be provided")?,
    };
    let url = Url::parse(&raw).with_context(|| format!("Invalid webhook URL: {}", raw))?;
    if url.scheme() != "https" {
        anyhow::bail!("Webhook URL must use https: {}", url);
    }
    Ok(url)
}

pub async fn set_webhook(
    bot: &Bot,
    config: &Config,
    explicit_url: Option<&str>,
    drop_pending: bool,
) -> Result<()> {
    let url = resolve_webhook_url(explicit_url, config)?;
    let secret = config
        .webhook_secret
        .clone()
        .context("WEBHOOK_SECRET must be set so /api/telegram can verify updates")?;

    info!("Registering webhook {} (drop_pending={})", url, drop_pending);
    bot.set_webhook(url.clone())
        .secret_token(secret)
        .allowed_updates(ALLOWED_UPDATES.to_vec())
        .drop_pending_updates(drop_pending)
        .await?;

    println!("Webhook set to {}", url);
    Ok(())
}

pub async fn delete_webhook(bot: &Bot, drop_pending: bool) -> Result<()> {
    info!("Deleting webhook (drop_pending={})", drop_pending);
    bot.delete_webhook().drop_pending_updates(drop_pending).await?;
    println!("Webhook deleted");
    Ok(())
}

pub async fn webhook_info(bot: &Bot) -> Result<()> {
    let info = bot.get_webhook_info().await?;
    println!(
        "URL:             {}",
        info.url.as_ref().map(Url::as_str).unwrap_or("(none)")
    );
    println!("Pending updates: {}", info.pending_update_count);
    if let Some(message) = &info.last_error_message {
        println!("Last error:      {}", message);
    }
    if let Some(allowed) = &info.allowed_updates {
        println!("Allowed updates: {:?}", allowed);
    }
    Ok(())
}
