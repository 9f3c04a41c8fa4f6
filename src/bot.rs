use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::types::Update;
use teloxide::utils::command::BotCommands;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::allowlist::Allowlist;
use crate::config::Config;
use crate::intent;
use crate::platform::telegram::incoming_message;
use crate::platform::{ChatPlatform, IncomingMessage};
use crate::reply::{self, MENU_BUTTON_LABEL};

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case")]
pub enum Command {
    #[command(description = "open Pastor Jeff's Audio Chat")]
    Start(String),
    #[command(description = "call Pastor Jeff")]
    CallPastorJeff,
}

/// Shared application state
pub struct AppState {
    pub platform: Arc<dyn ChatPlatform>,
    pub allowlist: Allowlist,
    pub webapp_url: Url,
    pub webhook_secret: Option<String>,
    /// Replaced with the name reported by the identity check at startup.
    bot_username: RwLock<String>,
}

impl AppState {
    pub fn new(config: &Config, platform: Arc<dyn ChatPlatform>) -> Self {
        Self {
            platform,
            allowlist: Allowlist::new(config.allowed_chats.iter().cloned()),
            webapp_url: config.webapp_url.clone(),
            webhook_secret: config.webhook_secret.clone(),
            bot_username: RwLock::new(config.bot_username.clone()),
        }
    }

    pub async fn bot_username(&self) -> String {
        self.bot_username.read().await.clone()
    }

    pub async fn set_bot_username(&self, username: String) {
        *self.bot_username.write().await = username;
    }
}

pub async fn dispatch(state: &AppState, update: Update) -> Result<()> {
    match incoming_message(&update)? {
        Some(msg) => handle_message(state, msg).await,
        None => {
            debug!("Ignoring update {:?}", update.id);
            Ok(())
        }
    }
}

pub async fn handle_message(state: &AppState, msg: IncomingMessage) -> Result<()> {
    let username = state.bot_username().await;

    if let Some(text) = msg.text.as_deref() {
        match Command::parse(text, &username) {
            Ok(Command::Start(_)) => return handle_start(state, &msg).await,
            Ok(Command::CallPastorJeff) => {
                if !state.allowlist.is_allowed(msg.kind, msg.chat_id) {
                    return Ok(());
                }
                return send_open_ui(state, &msg, &username).await;
            }
            Err(_) => {}
        }
    }

    if !state.allowlist.is_allowed(msg.kind, msg.chat_id) {
        return Ok(());
    }

    let body = match (msg.text.as_deref(), msg.caption.as_deref()) {
        (Some(text), _) => {
            info!("text: {} chat: {} {}", text, msg.chat_id, msg.kind);
            text
        }
        (None, Some(caption)) => {
            info!("caption: {} chat: {} {}", caption, msg.chat_id, msg.kind);
            caption
        }
        (None, None) => return Ok(()),
    };

    if intent::is_call_intent(body) {
        send_open_ui(state, &msg, &username).await?;
    }

    Ok(())
}

/// `/start` is answered in every chat, allowlisted or not, so anyone who
/// opens the bot can find the web app.
async fn handle_start(state: &AppState, msg: &IncomingMessage) -> Result<()> {
    if let Err(e) = state
        .platform
        .set_menu_button(msg.chat_id, MENU_BUTTON_LABEL, &state.webapp_url)
        .await
    {
        warn!("setChatMenuButton failed for chat {}: {:#}", msg.chat_id, e);
    }

    state
        .platform
        .send_message(msg.chat_id, &reply::welcome_message(&state.webapp_url))
        .await
        .with_context(|| format!("Failed to send welcome to chat {}", msg.chat_id))
}

async fn send_open_ui(state: &AppState, msg: &IncomingMessage, username: &str) -> Result<()> {
    let link = reply::deep_link(username)?;
    let action = reply::compose_reply(msg.kind, &state.webapp_url, link);

    state
        .platform
        .send_message(msg.chat_id, &action.into_message())
        .await
        .with_context(|| format!("Failed to send reply to chat {}", msg.chat_id))?;

    info!("Sent open-UI reply to chat {} ({})", msg.chat_id, msg.kind);
    Ok(())
}
