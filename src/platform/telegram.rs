use anyhow::{bail, Result};
use async_trait::async_trait;
use teloxide::payloads::{SendMessageSetters, SetChatMenuButtonSetters, SetWebhookSetters};
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, MenuButton, UpdateKind, WebAppInfo,
};
use url::Url;

use crate::platform::{
    BotIdentity, ButtonTarget, ChatKind, ChatPlatform, IncomingMessage, OutgoingMessage,
};

/// Bot API access through teloxide.
#[derive(Clone)]
pub struct TelegramPlatform {
    bot: Bot,
}

impl TelegramPlatform {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn send_message(&self, chat_id: i64, message: &OutgoingMessage) -> Result<()> {
        let button = match &message.target {
            ButtonTarget::WebApp(url) => InlineKeyboardButton::web_app(
                message.button_label.clone(),
                WebAppInfo { url: url.clone() },
            ),
            ButtonTarget::Link(url) => {
                InlineKeyboardButton::url(message.button_label.clone(), url.clone())
            }
        };

        self.bot
            .send_message(ChatId(chat_id), message.text.clone())
            .reply_markup(InlineKeyboardMarkup::new(vec![vec![button]]))
            .await?;
        Ok(())
    }

    async fn set_menu_button(&self, chat_id: i64, label: &str, web_app_url: &Url) -> Result<()> {
        self.bot
            .set_chat_menu_button()
            .chat_id(ChatId(chat_id))
            .menu_button(MenuButton::WebApp {
                text: label.to_string(),
                web_app: WebAppInfo {
                    url: web_app_url.clone(),
                },
            })
            .await?;
        Ok(())
    }

    async fn identity(&self) -> Result<BotIdentity> {
        let me = self.bot.get_me().await?;
        Ok(BotIdentity {
            id: me.id.0,
            username: me.username().to_string(),
        })
    }

    async fn webhook_url(&self) -> Result<Option<String>> {
        let info = self.bot.get_webhook_info().await?;
        Ok(info.url.map(|url| url.to_string()))
    }

    async fn delete_webhook(&self) -> Result<()> {
        self.bot.delete_webhook().await?;
        Ok(())
    }

    async fn set_webhook(&self, url: &Url, secret_token: Option<&str>) -> Result<()> {
        let mut request = self.bot.set_webhook(url.clone());
        if let Some(secret) = secret_token {
            request = request.secret_token(secret.to_string());
        }
        request.await?;
        Ok(())
    }
}

/// Reduce a raw update to the chat context the dispatcher works on.
/// Only new messages and channel posts qualify; a payload teloxide could not
/// make sense of is an error.
pub fn incoming_message(update: &Update) -> Result<Option<IncomingMessage>> {
    let msg = match &update.kind {
        UpdateKind::Message(msg) | UpdateKind::ChannelPost(msg) => msg,
        UpdateKind::Error(raw) => bail!("Undecodable update {}: {}", update.id.0, raw),
        _ => return Ok(None),
    };

    let kind = if msg.chat.is_private() {
        ChatKind::Direct
    } else if msg.chat.is_supergroup() {
        ChatKind::Supergroup
    } else if msg.chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Group
    };

    Ok(Some(IncomingMessage {
        chat_id: msg.chat.id.0,
        kind,
        text: msg.text().map(str::to_string),
        caption: msg.caption().map(str::to_string),
    }))
}
