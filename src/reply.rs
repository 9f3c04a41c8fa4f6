use url::Url;

use crate::platform::{ButtonTarget, ChatKind, OutgoingMessage};

pub const OPEN_UI_TEXT: &str = "Opening Audio Chat with Pastor Jeff:";
pub const WELCOME_TEXT: &str = "Welcome! Tap below to open Pastor Jeff’s Audio Chat:";
pub const MENU_BUTTON_LABEL: &str = "🎙️ Audio Chat";

/// Start parameter carried by the group deep link.
const START_APP_PAYLOAD: &str = "call_pastor_jeff";

/// How to get the user into the web app from a given chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyAction {
    /// Direct chats can launch the web view in place.
    OpenWebAppDirect(Url),
    /// Groups get a link that reopens the bot in a direct chat.
    OpenViaDeepLink(Url),
}

impl ReplyAction {
    pub fn into_message(self) -> OutgoingMessage {
        let (button_label, target) = match self {
            ReplyAction::OpenWebAppDirect(url) => ("🎙️ Open Here", ButtonTarget::WebApp(url)),
            ReplyAction::OpenViaDeepLink(url) => ("⚡ Open in DM", ButtonTarget::Link(url)),
        };
        OutgoingMessage {
            text: OPEN_UI_TEXT.to_string(),
            button_label: button_label.to_string(),
            target,
        }
    }
}

pub fn compose_reply(kind: ChatKind, webapp_url: &Url, deep_link: Url) -> ReplyAction {
    match kind {
        ChatKind::Direct => ReplyAction::OpenWebAppDirect(webapp_url.clone()),
        ChatKind::Group | ChatKind::Supergroup | ChatKind::Channel => {
            ReplyAction::OpenViaDeepLink(deep_link)
        }
    }
}

/// `https://t.me/<username>?startapp=call_pastor_jeff`
pub fn deep_link(bot_username: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse("https://t.me/")?.join(bot_username.trim_start_matches('@'))?;
    url.query_pairs_mut()
        .append_pair("startapp", START_APP_PAYLOAD);
    Ok(url)
}

pub fn welcome_message(webapp_url: &Url) -> OutgoingMessage {
    OutgoingMessage {
        text: WELCOME_TEXT.to_string(),
        button_label: "🎙️ Open Audio Chat".to_string(),
        target: ButtonTarget::WebApp(webapp_url.clone()),
    }
}
