pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

/// Chat type as far as reply branching and the allowlist care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Direct,
    Group,
    Supergroup,
    Channel,
}

impl std::fmt::Display for ChatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatKind::Direct => write!(f, "private"),
            ChatKind::Group => write!(f, "group"),
            ChatKind::Supergroup => write!(f, "supergroup"),
            ChatKind::Channel => write!(f, "channel"),
        }
    }
}

/// A message-bearing update, reduced to what the dispatcher reads.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub kind: ChatKind,
    pub text: Option<String>,
    /// Caption of a photo, video or document.
    pub caption: Option<String>,
}

/// Where the single inline button of an outgoing message leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonTarget {
    /// Launch the web app inside the client.
    WebApp(Url),
    /// Plain external link.
    Link(Url),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub button_label: String,
    pub target: ButtonTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: u64,
    pub username: String,
}

/// The slice of the Bot API this service talks to.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn send_message(&self, chat_id: i64, message: &OutgoingMessage) -> Result<()>;

    /// Configure the per-chat menu button to open `web_app_url`.
    async fn set_menu_button(&self, chat_id: i64, label: &str, web_app_url: &Url) -> Result<()>;

    async fn identity(&self) -> Result<BotIdentity>;

    /// Currently registered webhook URL, `None` when unset.
    async fn webhook_url(&self) -> Result<Option<String>>;

    async fn delete_webhook(&self) -> Result<()>;

    async fn set_webhook(&self, url: &Url, secret_token: Option<&str>) -> Result<()>;
}
