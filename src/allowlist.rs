use std::collections::HashSet;

use crate::platform::ChatKind;

/// Chats the bot answers in. Direct messages always pass; groups,
/// supergroups and channels only when their id is listed.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    chat_ids: HashSet<String>,
}

impl Allowlist {
    pub fn new<I, S>(chat_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chat_ids: chat_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_allowed(&self, kind: ChatKind, chat_id: i64) -> bool {
        if kind == ChatKind::Direct {
            return true;
        }
        self.chat_ids.contains(&chat_id.to_string())
    }
}
