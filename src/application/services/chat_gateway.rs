use std::sync::Arc;

use crate::domain::entities::OutboundReply;
use crate::domain::traits::{Bot, ParseMode};

/// Characters MarkdownV2 reserves outside of entities
const MARKDOWN_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Outbound reply path for chat handlers.
///
/// Delivery failures are logged and swallowed: there is no channel left to report them through.
#[derive(Clone)]
pub struct ChatGateway {
    bot: Arc<dyn Bot>,
}

impl ChatGateway {
    pub fn new(bot: Arc<dyn Bot>) -> Self {
        Self { bot }
    }

    pub async fn send(&self, chat_id: i64, text: &str, rich_markup: bool, log_subject: &str) {
        let parse_mode = ParseMode::from_rich(rich_markup);
        if let Err(e) = self.bot.send_message(chat_id, text, parse_mode).await {
            tracing::error!(
                chat_id,
                rich_markup,
                subject = log_subject,
                error = %e,
                "send.error"
            );
        }
    }

    pub async fn send_reply(&self, reply: OutboundReply, log_subject: &str) {
        self.send(reply.chat_id, &reply.text, reply.rich_markup, log_subject)
            .await;
    }
}

/// Escape user text for interpolation into a MarkdownV2 template
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || MARKDOWN_RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
