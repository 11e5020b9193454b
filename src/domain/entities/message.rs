use chrono::{DateTime, Utc};

/// Kind of conversation an event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "private" => ChatKind::Private,
            "supergroup" => ChatKind::Supergroup,
            "channel" => ChatKind::Channel,
            _ => ChatKind::Group,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, ChatKind::Private)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatKind::Private => "private",
            ChatKind::Group => "group",
            ChatKind::Supergroup => "supergroup",
            ChatKind::Channel => "channel",
        }
    }
}

/// Who sent an inbound event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

impl Sender {
    pub fn new(user_id: i64, first_name: impl Into<String>) -> Self {
        Self {
            user_id,
            first_name: first_name.into(),
            ..Self::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// First and last name joined the way the chat row stores it.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// One chat update, alive for the duration of a single dispatch
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub id: String,
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub sender: Sender,
    pub is_command: bool,
    pub command_name: String,
    pub raw_arguments: String,
    pub arguments: Vec<String>,
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    /// A plain text event. It never reaches a command handler.
    pub fn text(chat_id: i64, chat_kind: ChatKind, sender: Sender) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id,
            chat_kind,
            sender,
            is_command: false,
            command_name: String::new(),
            raw_arguments: String::new(),
            arguments: Vec::new(),
            received_at: Utc::now(),
        }
    }

    pub fn command(
        chat_id: i64,
        chat_kind: ChatKind,
        sender: Sender,
        name: impl Into<String>,
        raw_arguments: impl Into<String>,
    ) -> Self {
        let raw_arguments = raw_arguments.into();
        let arguments = crate::application::messaging::parse_arguments(&raw_arguments);
        Self {
            is_command: true,
            command_name: name.into(),
            raw_arguments,
            arguments,
            ..Self::text(chat_id, chat_kind, sender)
        }
    }
}

/// A reply built by a handler and handed straight to the chat gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    pub chat_id: i64,
    pub text: String,
    pub rich_markup: bool,
}

impl OutboundReply {
    pub fn plain(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            rich_markup: false,
        }
    }

    pub fn markdown(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            rich_markup: true,
        }
    }
}
