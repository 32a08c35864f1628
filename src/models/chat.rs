use chrono::Utc;
use serde::{ Deserialize, Serialize };
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Title given to every conversation until its first message arrives.
pub const DEFAULT_TITLE: &str = "New Chat";
/// Number of characters of the first prompt kept as a title.
pub const TITLE_MAX_CHARS: usize = 30;
pub const TITLE_ELLIPSIS: &str = "...";

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Conversation identifier, the creation instant in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl ConversationId {
    /// Next id after `previous`, taken from the clock unless the clock has
    /// not moved past it.
    pub fn next_after(previous: Option<ConversationId>, now_ms: i64) -> Self {
        match previous {
            Some(ConversationId(last)) if now_ms <= last => ConversationId(last + 1),
            _ => ConversationId(now_ms),
        }
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(ConversationId)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    #[default]
    User,
    #[serde(alias = "bot")]
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub sender: Sender,
    #[serde(default)]
    pub text: String,
    #[serde(default = "now_millis")]
    pub timestamp: i64,
}

/// A message about to be appended. Unset fields fall back to a user
/// sender, empty text and the current time.
#[derive(Clone, Debug, Default)]
pub struct NewMessage {
    pub sender: Option<Sender>,
    pub text: Option<String>,
    pub timestamp: Option<i64>,
}

impl NewMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Some(Sender::User),
            text: Some(text.into()),
            timestamp: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Some(Sender::Assistant),
            text: Some(text.into()),
            timestamp: None,
        }
    }

    pub fn into_message(self) -> ChatMessage {
        ChatMessage {
            sender: self.sender.unwrap_or_default(),
            text: self.text.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_else(now_millis),
        }
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default, alias = "message")]
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(id: ConversationId) -> Self {
        Self {
            id,
            title: default_title(),
            messages: Vec::new(),
        }
    }
}

/// Title derived from the first prompt of a conversation.
pub fn title_from_prompt(text: &str) -> String {
    match text.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TITLE_ELLIPSIS),
        None => text.to_string(),
    }
}

pub fn encode_conversations(conversations: &[Conversation]) -> Result<String, serde_json::Error> {
    serde_json::to_string(conversations)
}

pub fn decode_conversations(raw: &str) -> Result<Vec<Conversation>, serde_json::Error> {
    serde_json::from_str(raw)
}
