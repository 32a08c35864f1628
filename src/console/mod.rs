//! Line-oriented front end over the conversation store.

use log::warn;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::auth::{ logout, AuthProvider };
use crate::cli::{ Command, HELP_TEXT };
use crate::models::chat::{ Conversation, Sender };
use crate::preferences::toggle_theme;
use crate::storage::KeyValueStore;
use crate::store::{ failure_text, ConversationStore, SendOutcome, SkipReason };

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

pub struct Console {
    store: Arc<ConversationStore>,
    kv: Arc<dyn KeyValueStore>,
    auth: Arc<dyn AuthProvider>,
}

impl Console {
    pub fn new(
        store: Arc<ConversationStore>,
        kv: Arc<dyn KeyValueStore>,
        auth: Arc<dyn AuthProvider>
    ) -> Self {
        Self { store, kv, auth }
    }

    pub async fn execute(&self, command: Command) -> Flow {
        let output = match command {
            Command::Empty => String::new(),
            Command::Quit => {
                return Flow::Quit;
            }
            Command::Help => HELP_TEXT.to_string(),
            Command::Invalid(message) => message,
            Command::New => {
                let id = self.store.create_conversation().await;
                format!("started conversation {}", id)
            }
            Command::List => self.list().await,
            Command::Select(id) => {
                self.store.set_active(id).await;
                match self.store.get_active().await {
                    Some(conversation) => render_conversation(&conversation),
                    None => format!("no conversation {}", id),
                }
            }
            Command::Delete(id) => {
                self.store.delete_conversation(id).await;
                format!("deleted {}", id)
            }
            Command::Rename(id, title) => {
                self.store.rename_conversation(id, &title).await;
                match self.store.get(id).await {
                    Some(_) => format!("renamed {} to '{}'", id, title),
                    None => format!("no conversation {}", id),
                }
            }
            Command::Clear => {
                self.store.clear_all().await;
                "all conversations cleared".to_string()
            }
            Command::Theme => format!("theme: {}", toggle_theme(self.kv.as_ref()).await),
            Command::WhoAmI =>
                match self.auth.current_user_id().await {
                    Some(user) => format!("signed in as {}", user),
                    None => "not signed in".to_string(),
                }
            Command::Logout =>
                match logout(self.auth.as_ref(), &self.store).await {
                    Ok(()) => "signed out, history cleared".to_string(),
                    Err(e) => format!("history cleared, but {}", e),
                }
            Command::Send(text) => self.send(&text).await,
        };
        Flow::Continue(output)
    }

    async fn list(&self) -> String {
        let conversations = self.store.conversations().await;
        if conversations.is_empty() {
            return "no conversations yet, type a message or /new".to_string();
        }
        let active = self.store.active_id().await;
        let mut out = String::new();
        for conversation in &conversations {
            let marker = if Some(conversation.id) == active { '*' } else { ' ' };
            let _ = writeln!(
                out,
                "{} {}  {}  ({} messages)",
                marker,
                conversation.id,
                conversation.title,
                conversation.messages.len()
            );
        }
        out.trim_end().to_string()
    }

    async fn send(&self, text: &str) -> String {
        if self.store.get_active().await.is_none() {
            self.store.create_conversation().await;
        }
        match self.store.send_user_message(text).await {
            SendOutcome::Replied { reply, .. } => reply,
            SendOutcome::Failed { error, .. } => failure_text(&error),
            SendOutcome::Skipped(SkipReason::AlreadySending) =>
                "still waiting for the previous reply".to_string(),
            SendOutcome::Skipped(reason) => {
                warn!("Message skipped: {:?}", reason);
                String::new()
            }
        }
    }
}

fn render_conversation(conversation: &Conversation) -> String {
    let mut out = format!("# {} ({})", conversation.title, conversation.id);
    for message in &conversation.messages {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Assistant => "assistant",
        };
        let _ = write!(out, "\n{}: {}", who, message.text);
    }
    out
}
