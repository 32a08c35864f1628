use log::{ info, warn };
use std::sync::atomic::Ordering;

use super::{ ConversationStore, StoreEvent };
use crate::llm::chat::CompletionError;
use crate::models::chat::{ title_from_prompt, ConversationId, NewMessage };

pub const REMOTE_ERROR_PREFIX: &str = "⚠️ Error: ";
pub const TRANSPORT_ERROR_TEXT: &str = "⚠️ Network error. Please check your connection and API key.";

/// Why a send did nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    EmptyInput,
    NoActiveConversation,
    AlreadySending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Skipped(SkipReason),
    Replied {
        conversation: ConversationId,
        reply: String,
    },
    Failed {
        conversation: ConversationId,
        error: CompletionError,
    },
}

/// Text of the assistant message standing in for a failed completion.
pub fn failure_text(error: &CompletionError) -> String {
    match error {
        CompletionError::RemoteRejected(message) => format!("{}{}", REMOTE_ERROR_PREFIX, message),
        CompletionError::TransportError(_) => TRANSPORT_ERROR_TEXT.to_string(),
    }
}

/// Clears the in-flight flag when dropped, including on unwind or when
/// the send future is dropped mid-request.
struct InFlight<'a> {
    store: &'a ConversationStore,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.store.loading.store(false, Ordering::SeqCst);
        self.store.emit(StoreEvent::LoadingChanged(false));
    }
}

impl ConversationStore {
    /// Sends `text` to the active conversation and appends the reply, or an
    /// error message in its place. Only one send may be in flight; calls
    /// made meanwhile are skipped, not queued.
    pub async fn send_user_message(&self, text: &str) -> SendOutcome {
        let prompt = text.trim();
        if prompt.is_empty() {
            return SendOutcome::Skipped(SkipReason::EmptyInput);
        }

        let mut state = self.state.lock().await;
        let Some(active) = state.active else {
            return SendOutcome::Skipped(SkipReason::NoActiveConversation);
        };
        let Some(conversation) = state.find_mut(active) else {
            return SendOutcome::Skipped(SkipReason::NoActiveConversation);
        };
        if self.loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return SendOutcome::Skipped(SkipReason::AlreadySending);
        }
        let in_flight = InFlight { store: self };

        let renamed = conversation.messages.is_empty();
        if renamed {
            conversation.title = title_from_prompt(prompt);
        }
        conversation.messages.push(NewMessage::user(prompt).into_message());
        self.persist(&state).await;
        drop(state);

        self.emit(StoreEvent::LoadingChanged(true));
        if renamed {
            self.emit(StoreEvent::Renamed(active));
        }
        self.emit(StoreEvent::MessageAppended(active));

        info!("Sending prompt for conversation {} via {}", active, self.chat_client.get_model());
        let outcome = match self.chat_client.complete(prompt).await {
            Ok(resp) => {
                self.append_message(active, NewMessage::assistant(resp.response.clone())).await;
                SendOutcome::Replied {
                    conversation: active,
                    reply: resp.response,
                }
            }
            Err(error) => {
                warn!("Completion for conversation {} failed: {}", active, error);
                self.append_message(active, NewMessage::assistant(failure_text(&error))).await;
                SendOutcome::Failed {
                    conversation: active,
                    error,
                }
            }
        };
        drop(in_flight);
        outcome
    }
}
