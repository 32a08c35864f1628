//! In-memory conversation collection mirrored to a [`KeyValueStore`].
//!
//! Every mutation runs under one async lock and writes the whole
//! collection before the lock is released, so the persisted snapshot
//! always reflects the latest mutation. Reads return clones.

mod events;
mod send;

pub use events::StoreEvent;
pub use send::{ failure_text, SendOutcome, SkipReason, TRANSPORT_ERROR_TEXT, REMOTE_ERROR_PREFIX };

use log::{ debug, error, warn };
use std::collections::HashSet;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::Arc;
use tokio::sync::{ broadcast, Mutex };

use crate::llm::chat::ChatClient;
use crate::models::chat::{
    decode_conversations,
    encode_conversations,
    now_millis,
    Conversation,
    ConversationId,
    NewMessage,
};
use crate::storage::{ KeyValueStore, CONVERSATIONS_KEY };

const EVENT_CAPACITY: usize = 64;

#[derive(Default)]
struct StoreState {
    /// Newest first.
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
    last_id: Option<ConversationId>,
}

impl StoreState {
    fn find_mut(&mut self, id: ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }
}

pub struct ConversationStore {
    state: Mutex<StoreState>,
    kv: Arc<dyn KeyValueStore>,
    chat_client: Arc<dyn ChatClient>,
    loading: AtomicBool,
    events: broadcast::Sender<StoreEvent>,
}

impl ConversationStore {
    /// Restores the saved collection. Unreadable or corrupt data yields an
    /// empty collection.
    pub async fn load(kv: Arc<dyn KeyValueStore>, chat_client: Arc<dyn ChatClient>) -> Self {
        let conversations = match kv.get(CONVERSATIONS_KEY).await {
            Ok(Some(raw)) =>
                match decode_conversations(&raw) {
                    Ok(conversations) => dedupe_ids(conversations),
                    Err(e) => {
                        warn!("Saved conversations are corrupt, starting empty: {}", e);
                        Vec::new()
                    }
                }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read saved conversations, starting empty: {}", e);
                Vec::new()
            }
        };
        debug!("Loaded {} conversation(s)", conversations.len());

        let last_id = conversations
            .iter()
            .map(|c| c.id)
            .max();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            state: Mutex::new(StoreState {
                conversations,
                active: None,
                last_id,
            }),
            kv,
            chat_client,
            loading: AtomicBool::new(false),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn persist(&self, state: &StoreState) {
        let raw = match encode_conversations(&state.conversations) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to encode conversations: {}", e);
                return;
            }
        };
        if let Err(e) = self.kv.set(CONVERSATIONS_KEY, &raw).await {
            error!("Failed to persist conversations: {}", e);
        }
    }

    pub async fn create_conversation(&self) -> ConversationId {
        let mut state = self.state.lock().await;
        let id = ConversationId::next_after(state.last_id, now_millis());
        state.conversations.insert(0, Conversation::new(id));
        state.active = Some(id);
        state.last_id = Some(id);
        self.persist(&state).await;
        drop(state);

        self.emit(StoreEvent::Created(id));
        self.emit(StoreEvent::ActiveChanged(Some(id)));
        id
    }

    /// Absent ids are ignored.
    pub async fn delete_conversation(&self, id: ConversationId) {
        let mut state = self.state.lock().await;
        let Some(pos) = state.conversations.iter().position(|c| c.id == id) else {
            return;
        };
        state.conversations.remove(pos);
        let was_active = state.active == Some(id);
        if was_active {
            state.active = None;
        }
        self.persist(&state).await;
        drop(state);

        self.emit(StoreEvent::Deleted(id));
        if was_active {
            self.emit(StoreEvent::ActiveChanged(None));
        }
    }

    /// Drops every conversation and removes the persisted copy.
    pub async fn clear_all(&self) {
        let mut state = self.state.lock().await;
        state.conversations.clear();
        state.active = None;
        if let Err(e) = self.kv.delete(CONVERSATIONS_KEY).await {
            error!("Failed to purge persisted conversations: {}", e);
        }
        drop(state);

        self.emit(StoreEvent::Cleared);
        self.emit(StoreEvent::ActiveChanged(None));
    }

    /// Selects `id` without checking that it exists; an unknown id simply
    /// reads back as no active conversation.
    pub async fn set_active(&self, id: ConversationId) {
        self.state.lock().await.active = Some(id);
        self.emit(StoreEvent::ActiveChanged(Some(id)));
    }

    pub async fn rename_conversation(&self, id: ConversationId, title: &str) {
        let mut state = self.state.lock().await;
        let Some(conversation) = state.find_mut(id) else {
            return;
        };
        conversation.title = title.to_string();
        self.persist(&state).await;
        drop(state);

        self.emit(StoreEvent::Renamed(id));
    }

    /// Appends to the conversation with `id`, or does nothing if it is gone.
    pub async fn append_message(&self, id: ConversationId, message: NewMessage) {
        let mut state = self.state.lock().await;
        let Some(conversation) = state.find_mut(id) else {
            debug!("Dropping message for missing conversation {}", id);
            return;
        };
        conversation.messages.push(message.into_message());
        self.persist(&state).await;
        drop(state);

        self.emit(StoreEvent::MessageAppended(id));
    }

    pub async fn get_active(&self) -> Option<Conversation> {
        let state = self.state.lock().await;
        let active = state.active?;
        state.conversations
            .iter()
            .find(|c| c.id == active)
            .cloned()
    }

    pub async fn get(&self, id: ConversationId) -> Option<Conversation> {
        let state = self.state.lock().await;
        state.conversations
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub async fn active_id(&self) -> Option<ConversationId> {
        self.state.lock().await.active
    }

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.state.lock().await.conversations.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}

/// Keeps the first conversation for each id.
fn dedupe_ids(conversations: Vec<Conversation>) -> Vec<Conversation> {
    let mut seen = HashSet::new();
    let before = conversations.len();
    let unique: Vec<Conversation> = conversations
        .into_iter()
        .filter(|c| seen.insert(c.id))
        .collect();
    if unique.len() != before {
        warn!("Dropped {} saved conversation(s) with duplicate ids", before - unique.len());
    }
    unique
}
