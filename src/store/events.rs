use crate::models::chat::ConversationId;

/// Change notification sent to subscribers after a mutation has been
/// applied and persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    Created(ConversationId),
    Deleted(ConversationId),
    Cleared,
    ActiveChanged(Option<ConversationId>),
    Renamed(ConversationId),
    MessageAppended(ConversationId),
    LoadingChanged(bool),
}
