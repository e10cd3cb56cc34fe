//! Per-session assistant conversation history.
//!
//! History grows without bound and lives only in memory; it is removed by an explicit
//! session delete. Turns are cloned out of the map so no guard outlives a call.

use dashmap::DashMap;

use crate::llm_client::ChatMessage;
use crate::models::conversation::{ChatTurn, Speaker};

#[derive(Debug, Default)]
pub struct ConversationStore {
    sessions: DashMap<String, Vec<ChatTurn>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self, session_id: &str) -> Vec<ChatTurn> {
        self.sessions
            .get(session_id)
            .map(|turns| turns.value().clone())
            .unwrap_or_default()
    }

    /// History replayed to the model ahead of a new request.
    pub fn chat_messages(&self, session_id: &str) -> Vec<ChatMessage> {
        self.history(session_id)
            .into_iter()
            .map(|turn| match turn.role {
                Speaker::User => ChatMessage::user(turn.content),
                Speaker::Assistant => ChatMessage::assistant(turn.content),
            })
            .collect()
    }

    /// Records one request and the reply given to it.
    pub fn append_exchange(&self, session_id: &str, request: &str, reply: &str) {
        let mut turns = self.sessions.entry(session_id.to_string()).or_default();
        turns.push(ChatTurn::new(Speaker::User, request));
        turns.push(ChatTurn::new(Speaker::Assistant, reply));
    }

    /// Returns whether the session had any history.
    pub fn clear(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Role;

    #[test]
    fn test_unknown_session_is_empty() {
        let store = ConversationStore::new();
        assert!(store.history("nope").is_empty());
        assert!(!store.clear("nope"));
    }

    #[test]
    fn test_append_keeps_order() {
        let store = ConversationStore::new();
        store.append_exchange("s1", "add Kubernetes", "Added Kubernetes to Skills");
        store.append_exchange("s1", "thanks", "You're welcome");

        let history = store.history("s1");
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Speaker::User);
        assert_eq!(history[0].content, "add Kubernetes");
        assert_eq!(history[3].role, Speaker::Assistant);
        assert!(history[0].created_at <= history[3].created_at);
    }

    #[test]
    fn test_sessions_are_isolated_and_clearable() {
        let store = ConversationStore::new();
        store.append_exchange("a", "q", "r");
        store.append_exchange("b", "q2", "r2");

        assert!(store.clear("a"));
        assert!(store.history("a").is_empty());
        assert_eq!(store.history("b").len(), 2);
    }

    #[test]
    fn test_chat_messages_map_roles() {
        let store = ConversationStore::new();
        store.append_exchange("s", "hello", "hi");
        let messages = store.chat_messages("s");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content.as_deref(), Some("hi"));
    }
}
