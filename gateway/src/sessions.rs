use localgate_agent::{Agent, ToolRegistry};
use localgate_backend::LlmBackend;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub const DEFAULT_SESSION: &str = "default";

struct SessionEntry {
    agent: Arc<Mutex<Agent>>,
    /// Value of the store's use counter when the session was last touched
    last_used: u64,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<String, SessionEntry>,
    clock: u64,
}

/// Conversation histories keyed by session id.
///
/// Each session's agent sits behind its own mutex, so turns within a session
/// are applied in order while separate sessions run independently. When
/// `max_sessions` is set, creating a session beyond it evicts the least
/// recently used one.
pub struct SessionStore {
    sessions: RwLock<Sessions>,
    backend: Arc<dyn LlmBackend>,
    tools: Arc<ToolRegistry>,
    history_limit: usize,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn LlmBackend>, tools: Arc<ToolRegistry>, history_limit: usize) -> Self {
        Self {
            sessions: RwLock::new(Sessions::default()),
            backend,
            tools,
            history_limit,
            max_sessions: 0,
        }
    }

    /// Keep at most `max` sessions (0 keeps everything)
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Get the agent for `id`, creating an empty session if needed
    pub async fn get_or_create(&self, id: &str) -> Arc<Mutex<Agent>> {
        let mut sessions = self.sessions.write().await;
        sessions.clock += 1;
        let now = sessions.clock;

        if let Some(entry) = sessions.entries.get_mut(id) {
            entry.last_used = now;
            return entry.agent.clone();
        }

        if self.max_sessions > 0 && sessions.entries.len() >= self.max_sessions {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                tracing::debug!("Evicting session {} ({} sessions)", oldest, self.max_sessions);
                sessions.entries.remove(&oldest);
            }
        }

        tracing::debug!("Creating session {}", id);
        let agent = Agent::new(self.backend.clone(), self.tools.clone())
            .with_history_limit(self.history_limit);
        let agent = Arc::new(Mutex::new(agent));
        sessions.entries.insert(
            id.to_string(),
            SessionEntry {
                agent: agent.clone(),
                last_used: now,
            },
        );
        agent
    }

    /// Forget a session; returns whether it existed
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.entries.remove(id).is_some()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.entries.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use localgate_agent::ChatOptions;
    use localgate_backend::{BackendError, ChatMessage};

    struct Echo;

    #[async_trait]
    impl LlmBackend for Echo {
        async fn generate(
            &self,
            prompt: &str,
            _history: &[ChatMessage],
            _system_prompt: Option<&str>,
            _model: Option<&str>,
        ) -> Result<String, BackendError> {
            Ok(prompt.to_string())
        }
    }

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(Echo), Arc::new(ToolRegistry::new()), 0)
    }

    #[tokio::test]
    async fn same_id_shares_history() {
        let store = store();
        let first = store.get_or_create("a").await;
        first.lock().await.chat("hi", &ChatOptions::default()).await.unwrap();

        let again = store.get_or_create("a").await;
        assert_eq!(again.lock().await.history().len(), 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = store();
        let a = store.get_or_create("a").await;
        a.lock().await.chat("hi", &ChatOptions::default()).await.unwrap();

        let b = store.get_or_create("b").await;
        assert!(b.lock().await.history().is_empty());
    }

    #[tokio::test]
    async fn least_recently_used_session_is_evicted_at_capacity() {
        let store = store().with_max_sessions(2);
        store.get_or_create("a").await;
        store.get_or_create("b").await;
        store.get_or_create("a").await;

        store.get_or_create("c").await;

        assert_eq!(store.len().await, 2);
        assert!(store.contains("a").await);
        assert!(!store.contains("b").await);
        assert!(store.contains("c").await);
    }

    #[tokio::test]
    async fn many_client_ids_stay_within_the_cap() {
        let store = store().with_max_sessions(8);
        for i in 0..100 {
            store.get_or_create(&format!("web-{}", i)).await;
            assert!(store.len().await <= 8);
        }
        assert!(store.contains("web-99").await);
    }

    #[tokio::test]
    async fn zero_cap_keeps_every_session() {
        let store = store();
        for i in 0..20 {
            store.get_or_create(&format!("s{}", i)).await;
        }
        assert_eq!(store.len().await, 20);
    }

    #[tokio::test]
    async fn remove_forgets_session() {
        let store = store();
        store.get_or_create("a").await;

        assert!(store.remove("a").await);
        assert!(!store.remove("a").await);
        assert!(store.is_empty().await);
    }
}
