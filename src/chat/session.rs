//! In-memory conversation sessions.
//!
//! Each session sits behind its own async mutex so a query can hold it
//! across the provider call without blocking other sessions.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::ChatMessage;

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            messages: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Append one exchange and keep only the last `max_pairs` pairs.
    pub fn push_turn(&mut self, question: &str, answer: &str, max_pairs: usize) {
        self.messages.push(ChatMessage::user(question));
        self.messages.push(ChatMessage::assistant(answer));

        let keep = max_pairs * 2;
        if self.messages.len() > keep {
            let excess = self.messages.len() - keep;
            self.messages.drain(..excess);
        }
        self.updated_at = Utc::now();
    }
}

pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a session, creating it on first use.
    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        self.sessions
            .lock()
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(Session::new(session_id))))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Drop sessions idle for longer than `ttl_secs`. Sessions still held
    /// by a caller are kept. Returns how many were removed.
    pub fn purge_expired(&self, ttl_secs: u64) -> usize {
        // A TTL too large to represent never expires anything
        let Some(cutoff) = i64::try_from(ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };
        let mut sessions = self.sessions.lock();
        let before = sessions.len();

        sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(session) => session.updated_at >= cutoff,
                Err(_) => true,
            }
        });

        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!("Expired {removed} idle sessions");
        }
        removed
    }
}
