use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::debug;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{ChatError, ChatResult};
use crate::models::{Message, SERVER_SENDER};

/// Offset between a user message and its echo reply
pub const ECHO_DELAY_MS: i64 = 1000;
pub const ECHO_PREFIX: &str = "Server: ";

/// Storage behind the chat API.
///
/// Implementations own id allocation. `append_user_message` must append both
/// messages of a pair atomically with respect to other writers.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// All messages in insertion order
    async fn list_messages(&self) -> ChatResult<Vec<Message>>;

    /// Append a user message followed by its echo reply and return both
    async fn append_user_message(&self, text: &str, sender: &str) -> ChatResult<[Message; 2]>;
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

struct StoreState {
    messages: Vec<Message>,
    next_id: u64,
}

impl StoreState {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Process-lifetime store; everything is lost on restart.
pub struct MemoryStore {
    state: Mutex<StoreState>,
    clock: Clock,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    pub fn with_clock(clock: Clock) -> Self {
        MemoryStore {
            state: Mutex::new(StoreState {
                messages: Vec::new(),
                next_id: 1,
            }),
            clock,
        }
    }

    // Wire timestamps carry milliseconds only
    fn now(&self) -> DateTime<Utc> {
        let now = (self.clock)();
        Utc.timestamp_millis_opt(now.timestamp_millis())
            .single()
            .unwrap_or(now)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_text(text: &str) -> ChatResult<()> {
    if text.is_empty() {
        return Err(ChatError::text_required());
    }
    Ok(())
}

pub fn echo_text(text: &str) -> String {
    format!("{}{}", ECHO_PREFIX, text)
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn list_messages(&self) -> ChatResult<Vec<Message>> {
        let state = self.state.lock().await;
        Ok(state.messages.clone())
    }

    async fn append_user_message(&self, text: &str, sender: &str) -> ChatResult<[Message; 2]> {
        validate_text(text)?;

        let now = self.now();
        let mut state = self.state.lock().await;

        let user_message = Message {
            id: state.allocate_id(),
            text: text.to_string(),
            sender: sender.to_string(),
            timestamp: now,
        };
        let server_message = Message {
            id: state.allocate_id(),
            text: echo_text(text),
            sender: SERVER_SENDER.to_string(),
            timestamp: now + Duration::milliseconds(ECHO_DELAY_MS),
        };

        state.messages.push(user_message.clone());
        state.messages.push(server_message.clone());
        debug!(
            "Stored messages {} and {} from {} ({} total)",
            user_message.id,
            server_message.id,
            sender,
            state.messages.len()
        );

        Ok([user_message, server_message])
    }
}
