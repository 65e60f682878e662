//! Backend session protocol.
//!
//! The runtime talks to its language-model server through a narrow surface:
//! open a session, post a message into it. The server holds conversation
//! state; the runtime only re-sends the new turn. Implementations degrade
//! every failure to None after logging it, so callers reason about "no
//! reply" instead of transport errors.

pub mod client;
pub mod parser;
pub mod types;

pub use client::{BackendError, HttpBackend};
pub use parser::{parse_assistant_payload, ParseError, ParsedAssistant};
pub use types::{BackendReply, PostOptions, ReplyPart, ReplyUsage};

use async_trait::async_trait;

/// The narrow surface the conversation loop drives.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Open a new server-held session. None when the backend is unavailable.
    async fn create_session(&self) -> Option<String>;

    /// Post one prompt into a session. None on any failure; implementations
    /// log the cause.
    async fn post_message(
        &self,
        session_id: &str,
        prompt: &str,
        options: &PostOptions,
    ) -> Option<BackendReply>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Backend doubles shared by the loop, sub-agent, and agent tests.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::types::{BackendReply, PostOptions, ReplyPart, ReplyUsage};
    use super::Backend;

    pub fn text_reply(text: &str) -> BackendReply {
        BackendReply {
            parts: vec![ReplyPart::text(text)],
            usage: Some(ReplyUsage {
                input_tokens: 10,
                output_tokens: 5,
            }),
        }
    }

    /// Replays a fixed queue of replies; an exhausted queue answers None.
    pub struct ScriptedBackend {
        replies: Mutex<VecDeque<Option<BackendReply>>>,
        pub posts: Mutex<Vec<String>>,
        fail_session: bool,
    }

    impl ScriptedBackend {
        pub fn new(replies: Vec<Option<BackendReply>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                posts: Mutex::new(Vec::new()),
                fail_session: false,
            }
        }

        pub fn failing_session() -> Self {
            let mut backend = Self::new(Vec::new());
            backend.fail_session = true;
            backend
        }

        pub fn posts(&self) -> Vec<String> {
            self.posts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn create_session(&self) -> Option<String> {
            if self.fail_session {
                None
            } else {
                Some(format!("ses_{}", Uuid::new_v4()))
            }
        }

        async fn post_message(
            &self,
            _session_id: &str,
            prompt: &str,
            _options: &PostOptions,
        ) -> Option<BackendReply> {
            self.posts.lock().unwrap().push(prompt.to_string());
            self.replies.lock().unwrap().pop_front().flatten()
        }
    }

    /// Answers every post with the same final text, recording prompt order.
    /// An optional delay keeps concurrency tests honest.
    pub struct StaticBackend {
        reply_text: String,
        pub posts: Arc<Mutex<Vec<String>>>,
        delay: Option<Duration>,
    }

    impl StaticBackend {
        pub fn new(reply_text: &str) -> Self {
            Self {
                reply_text: reply_text.to_string(),
                posts: Arc::new(Mutex::new(Vec::new())),
                delay: None,
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn posts(&self) -> Vec<String> {
            self.posts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Backend for StaticBackend {
        async fn create_session(&self) -> Option<String> {
            Some(format!("ses_{}", Uuid::new_v4()))
        }

        async fn post_message(
            &self,
            _session_id: &str,
            prompt: &str,
            _options: &PostOptions,
        ) -> Option<BackendReply> {
            self.posts.lock().unwrap().push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Some(text_reply(&self.reply_text))
        }
    }
}
