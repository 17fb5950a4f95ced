/// Scripted chat model for testing purposes.
///
/// Replies are served in order from a queue; an exhausted queue behaves like
/// a failing provider, which doubles as the transport-failure fixture.
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ChatModel, ChatOptions, LlmError, Message};

pub struct ScriptedChat {
    replies: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedChat {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A chat model whose every call fails.
    #[must_use]
    pub fn failing() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// Number of completion calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(
        &self,
        _messages: Vec<Message>,
        _options: ChatOptions,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .expect("reply queue lock poisoned")
            .pop_front()
            .ok_or(LlmError::ApiError {
                status: 503,
                body: "scripted chat exhausted".to_string(),
            })
    }
}
