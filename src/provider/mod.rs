//! Answer providers - the capability the gateway delegates questions to
//!
//! Two interchangeable profiles:
//! - [`WindowProvider`]: chat completion remembering the last k exchanges
//! - [`RetrievalProvider`]: question answering over a shared document index
//!
//! A provider instance belongs to exactly one session. Providers are created
//! by a [`ProviderFactory`], built once at startup from validated config.

mod factory;
mod retrieval;
mod window;

pub use factory::ProfileFactory;
pub use retrieval::{RetrievalProvider, RetrievalSettings};
pub use window::WindowProvider;

use crate::agent::{CompletionClient, GenerationOptions, Message};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// One completed exchange. Never modified once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    question: String,
    answer: String,
}

impl HistoryEntry {
    /// Record an exchange
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        HistoryEntry {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// The question asked
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The answer given
    pub fn answer(&self) -> &str {
        &self.answer
    }
}

/// Answers questions for a single session
#[async_trait]
pub trait AnswerProvider: Send {
    /// Produce an answer to `question` given the session's history so far.
    ///
    /// Implementations must leave their own state untouched when they fail
    /// or when the returned future is dropped before completion.
    async fn answer(&mut self, question: &str, history: &[HistoryEntry]) -> Result<String>;
}

/// Creates a fresh provider for every new session
pub trait ProviderFactory: Send + Sync {
    /// Build a provider for a new session
    fn create(&self) -> Box<dyn AnswerProvider>;
}

impl<F> ProviderFactory for F
where
    F: Fn() -> Box<dyn AnswerProvider> + Send + Sync,
{
    fn create(&self) -> Box<dyn AnswerProvider> {
        self()
    }
}

/// The chat completion capability providers are built on
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete a conversation and return the reply text
    async fn complete(&self, messages: Vec<Message>, options: GenerationOptions) -> Result<String>;
}

#[async_trait]
impl CompletionModel for CompletionClient {
    async fn complete(&self, messages: Vec<Message>, options: GenerationOptions) -> Result<String> {
        CompletionClient::complete(self, messages, options).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted completion model shared by provider tests

    use super::*;
    use crate::error::Error;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned replies and records every prompt it was sent
    #[derive(Clone, Default)]
    pub struct ScriptedModel {
        replies: Arc<Mutex<VecDeque<Result<String>>>>,
        pub calls: Arc<Mutex<Vec<Vec<Message>>>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<Result<String>>) -> Self {
            ScriptedModel {
                replies: Arc::new(Mutex::new(replies.into())),
                calls: Arc::default(),
            }
        }

        pub fn call(&self, i: usize) -> Vec<Message> {
            self.calls.lock().unwrap()[i].clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionModel for ScriptedModel {
        async fn complete(&self, messages: Vec<Message>, _options: GenerationOptions) -> Result<String> {
            self.calls.lock().unwrap().push(messages);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Internal("script exhausted".into())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl AnswerProvider for Echo {
        async fn answer(&mut self, question: &str, _history: &[HistoryEntry]) -> Result<String> {
            Ok(question.to_string())
        }
    }

    #[tokio::test]
    async fn test_closure_factory() {
        let factory = || Box::new(Echo) as Box<dyn AnswerProvider>;
        let mut provider = factory.create();
        assert_eq!(provider.answer("ping", &[]).await.unwrap(), "ping");
    }

    #[test]
    fn test_history_entry_accessors() {
        let entry = HistoryEntry::new("What is 2+2?", "4.");
        assert_eq!(entry.question(), "What is 2+2?");
        assert_eq!(entry.answer(), "4.");
    }
}
