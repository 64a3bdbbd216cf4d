//! Bounded-memory chat profile

use super::{AnswerProvider, CompletionModel, HistoryEntry};
use crate::agent::{GenerationOptions, Message};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Chat completion that remembers only the last `k` exchanges.
///
/// The rolling buffer is private to the provider, so the session history
/// passed to [`AnswerProvider::answer`] is not consulted.
pub struct WindowProvider {
    model: Arc<dyn CompletionModel>,
    options: GenerationOptions,
    system_prompt: String,
    k: usize,
    buffer: VecDeque<HistoryEntry>,
}

impl WindowProvider {
    /// Create a provider with an empty buffer
    pub fn new(
        model: Arc<dyn CompletionModel>,
        options: GenerationOptions,
        system_prompt: impl Into<String>,
        k: usize,
    ) -> Self {
        WindowProvider {
            model,
            options,
            system_prompt: system_prompt.into(),
            k,
            buffer: VecDeque::with_capacity(k + 1),
        }
    }

    /// Exchanges currently remembered, oldest first
    pub fn remembered(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.buffer.iter()
    }

    fn build_messages(&self, question: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.buffer.len() * 2 + 2);
        messages.push(Message::system(&self.system_prompt));
        for entry in &self.buffer {
            messages.push(Message::user(entry.question()));
            messages.push(Message::assistant(entry.answer()));
        }
        messages.push(Message::user(question));
        messages
    }
}

#[async_trait]
impl AnswerProvider for WindowProvider {
    async fn answer(&mut self, question: &str, _history: &[HistoryEntry]) -> Result<String> {
        let messages = self.build_messages(question);
        debug!(
            "Window answer: {} remembered exchanges, {} messages",
            self.buffer.len(),
            messages.len()
        );

        let answer = self.model.complete(messages, self.options.clone()).await?;

        self.buffer.push_back(HistoryEntry::new(question, answer.clone()));
        while self.buffer.len() > self.k {
            self.buffer.pop_front();
        }

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;
    use crate::error::Error;
    use crate::provider::testing::ScriptedModel;

    fn provider(model: &ScriptedModel, k: usize) -> WindowProvider {
        WindowProvider::new(
            Arc::new(model.clone()),
            GenerationOptions::precise(),
            "system",
            k,
        )
    }

    #[tokio::test]
    async fn test_first_answer_has_no_memory() {
        let model = ScriptedModel::new(vec![Ok("4.".into())]);
        let mut provider = provider(&model, 3);

        assert_eq!(provider.answer("What is 2+2?", &[]).await.unwrap(), "4.");

        let sent = model.call(0);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[1], Message::user("What is 2+2?"));
    }

    #[tokio::test]
    async fn test_keeps_only_last_k_exchanges() {
        let replies = (1..=5).map(|i| Ok(format!("a{}", i))).collect();
        let model = ScriptedModel::new(replies);
        let mut provider = provider(&model, 3);

        for i in 1..=5 {
            provider.answer(&format!("q{}", i), &[]).await.unwrap();
        }

        // the fifth prompt carries exchanges 2..=4 only
        let sent = model.call(4);
        assert_eq!(sent.len(), 1 + 3 * 2 + 1);
        assert_eq!(sent[1], Message::user("q2"));
        assert_eq!(sent[2], Message::assistant("a2"));
        assert_eq!(sent[6], Message::assistant("a4"));
        assert_eq!(sent[7], Message::user("q5"));

        let remembered: Vec<_> = provider.remembered().map(|e| e.question()).collect();
        assert_eq!(remembered, vec!["q3", "q4", "q5"]);
    }

    #[tokio::test]
    async fn test_failed_turn_is_not_remembered() {
        let model = ScriptedModel::new(vec![
            Ok("first".into()),
            Err(Error::UpstreamTimeout("slow".into())),
            Ok("third".into()),
        ]);
        let mut provider = provider(&model, 3);

        provider.answer("one", &[]).await.unwrap();
        assert!(provider.answer("two", &[]).await.is_err());
        provider.answer("three", &[]).await.unwrap();

        let sent = model.call(2);
        assert_eq!(sent.len(), 1 + 2 + 1);
        assert_eq!(sent[1], Message::user("one"));
        assert_eq!(model.call_count(), 3);
    }
}
