//! Retrieval-augmented question answering profile

use super::{AnswerProvider, CompletionModel, HistoryEntry};
use crate::agent::{prompts, GenerationOptions, Message, PromptTemplate};
use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::knowledge::{DocumentIndex, Embedder};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Tuning for retrieval sessions
#[derive(Debug, Clone, Copy)]
pub struct RetrievalSettings {
    /// Chunks placed in the answer prompt
    pub top_k: usize,
    /// Minimum similarity for a chunk to be used
    pub min_score: f32,
    /// Most recent history entries used for reformulation
    pub max_history: usize,
}

impl From<&RetrievalConfig> for RetrievalSettings {
    fn from(config: &RetrievalConfig) -> Self {
        RetrievalSettings {
            top_k: config.top_k,
            min_score: config.min_score,
            max_history: config.max_history,
        }
    }
}

/// Prompt templates shared by every retrieval session
pub(super) struct RetrievalPrompts {
    condense: PromptTemplate,
    answer: PromptTemplate,
}

impl RetrievalPrompts {
    pub(super) fn new() -> Result<Self> {
        Ok(RetrievalPrompts {
            condense: PromptTemplate::new("condense_question", prompts::CONDENSE_QUESTION_TEMPLATE)?,
            answer: PromptTemplate::new("retrieval_qa", prompts::RETRIEVAL_QA_TEMPLATE)?,
        })
    }
}

#[derive(Serialize)]
struct CondenseVars<'a> {
    history: &'a [HistoryEntry],
    question: &'a str,
}

#[derive(Serialize)]
struct ContextChunk<'a> {
    source: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct AnswerVars<'a> {
    chunks: Vec<ContextChunk<'a>>,
    question: &'a str,
}

/// Answers from the shared document index.
///
/// Follow-up questions are first rewritten into standalone questions using
/// the most recent `max_history` exchanges, then matched against the index.
pub struct RetrievalProvider {
    model: Arc<dyn CompletionModel>,
    embedder: Arc<dyn Embedder>,
    index: Arc<DocumentIndex>,
    prompts: Arc<RetrievalPrompts>,
    options: GenerationOptions,
    settings: RetrievalSettings,
}

impl RetrievalProvider {
    pub(super) fn new(
        model: Arc<dyn CompletionModel>,
        embedder: Arc<dyn Embedder>,
        index: Arc<DocumentIndex>,
        prompts: Arc<RetrievalPrompts>,
        options: GenerationOptions,
        settings: RetrievalSettings,
    ) -> Self {
        RetrievalProvider {
            model,
            embedder,
            index,
            prompts,
            options,
            settings,
        }
    }

    async fn standalone_question(&self, question: &str, history: &[HistoryEntry]) -> Result<String> {
        let recent = &history[history.len().saturating_sub(self.settings.max_history)..];
        if recent.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = self.prompts.condense.render(&CondenseVars {
            history: recent,
            question,
        })?;
        let rewritten = self
            .model
            .complete(vec![Message::user(prompt)], GenerationOptions::precise())
            .await?;

        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(rewritten.to_string())
        }
    }
}

#[async_trait]
impl AnswerProvider for RetrievalProvider {
    async fn answer(&mut self, question: &str, history: &[HistoryEntry]) -> Result<String> {
        let standalone = self.standalone_question(question, history).await?;
        let embedding = self.embedder.embed_query(&standalone).await?;
        let hits = self
            .index
            .search(&embedding, self.settings.top_k, self.settings.min_score)?;

        debug!(
            "Retrieved {} chunks for question (best score {:?})",
            hits.len(),
            hits.first().map(|h| h.score)
        );

        let prompt = self.prompts.answer.render(&AnswerVars {
            chunks: hits
                .iter()
                .map(|h| ContextChunk {
                    source: &h.chunk.source,
                    text: &h.chunk.text,
                })
                .collect(),
            question: &standalone,
        })?;

        self.model
            .complete(vec![Message::user(prompt)], self.options.clone())
            .await
    }
}
