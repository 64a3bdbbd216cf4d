//! Prompt templates and engineering

use crate::error::{Error, Result};
use handlebars::Handlebars;
use serde::Serialize;

/// A prompt template using Handlebars syntax
pub struct PromptTemplate {
    /// Template name
    name: String,
    /// Handlebars registry
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    /// Create a new prompt template
    ///
    /// Output is plain text, so HTML escaping is disabled and missing
    /// variables are treated as errors.
    pub fn new(name: impl Into<String>, template: &str) -> Result<Self> {
        let name = name.into();
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);

        registry
            .register_template_string(&name, template)
            .map_err(|e| Error::Internal(format!("Invalid template: {}", e)))?;

        Ok(PromptTemplate { name, registry })
    }

    /// Render the template with given data
    pub fn render<T: Serialize>(&self, data: &T) -> Result<String> {
        self.registry
            .render(&self.name, data)
            .map_err(|e| Error::Internal(format!("Template render error: {}", e)))
    }
}

impl std::fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTemplate").field("name", &self.name).finish()
    }
}

/// Question the gateway asks on behalf of a freshly connected client
pub const OPENING_QUESTION: &str = "I want you to act as a spoken English teacher and improver. \
I will speak to you in English and you will reply to me in English to practice my spoken English. \
I want you to keep your reply neat, limiting the reply to 100 words. \
I want you to strictly correct my grammar mistakes, typos, and factual errors. \
I want you to ask me a question in your reply. \
Now let's start practicing, you could ask me a question first. \
Remember, I want you to strictly correct my grammar mistakes, typos, and factual errors.";

/// System prompt for the bounded-memory conversation
pub const CONVERSATION_SYSTEM_PROMPT: &str = "The following is a friendly conversation between a human and an AI. \
The AI is talkative and provides lots of specific details from its context. \
If the AI does not know the answer to a question, it truthfully says it does not know.";

/// Turns a follow-up into a question that stands on its own
pub const CONDENSE_QUESTION_TEMPLATE: &str = r#"Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{{#each history}}
Human: {{this.question}}
Assistant: {{this.answer}}
{{/each}}
Follow Up Input: {{question}}
Standalone question:"#;

/// Answers a question from retrieved document chunks
pub const RETRIEVAL_QA_TEMPLATE: &str = r#"Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.

{{#each chunks}}
[{{this.source}}]
{{this.text}}

{{/each}}
Question: {{question}}
Helpful Answer:"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_template() {
        let template = PromptTemplate::new("greeting", "Hello, {{name}}!").unwrap();
        let result = template.render(&json!({ "name": "World" })).unwrap();
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_no_html_escaping() {
        let template = PromptTemplate::new("raw", "{{text}}").unwrap();
        let result = template.render(&json!({ "text": "a < b && \"c\"" })).unwrap();
        assert_eq!(result, "a < b && \"c\"");
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let template = PromptTemplate::new("strict", "{{missing}}").unwrap();
        assert!(template.render(&json!({})).is_err());
    }

    #[test]
    fn test_condense_template_renders_history() {
        let template = PromptTemplate::new("condense", CONDENSE_QUESTION_TEMPLATE).unwrap();
        let result = template
            .render(&json!({
                "history": [{ "question": "Who wrote Dune?", "answer": "Frank Herbert." }],
                "question": "When was it published?"
            }))
            .unwrap();
        assert!(result.contains("Human: Who wrote Dune?"));
        assert!(result.contains("Assistant: Frank Herbert."));
        assert!(result.ends_with("Follow Up Input: When was it published?\nStandalone question:"));
    }
}
