//! Builds per-session providers from validated configuration

use super::retrieval::{RetrievalPrompts, RetrievalSettings};
use super::{AnswerProvider, CompletionModel, ProviderFactory, RetrievalProvider, WindowProvider};
use crate::agent::{prompts, CompletionClient, GenerationOptions};
use crate::config::{AnswerMode, Config, WindowConfig};
use crate::error::{Error, Result};
use crate::knowledge::{DocumentIndex, Embedder, EmbeddingCache, RemoteEmbedder};
use std::sync::Arc;
use tracing::info;

/// Resources shared by all sessions of one profile
enum Profile {
    Window {
        system_prompt: String,
        k: usize,
    },
    Retrieval {
        embedder: Arc<dyn Embedder>,
        index: Arc<DocumentIndex>,
        prompts: Arc<RetrievalPrompts>,
        settings: RetrievalSettings,
    },
}

/// Factory for the configured answer profile
pub struct ProfileFactory {
    model: Arc<dyn CompletionModel>,
    options: GenerationOptions,
    profile: Profile,
}

impl ProfileFactory {
    /// Build the factory from configuration. Loads the document index up
    /// front when retrieval mode is selected.
    pub fn from_config(config: &Config, client: CompletionClient) -> Result<Self> {
        let options = client.default_options();

        match config.answer.mode {
            AnswerMode::Window => Ok(Self::window(Arc::new(client), options, &config.answer.window)),
            AnswerMode::Retrieval => {
                let path = config.answer.retrieval.index_path.as_ref().ok_or_else(|| {
                    Error::Config("Retrieval mode requires answer.retrieval.index_path".into())
                })?;
                let index = Arc::new(DocumentIndex::load(path)?);
                if let Some(model) = index.model() {
                    if model != config.provider.embedding_model {
                        tracing::warn!(
                            "Index was built with {} but queries use {}",
                            model,
                            config.provider.embedding_model
                        );
                    }
                }

                let embedder = Arc::new(RemoteEmbedder::new(client.clone(), EmbeddingCache::new()));
                Self::retrieval(
                    Arc::new(client),
                    embedder,
                    index,
                    options,
                    RetrievalSettings::from(&config.answer.retrieval),
                )
            }
        }
    }

    /// Bounded-memory factory
    pub fn window(model: Arc<dyn CompletionModel>, options: GenerationOptions, config: &WindowConfig) -> Self {
        let system_prompt = config
            .system_prompt
            .clone()
            .unwrap_or_else(|| prompts::CONVERSATION_SYSTEM_PROMPT.to_string());

        ProfileFactory {
            model,
            options,
            profile: Profile::Window {
                system_prompt,
                k: config.k,
            },
        }
    }

    /// Retrieval-augmented factory over a shared, read-only index
    pub fn retrieval(
        model: Arc<dyn CompletionModel>,
        embedder: Arc<dyn Embedder>,
        index: Arc<DocumentIndex>,
        options: GenerationOptions,
        settings: RetrievalSettings,
    ) -> Result<Self> {
        info!("Retrieval profile over {} chunks", index.len());

        Ok(ProfileFactory {
            model,
            options,
            profile: Profile::Retrieval {
                embedder,
                index,
                prompts: Arc::new(RetrievalPrompts::new()?),
                settings,
            },
        })
    }

    /// Which profile this factory produces
    pub fn mode(&self) -> AnswerMode {
        match self.profile {
            Profile::Window { .. } => AnswerMode::Window,
            Profile::Retrieval { .. } => AnswerMode::Retrieval,
        }
    }
}

impl ProviderFactory for ProfileFactory {
    fn create(&self) -> Box<dyn AnswerProvider> {
        match &self.profile {
            Profile::Window { system_prompt, k } => Box::new(WindowProvider::new(
                self.model.clone(),
                self.options.clone(),
                system_prompt.clone(),
                *k,
            )),
            Profile::Retrieval {
                embedder,
                index,
                prompts,
                settings,
            } => Box::new(RetrievalProvider::new(
                self.model.clone(),
                embedder.clone(),
                index.clone(),
                prompts.clone(),
                self.options.clone(),
                *settings,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::provider::testing::ScriptedModel;
    use secrecy::SecretString;

    fn client() -> CompletionClient {
        CompletionClient::new(ProviderConfig {
            api_key: SecretString::from("test-key"),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_window_from_config() {
        let factory = ProfileFactory::from_config(&Config::default(), client()).unwrap();
        assert_eq!(factory.mode(), AnswerMode::Window);
    }

    #[test]
    fn test_retrieval_from_config_loads_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(
            &path,
            r#"{ "chunks": [{ "id": "a", "text": "alpha", "embedding": [1.0] }] }"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.answer.mode = AnswerMode::Retrieval;
        config.answer.retrieval.index_path = Some(path);

        let factory = ProfileFactory::from_config(&config, client()).unwrap();
        assert_eq!(factory.mode(), AnswerMode::Retrieval);
    }

    #[test]
    fn test_retrieval_without_index_fails() {
        let mut config = Config::default();
        config.answer.mode = AnswerMode::Retrieval;
        assert!(ProfileFactory::from_config(&config, client()).is_err());
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_memory() {
        let model = ScriptedModel::new(vec![Ok("a".into()), Ok("b".into())]);
        let factory = ProfileFactory::window(
            Arc::new(model.clone()),
            GenerationOptions::precise(),
            &WindowConfig::default(),
        );

        let mut first = factory.create();
        let mut second = factory.create();
        first.answer("one", &[]).await.unwrap();
        second.answer("two", &[]).await.unwrap();

        // second session's prompt: system + its own question only
        assert_eq!(model.call(1).len(), 2);
    }
}
