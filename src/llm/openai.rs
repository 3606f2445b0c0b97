use crate::llm::client::{CapabilityError, GenerationClient, GenerationRequest};
use crate::store::Embedder;
use crate::types::{AppError, Result};
use crate::utils::toml_config::GenerationConfig;
use async_openai::{
    config::OpenAIConfig,
    types::{
        chat::{
            ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
            ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
        },
        embeddings::CreateEmbeddingRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
    default_temperature: f32,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String, default_temperature: f32) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model,
            default_temperature,
        }
    }

    pub fn from_config(config: &GenerationConfig, api_key: String) -> Self {
        Self::new(
            api_key,
            config.api_base.clone(),
            config.model.clone(),
            config.temperature,
        )
    }
}

#[async_trait]
impl GenerationClient for OpenAIClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, CapabilityError> {
        let temperature = request.temperature.unwrap_or(self.default_temperature);

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(temperature)
            .messages(vec![
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                    request.system.clone(),
                )),
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                    request.user.clone(),
                )),
            ])
            .build()
            .map_err(|e| CapabilityError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| CapabilityError::Upstream(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(CapabilityError::EmptyResponse);
        }

        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIEmbedder {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model,
        }
    }

    pub fn from_config(config: &GenerationConfig, api_key: String) -> Self {
        Self::new(
            api_key,
            config.api_base.clone(),
            config.embedding_model.clone(),
        )
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(text.to_string())
            .build()
            .map_err(|e| {
                AppError::RetrievalUnavailable(format!("Failed to build embedding request: {}", e))
            })?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| AppError::RetrievalUnavailable(format!("Embedding API error: {}", e)))?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                AppError::RetrievalUnavailable("Embedding response contained no vectors".to_string())
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
