use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
        CreateEmbeddingRequestArgs
    },
    Client as OpenAIClient
};
use tracing::debug;

use crate::{
    config::DispatchConfig,
    dispatch::RemoteCall,
    error::{Error, Result},
    model::Batch,
    prompt::PROMPT
};

/// Builds the client handed to the agents. The API key is read from
/// `OPENAI_API_KEY` by async-openai itself.
pub fn openai_client() -> OpenAIClient<OpenAIConfig> {
    OpenAIClient::new()
}

pub struct SummaryAgent {
    client: OpenAIClient<OpenAIConfig>,
    model: String
}

impl SummaryAgent {
    pub fn new(client: OpenAIClient<OpenAIConfig>, model: &str) -> Self {
        SummaryAgent {
            client,
            model: model.to_string()
        }
    }

    pub fn from_config(client: OpenAIClient<OpenAIConfig>, config: &DispatchConfig) -> Self {
        Self::new(client, &config.chat_model)
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(PROMPT)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(text)
                    .build()?
                    .into(),
            ])
            .build()?;

        self.client
            .chat()
            .create(request)
            .await?
            .choices
            .into_iter()
            .next()
            .ok_or(Error::remote("No completion"))?
            .message
            .content
            .ok_or(Error::remote("No completion content"))
    }
}

impl RemoteCall for SummaryAgent {
    type Output = String;

    // items of one batch share its in-flight slot and run one after another.
    async fn dispatch(&self, batch: &Batch) -> Result<Vec<String>> {
        let mut summaries = Vec::with_capacity(batch.len());
        for item in &batch.items {
            debug!("summarizing item {} from {}", item.index, item.source);
            summaries.push(self.summarize(&item.text).await?);
        }
        Ok(summaries)
    }
}

pub struct EmbeddingAgent {
    client: OpenAIClient<OpenAIConfig>,
    model: String
}

impl EmbeddingAgent {
    pub fn new(client: OpenAIClient<OpenAIConfig>, model: &str) -> Self {
        EmbeddingAgent {
            client,
            model: model.to_string()
        }
    }

    pub fn from_config(client: OpenAIClient<OpenAIConfig>, config: &DispatchConfig) -> Self {
        Self::new(client, &config.embedding_model)
    }

    /// One embeddings request for the whole batch. Vectors come back in
    /// input order.
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.as_str())
            .input(texts)
            .build()?;

        let mut data = self.client
            .embeddings()
            .create(request)
            .await?
            .data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

impl RemoteCall for EmbeddingAgent {
    type Output = Vec<f32>;

    async fn dispatch(&self, batch: &Batch) -> Result<Vec<Vec<f32>>> {
        self.embed(batch.texts()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // no key and no network: an empty batch must short-circuit before any request.
    #[tokio::test]
    async fn test_embed_empty_batch_skips_request() {
        let client = OpenAIClient::with_config(OpenAIConfig::new().with_api_key("test"));
        let agent = EmbeddingAgent::new(client, "text-embedding-3-large");
        let result = agent.dispatch(&Batch::new(0, Vec::new())).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_summary_agent_empty_batch() {
        let client = OpenAIClient::with_config(OpenAIConfig::new().with_api_key("test"));
        let agent = SummaryAgent::from_config(client, &DispatchConfig::default());
        let result = agent.dispatch(&Batch::new(0, Vec::new())).await.unwrap();
        assert!(result.is_empty());
    }
}
