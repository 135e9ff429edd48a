use super::*;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use std::time::Instant;

/// Generates batches through the OpenAI chat completions API in JSON mode
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self {
            client,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl QuestionProvider for OpenAiGenerator {
    async fn fetch(
        &self,
        category: Category,
        used: &BTreeSet<String>,
    ) -> ProviderResult<Vec<Question>> {
        let start = Instant::now();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .response_format(ResponseFormat::JsonObject)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(GENERATION_SYSTEM_PROMPT)
                    .build()
                    .map_err(|e| ProviderError::ApiError(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(build_prompt(category, used))
                    .build()
                    .map_err(|e| ProviderError::ApiError(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| ProviderError::ApiError(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
            .map_err(|e| ProviderError::ApiError(e.to_string()))?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::ParseError("No content in response".to_string()))?;

        tracing::debug!(
            "OpenAI {} answered for {} in {}ms",
            self.model,
            category,
            start.elapsed().as_millis()
        );
        parse_generated(category, &text)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
