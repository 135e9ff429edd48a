use super::*;
use serde::Serialize;
use std::time::Instant;

/// Generates batches with a local Ollama model in JSON mode
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaGenerator {
    pub fn new(base_url: String, model: String, timeout: Duration) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout * 2)
            .build()
            .map_err(|e| ProviderError::ConfigError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
            timeout,
        })
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: String,
    format: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[async_trait]
impl QuestionProvider for OllamaGenerator {
    async fn fetch(
        &self,
        category: Category,
        used: &BTreeSet<String>,
    ) -> ProviderResult<Vec<Question>> {
        let start = Instant::now();

        let request = OllamaGenerateRequest {
            model: &self.model,
            system: GENERATION_SYSTEM_PROMPT,
            prompt: build_prompt(category, used),
            format: "json",
            stream: false,
        };
        let url = format!("{}/api/generate", self.base_url);

        let response = tokio::time::timeout(
            self.timeout,
            self.client.post(&url).json(&request).send(),
        )
        .await
        .map_err(|_| ProviderError::Timeout(self.timeout))?
        .map_err(|e| ProviderError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Ollama API returned status: {}",
                response.status()
            )));
        }

        let body: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        tracing::debug!(
            "Ollama {} answered for {} in {}ms",
            self.model,
            category,
            start.elapsed().as_millis()
        );
        parse_generated(category, &body.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
