mod deck;
mod ollama;
mod openai;

use crate::types::{Category, Question, QuestionType};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;

pub use deck::StaticDeck;
pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;

/// Result type for question provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur while sourcing a question batch
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),

    #[error("Batch has no {0} question")]
    IncompleteBatch(QuestionType),
}

/// Source of question batches, one per category pick
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// One question of each required type for `category`. Texts in `used` should be
    /// avoided where the source can, but the caller filters again regardless.
    async fn fetch(&self, category: Category, used: &BTreeSet<String>)
        -> ProviderResult<Vec<Question>>;

    /// Illustration for a Visual Decode question, if this source can produce one
    async fn fetch_image(&self, _question_text: &str) -> Option<String> {
        None
    }

    /// Get the name of this provider
    fn name(&self) -> &str;
}

/// Keep exactly one question per required type, in staging order
pub fn validate_batch(questions: Vec<Question>) -> ProviderResult<Vec<Question>> {
    let mut usable: Vec<Question> = questions
        .into_iter()
        .filter(|q| !q.text.trim().is_empty() && !q.answer.trim().is_empty())
        .collect();

    let mut batch = Vec::with_capacity(QuestionType::ALL.len());
    for kind in QuestionType::ALL {
        let position = usable
            .iter()
            .position(|q| q.kind == kind)
            .ok_or(ProviderError::IncompleteBatch(kind))?;
        batch.push(usable.swap_remove(position));
    }
    Ok(batch)
}

const GENERATION_SYSTEM_PROMPT: &str = "You write questions for a fast-paced, host-moderated live quiz show. \
    Answers must be short (a word, a name or a number) and unambiguous. \
    Reply with a JSON object of the form {\"questions\": [{\"type\": ..., \"question\": ..., \"answer\": ...}]} and nothing else.";

/// Cap on used texts listed in the prompt. The game filters the batch again anyway.
const MAX_AVOID_IN_PROMPT: usize = 40;

fn build_prompt(category: Category, used: &BTreeSet<String>) -> String {
    let types = QuestionType::ALL
        .iter()
        .map(|t| t.label())
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = format!(
        "Generate exactly {} quiz questions for the category \"{}\", one of each type: {}.\n\
         \"Current Pulse\" must be about events from the last twelve months.\n\
         \"Visual Decode\" must describe a specific famous object, place or logo without naming it.\n\
         \"Word Scramble\" gives the scrambled letters separated by hyphens.",
        QuestionType::ALL.len(),
        category,
        types
    );

    if !used.is_empty() {
        prompt.push_str("\nDo not reuse any of these questions:");
        for text in used.iter().take(MAX_AVOID_IN_PROMPT) {
            prompt.push_str("\n- ");
            prompt.push_str(text);
        }
    }
    prompt
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestion {
    #[serde(rename = "type")]
    kind: String,
    question: String,
    answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeneratedPayload {
    Wrapped { questions: Vec<GeneratedQuestion> },
    Bare(Vec<GeneratedQuestion>),
}

/// Turn a generator's JSON reply into a validated batch
fn parse_generated(category: Category, text: &str) -> ProviderResult<Vec<Question>> {
    let payload: GeneratedPayload =
        serde_json::from_str(text.trim()).map_err(|e| ProviderError::ParseError(e.to_string()))?;
    let raw = match payload {
        GeneratedPayload::Wrapped { questions } | GeneratedPayload::Bare(questions) => questions,
    };

    let questions = raw
        .into_iter()
        .filter_map(|q| match q.kind.parse::<QuestionType>() {
            Ok(kind) => Some(Question {
                text: q.question.trim().to_string(),
                answer: q.answer.trim().to_string(),
                category,
                kind,
                image_url: None,
            }),
            Err(e) => {
                tracing::debug!("Dropping generated question: {}", e);
                None
            }
        })
        .collect();

    validate_batch(questions)
}

/// Configuration for question sources
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// OpenAI model to use
    pub openai_model: String,
    /// Ollama base URL. Unset means no local generator.
    pub ollama_base_url: Option<String>,
    /// Ollama model to use
    pub ollama_model: String,
    /// Timeout for one generation request
    pub timeout: Duration,
    /// Categories served by generators rather than the static deck
    pub live_categories: BTreeSet<Category>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ollama_base_url: None,
            ollama_model: "llama3.2".to_string(),
            timeout: Duration::from_secs(30),
            live_categories: BTreeSet::from([Category::CurrentAffairs]),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl ProviderConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let live_categories = match env_string("QUESTION_LIVE_CATEGORIES") {
            Some(list) => list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .filter_map(|s| match s.parse::<Category>() {
                    Ok(category) => Some(category),
                    Err(e) => {
                        tracing::warn!("Ignoring QUESTION_LIVE_CATEGORIES entry: {}", e);
                        None
                    }
                })
                .collect(),
            None => defaults.live_categories,
        };

        Self {
            openai_api_key: env_string("OPENAI_API_KEY"),
            openai_model: env_string("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            ollama_base_url: env_string("OLLAMA_BASE_URL"),
            ollama_model: env_string("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            timeout: env_string("QUESTION_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            live_categories,
        }
    }

    /// Build the bank with the static deck and every configured generator
    pub fn build_bank(&self) -> ProviderResult<QuestionBank> {
        let mut generators: Vec<Box<dyn QuestionProvider>> = Vec::new();

        if let Some(api_key) = &self.openai_api_key {
            generators.push(Box::new(OpenAiGenerator::new(
                api_key.clone(),
                self.openai_model.clone(),
                self.timeout,
            )));
        }

        if let Some(base_url) = &self.ollama_base_url {
            generators.push(Box::new(OllamaGenerator::new(
                base_url.clone(),
                self.ollama_model.clone(),
                self.timeout,
            )?));
        }

        if generators.is_empty() {
            tracing::info!("No question generators configured, every category uses the static deck");
        }

        Ok(QuestionBank::new(
            StaticDeck::load()?,
            generators,
            self.live_categories.clone(),
        ))
    }
}

/// Routes each category pick to the generators or the static deck
pub struct QuestionBank {
    deck: StaticDeck,
    generators: Vec<Box<dyn QuestionProvider>>,
    live_categories: BTreeSet<Category>,
}

impl QuestionBank {
    pub fn new(
        deck: StaticDeck,
        generators: Vec<Box<dyn QuestionProvider>>,
        live_categories: BTreeSet<Category>,
    ) -> Self {
        Self {
            deck,
            generators,
            live_categories,
        }
    }

    async fn generate(
        &self,
        category: Category,
        used: &BTreeSet<String>,
    ) -> ProviderResult<Vec<Question>> {
        let mut last_error = None;
        for generator in &self.generators {
            match generator.fetch(category, used).await {
                Ok(batch) => {
                    tracing::info!("{} generated {} questions", generator.name(), category);
                    return Ok(batch);
                }
                Err(e) => {
                    tracing::warn!("Generator {} failed for {}: {}", generator.name(), category, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| ProviderError::ConfigError("No generators configured".to_string())))
    }

    /// Fill missing Visual Decode illustrations concurrently
    async fn illustrate(&self, batch: &mut [Question]) {
        let lookups = batch.iter().map(|q| async move {
            if q.kind == QuestionType::VisualDecode && q.image_url.is_none() {
                self.fetch_image(&q.text).await
            } else {
                None
            }
        });
        let images = futures::future::join_all(lookups).await;

        for (question, image) in batch.iter_mut().zip(images) {
            if image.is_some() {
                question.image_url = image;
            }
        }
    }
}

#[async_trait]
impl QuestionProvider for QuestionBank {
    async fn fetch(
        &self,
        category: Category,
        used: &BTreeSet<String>,
    ) -> ProviderResult<Vec<Question>> {
        let mut batch = if self.live_categories.contains(&category) && !self.generators.is_empty()
        {
            self.generate(category, used).await?
        } else {
            self.deck.fetch(category, used).await?
        };

        self.illustrate(&mut batch).await;
        Ok(batch)
    }

    async fn fetch_image(&self, question_text: &str) -> Option<String> {
        for generator in &self.generators {
            if let Some(url) = generator.fetch_image(question_text).await {
                return Some(url);
            }
        }
        None
    }

    fn name(&self) -> &str {
        "bank"
    }
}
