use super::*;
use std::collections::BTreeMap;

const DECK_JSON: &str = include_str!("../../data/deck.json");

/// The built-in quiz bank: one fixed batch per category
#[derive(Debug, Clone)]
pub struct StaticDeck {
    batches: BTreeMap<Category, Vec<Question>>,
}

impl StaticDeck {
    /// Parse the deck compiled into the binary
    pub fn load() -> ProviderResult<Self> {
        Self::from_json(DECK_JSON)
    }

    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let questions: Vec<Question> =
            serde_json::from_str(json).map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let mut grouped: BTreeMap<Category, Vec<Question>> = BTreeMap::new();
        for question in questions {
            grouped.entry(question.category).or_default().push(question);
        }

        let mut batches = BTreeMap::new();
        for (category, questions) in grouped {
            batches.insert(category, validate_batch(questions)?);
        }

        tracing::debug!("Loaded static deck with {} categories", batches.len());
        Ok(Self { batches })
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.batches.keys().copied()
    }
}

#[async_trait]
impl QuestionProvider for StaticDeck {
    async fn fetch(
        &self,
        category: Category,
        _used: &BTreeSet<String>,
    ) -> ProviderResult<Vec<Question>> {
        self.batches.get(&category).cloned().ok_or_else(|| {
            ProviderError::ConfigError(format!("Static deck has no {} questions", category))
        })
    }

    fn name(&self) -> &str {
        "deck"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_covers_every_category() {
        let deck = StaticDeck::load().unwrap();
        assert_eq!(deck.categories().collect::<Vec<_>>(), Category::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_deck_batches_are_canonical() {
        let deck = StaticDeck::load().unwrap();
        for category in Category::ALL {
            let batch = deck.fetch(category, &BTreeSet::new()).await.unwrap();
            let kinds: Vec<QuestionType> = batch.iter().map(|q| q.kind).collect();
            assert_eq!(kinds, QuestionType::ALL.to_vec(), "{}", category);
        }
    }

    #[test]
    fn test_incomplete_deck_is_rejected() {
        let json = r#"[{"text": "Y-E-R-T-S-Y-M", "answer": "MYSTERY", "category": "Mystery", "type": "Word Scramble"}]"#;
        assert!(matches!(
            StaticDeck::from_json(json),
            Err(ProviderError::IncompleteBatch(QuestionType::VisualDecode))
        ));
    }

    #[tokio::test]
    async fn test_missing_category_is_a_config_error() {
        let deck = StaticDeck {
            batches: BTreeMap::new(),
        };
        assert!(matches!(
            deck.fetch(Category::Sports, &BTreeSet::new()).await,
            Err(ProviderError::ConfigError(_))
        ));
    }
}
