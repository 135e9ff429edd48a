use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque ID types
pub type GameId = String;
pub type PlayerId = u32;

/// Number of rounds in a full tournament
pub const MAX_ROUNDS: u32 = 10;
/// Seconds on the clock for a question or a challenge defense
pub const ROUND_TIME: u32 = 30;
/// Passes each player starts the tournament with
pub const STARTING_PASSES: u32 = 2;
/// Questions staged per category pick (one per question type)
pub const BATCH_SIZE: usize = 5;
/// Minimum roster size to start a tournament
pub const MIN_PLAYERS: usize = 2;
/// Roster size offered before the host locks in names
pub const DEFAULT_ROSTER_SIZE: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    pub max_rounds: u32,
    pub round_seconds: u32,
    pub starting_passes: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_rounds: MAX_ROUNDS,
            round_seconds: ROUND_TIME,
            starting_passes: STARTING_PASSES,
        }
    }
}

impl GameConfig {
    /// Load tournament tuning from environment variables, falling back to the house rules
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_rounds: env_u32("KNOCKOUT_MAX_ROUNDS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_rounds),
            round_seconds: env_u32("KNOCKOUT_ROUND_SECONDS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.round_seconds),
            starting_passes: env_u32("KNOCKOUT_STARTING_PASSES")
                .unwrap_or(defaults.starting_passes),
        }
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: i32,
    pub passes_left: u32,
    pub wrong_answers: u32,
    pub total_passes_used: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String, passes: u32) -> Self {
        Self {
            id,
            name,
            score: 0,
            passes_left: passes,
            wrong_answers: 0,
            total_passes_used: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuestionType {
    #[serde(rename = "Visual Decode")]
    VisualDecode,
    #[serde(rename = "Word Scramble")]
    WordScramble,
    #[serde(rename = "Current Pulse")]
    CurrentPulse,
    #[serde(rename = "Odd One Out")]
    OddOneOut,
    #[serde(rename = "Rapid Recall")]
    RapidRecall,
}

impl QuestionType {
    /// Every type a batch must cover, in staging order
    pub const ALL: [QuestionType; BATCH_SIZE] = [
        QuestionType::VisualDecode,
        QuestionType::WordScramble,
        QuestionType::CurrentPulse,
        QuestionType::OddOneOut,
        QuestionType::RapidRecall,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::VisualDecode => "Visual Decode",
            QuestionType::WordScramble => "Word Scramble",
            QuestionType::CurrentPulse => "Current Pulse",
            QuestionType::OddOneOut => "Odd One Out",
            QuestionType::RapidRecall => "Rapid Recall",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    /// Lenient parse for generated batches ("Odd One Out", "odd_one_out", "OddOneOut")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|t| normalize_label(t.label()) == wanted)
            .ok_or_else(|| format!("Unknown question type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    #[serde(rename = "Cuisine")]
    Cuisine,
    #[serde(rename = "Mystery")]
    Mystery,
    #[serde(rename = "Indian Cinema")]
    IndianCinema,
    #[serde(rename = "Famous Personalities")]
    FamousPersonalities,
    #[serde(rename = "Science")]
    Science,
    #[serde(rename = "Technology")]
    Technology,
    #[serde(rename = "History")]
    History,
    #[serde(rename = "Geography")]
    Geography,
    #[serde(rename = "Logic & Reasoning")]
    LogicReasoning,
    #[serde(rename = "General Knowledge")]
    GeneralKnowledge,
    #[serde(rename = "Brands & Logos")]
    BrandsLogos,
    #[serde(rename = "Ancient Indian Archaeology")]
    Archaeology,
    #[serde(rename = "Countries & Continents")]
    Countries,
    #[serde(rename = "Current Affairs")]
    CurrentAffairs,
    #[serde(rename = "Sports")]
    Sports,
    #[serde(rename = "Quantitative Aptitude")]
    QuantitativeAptitude,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::Cuisine,
        Category::Mystery,
        Category::IndianCinema,
        Category::FamousPersonalities,
        Category::Science,
        Category::Technology,
        Category::History,
        Category::Geography,
        Category::LogicReasoning,
        Category::GeneralKnowledge,
        Category::BrandsLogos,
        Category::Archaeology,
        Category::Countries,
        Category::CurrentAffairs,
        Category::Sports,
        Category::QuantitativeAptitude,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Cuisine => "Cuisine",
            Category::Mystery => "Mystery",
            Category::IndianCinema => "Indian Cinema",
            Category::FamousPersonalities => "Famous Personalities",
            Category::Science => "Science",
            Category::Technology => "Technology",
            Category::History => "History",
            Category::Geography => "Geography",
            Category::LogicReasoning => "Logic & Reasoning",
            Category::GeneralKnowledge => "General Knowledge",
            Category::BrandsLogos => "Brands & Logos",
            Category::Archaeology => "Ancient Indian Archaeology",
            Category::Countries => "Countries & Continents",
            Category::CurrentAffairs => "Current Affairs",
            Category::Sports => "Sports",
            Category::QuantitativeAptitude => "Quantitative Aptitude",
        }
    }

    /// Cover art shown on the category tile
    pub fn cover_image_url(&self) -> &'static str {
        match self {
            Category::Cuisine => "https://images.unsplash.com/photo-1504674900247-0877df9cc836?auto=format&fit=crop&q=80&w=400",
            Category::Mystery => "https://images.unsplash.com/photo-1509248961158-e54f6934749c?auto=format&fit=crop&q=80&w=400",
            Category::IndianCinema => "https://images.unsplash.com/photo-1485846234645-a62644f84728?auto=format&fit=crop&q=80&w=400",
            Category::FamousPersonalities => "https://images.unsplash.com/photo-1507679799987-c73779587ccf?auto=format&fit=crop&q=80&w=400",
            Category::Science => "https://images.unsplash.com/photo-1507413245164-6160d8298b31?auto=format&fit=crop&q=80&w=400",
            Category::Technology => "https://images.unsplash.com/photo-1518770660439-4636190af475?auto=format&fit=crop&q=80&w=400",
            Category::History => "https://images.unsplash.com/photo-1461360228754-6e81c478b882?auto=format&fit=crop&q=80&w=400",
            Category::Geography => "https://images.unsplash.com/photo-1524661135-423995f22d0b?auto=format&fit=crop&q=80&w=400",
            Category::LogicReasoning => "https://images.unsplash.com/photo-1509228468518-180dd4864904?auto=format&fit=crop&q=80&w=400",
            Category::GeneralKnowledge => "https://images.unsplash.com/photo-1456513080510-7bf3a84b82f8?auto=format&fit=crop&q=80&w=400",
            Category::BrandsLogos => "https://images.unsplash.com/photo-1599305090598-fe179d501227?auto=format&fit=crop&q=80&w=400",
            Category::Archaeology => "https://images.unsplash.com/photo-1608408843596-b3119736057c?auto=format&fit=crop&q=80&w=400",
            Category::Countries => "https://images.unsplash.com/photo-1451187580459-43490279c0fa?auto=format&fit=crop&q=80&w=400",
            Category::CurrentAffairs => "https://images.unsplash.com/photo-1495020689067-958852a7765e?auto=format&fit=crop&q=80&w=400",
            Category::Sports => "https://images.unsplash.com/photo-1541534741688-6078c6bfb5c5?auto=format&fit=crop&q=80&w=400",
            Category::QuantitativeAptitude => "https://images.unsplash.com/photo-1635070041078-e363dbe005cb?auto=format&fit=crop&q=80&w=400",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|c| normalize_label(c.label()) == wanted || normalize_label(&format!("{:?}", c)) == wanted)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Lowercase alphanumerics only, so "Logic & Reasoning" matches "logic_reasoning"
fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A staged quiz question. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub answer: String,
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Host's ruling on a challenged opponent's attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeResult {
    Correct,
    Wrong,
    Pass,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengeRecord {
    pub target_id: PlayerId,
    pub result: ChallengeResult,
}
