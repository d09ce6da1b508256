use std::time::Duration;

use async_trait::async_trait;
use hintword_types::{Language, PlayerType};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::SuggestionConfig;

/// How a bot comes up with its clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionStrategy {
    RandomWord,
    Synonym,
    Antonym,
}

impl SuggestionStrategy {
    pub fn for_player(player_type: PlayerType) -> Option<Self> {
        match player_type {
            PlayerType::Human => None,
            PlayerType::RandomBot => Some(Self::RandomWord),
            PlayerType::SynonymBot => Some(Self::Synonym),
            PlayerType::AntonymBot => Some(Self::Antonym),
        }
    }

    fn relation(&self) -> Option<&'static str> {
        match self {
            Self::RandomWord => None,
            Self::Synonym => Some("rel_syn"),
            Self::Antonym => Some("rel_ant"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("No suggestion endpoints configured for {0}")]
    UnsupportedLanguage(Language),
    #[error("Suggestion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Suggestion service returned status {0}")]
    Status(u16),
    #[error("No usable suggestion for '{0}'")]
    NoCandidate(String),
}

/// Something a bot can ask for a clue.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(
        &self,
        strategy: SuggestionStrategy,
        language: Language,
        word: &str,
    ) -> Result<String, SuggestionError>;
}

/// First candidate that would pass clue validation for `word`.
pub fn pick_candidate<I, S>(candidates: I, word: &str) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let word = word.trim().to_lowercase();
    candidates
        .into_iter()
        .map(|c| c.as_ref().trim().to_string())
        .find(|c| !c.is_empty() && !c.chars().any(char::is_whitespace) && c.to_lowercase() != word)
}

#[derive(Debug, Deserialize)]
struct RelatedWord {
    word: String,
}

pub struct HttpSuggestions {
    client: Client,
    config: SuggestionConfig,
}

impl HttpSuggestions {
    pub fn new(config: SuggestionConfig, timeout: Duration) -> Result<Self, SuggestionError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    async fn random_words(&self, url: &str) -> Result<Vec<String>, SuggestionError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SuggestionError::Status(response.status().as_u16()));
        }
        Ok(response.json::<Vec<String>>().await?)
    }

    async fn related_words(
        &self,
        url: &str,
        relation: &str,
        word: &str,
    ) -> Result<Vec<String>, SuggestionError> {
        let response = self
            .client
            .get(url)
            .query(&[(relation, word), ("max", "20")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SuggestionError::Status(response.status().as_u16()));
        }
        let related: Vec<RelatedWord> = response.json().await?;
        Ok(related.into_iter().map(|r| r.word).collect())
    }
}

#[async_trait]
impl SuggestionSource for HttpSuggestions {
    async fn suggest(
        &self,
        strategy: SuggestionStrategy,
        language: Language,
        word: &str,
    ) -> Result<String, SuggestionError> {
        let endpoints = self
            .config
            .endpoints(language)
            .ok_or(SuggestionError::UnsupportedLanguage(language))?;

        let candidates = match strategy.relation() {
            None => self.random_words(&endpoints.random_word_url).await?,
            Some(relation) => {
                self.related_words(&endpoints.related_words_url, relation, word)
                    .await?
            }
        };
        debug!(
            "{:?} suggestion for '{}' returned {} candidates",
            strategy,
            word,
            candidates.len()
        );

        pick_candidate(&candidates, word).ok_or_else(|| SuggestionError::NoCandidate(word.to_string()))
    }
}
