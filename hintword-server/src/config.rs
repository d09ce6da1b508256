use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use hintword_core::{LobbyCleanup, LobbySettings};
use hintword_types::Language;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub cards_directory: String,
    pub min_players_to_start: usize,
    pub max_players_per_lobby: usize,
    pub cards_per_lobby: usize,
    pub clue_time_seconds: u64,
    pub lobby_idle_minutes: u64,
    pub finished_grace_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub event_buffer: usize,
    pub suggestion_timeout_ms: u64,
    pub suggestions: SuggestionConfig,
}

impl Config {
    pub fn new() -> Self {
        Self {
            cards_directory: env::var("CARDS_DIRECTORY")
                .unwrap_or_else(|_| "./shared/cards".to_string()),
            min_players_to_start: env_or("MIN_PLAYERS_TO_START", 3),
            max_players_per_lobby: env_or("MAX_PLAYERS_PER_LOBBY", 8),
            cards_per_lobby: env_or("CARDS_PER_LOBBY", 13),
            clue_time_seconds: env_or("CLUE_TIME_SECONDS", 90),
            lobby_idle_minutes: env_or("LOBBY_IDLE_MINUTES", 30),
            finished_grace_seconds: env_or("FINISHED_LOBBY_GRACE_SECONDS", 300),
            cleanup_interval_seconds: env_or("CLEANUP_INTERVAL_SECONDS", 30),
            event_buffer: env_or("EVENT_BUFFER", 256),
            suggestion_timeout_ms: env_or("SUGGESTION_TIMEOUT_MS", 5_000),
            suggestions: SuggestionConfig::from_env(),
        }
    }

    pub fn lobby_settings(&self) -> LobbySettings {
        LobbySettings {
            min_players: self.min_players_to_start,
            max_players: self.max_players_per_lobby,
            clue_time: chrono::Duration::seconds(self.clue_time_seconds as i64),
        }
    }

    pub fn cleanup_policy(&self) -> LobbyCleanup {
        LobbyCleanup::new(
            Duration::from_secs(self.lobby_idle_minutes * 60),
            Duration::from_secs(self.finished_grace_seconds),
        )
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }

    /// Upper bound on one bot suggestion, HTTP round trip included.
    pub fn suggestion_timeout(&self) -> Duration {
        Duration::from_millis(self.suggestion_timeout_ms.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an environment variable, keeping `default` when it is unset or
/// malformed.
fn env_or<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}='{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// HTTP endpoints used by the bots of one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionEndpoints {
    /// Returns a JSON array of random words
    pub random_word_url: String,
    /// Datamuse-style related-word lookup (`rel_syn`, `rel_ant`)
    pub related_words_url: String,
}

/// Per-language suggestion endpoints, handed to the suggestion client at
/// construction.
#[derive(Debug, Clone, Default)]
pub struct SuggestionConfig {
    endpoints: HashMap<Language, SuggestionEndpoints>,
}

impl SuggestionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoints(mut self, language: Language, endpoints: SuggestionEndpoints) -> Self {
        self.endpoints.insert(language, endpoints);
        self
    }

    pub fn endpoints(&self, language: Language) -> Option<&SuggestionEndpoints> {
        self.endpoints.get(&language)
    }

    /// Defaults per language, overridable with
    /// `SUGGESTION_RANDOM_URL_<CODE>` and `SUGGESTION_RELATED_URL_<CODE>`.
    pub fn from_env() -> Self {
        Language::all()
            .into_iter()
            .fold(Self::new(), |config, language| {
                let code = language.code().to_uppercase();
                let (random_default, related_default) = match language {
                    Language::En => (
                        "https://random-word-api.herokuapp.com/word?number=1",
                        "https://api.datamuse.com/words",
                    ),
                    Language::De => (
                        "https://random-word-api.herokuapp.com/word?number=1&lang=de",
                        "https://api.datamuse.com/words?v=de",
                    ),
                };
                config.with_endpoints(
                    language,
                    SuggestionEndpoints {
                        random_word_url: env::var(format!("SUGGESTION_RANDOM_URL_{}", code))
                            .unwrap_or_else(|_| random_default.to_string()),
                        related_words_url: env::var(format!("SUGGESTION_RELATED_URL_{}", code))
                            .unwrap_or_else(|_| related_default.to_string()),
                    },
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        // SAFETY: test-local variable name, no other test reads it
        unsafe { env::set_var("HINTWORD_TEST_GARBAGE", "many") };
        assert_eq!(env_or("HINTWORD_TEST_GARBAGE", 7usize), 7);
        assert_eq!(env_or("HINTWORD_TEST_UNSET_VALUE", 3u64), 3);
    }

    #[test]
    fn test_suggestion_defaults_cover_every_language() {
        let config = SuggestionConfig::from_env();
        for language in Language::all() {
            assert!(config.endpoints(language).is_some());
        }
    }

    #[test]
    fn test_settings_follow_config() {
        let mut config = Config::new();
        config.min_players_to_start = 4;
        config.clue_time_seconds = 45;
        let settings = config.lobby_settings();
        assert_eq!(settings.min_players, 4);
        assert_eq!(settings.clue_time, chrono::Duration::seconds(45));
    }

    #[test]
    fn test_suggestion_timeout_is_never_zero() {
        let mut config = Config::new();
        config.suggestion_timeout_ms = 250;
        assert_eq!(config.suggestion_timeout(), Duration::from_millis(250));
        config.suggestion_timeout_ms = 0;
        assert_eq!(config.suggestion_timeout(), Duration::from_millis(1));
    }
}
