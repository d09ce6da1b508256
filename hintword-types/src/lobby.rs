use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::{LobbyId, PlayerId, PlayerView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LobbyStatus {
    Waiting,  // Players joining and readying up
    Running,  // Game in progress
    Finished, // Deck exhausted or lobby emptied
}

impl LobbyStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LobbyStatus::Finished)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    De,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
        }
    }

    pub fn all() -> [Language; 2] {
        [Language::En, Language::De]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "de" | "german" | "deutsch" => Ok(Language::De),
            other => Err(format!("unknown language '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameMode {
    Humans, // No bots allowed
    Bots,   // Creator plays with bots
    Mixed,  // Humans and bots
}

impl GameMode {
    pub fn allows_bots(&self) -> bool {
        !matches!(self, GameMode::Humans)
    }
}

/// Lobby summary relayed to clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LobbyView {
    pub id: LobbyId,
    pub name: String,
    pub status: LobbyStatus,
    pub language: Language,
    pub mode: GameMode,
    pub creator: PlayerId,
    pub players: Vec<PlayerView>,
    pub deck_size: u32,
    pub created_at: String, // ISO 8601 string
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!(" DE ".parse::<Language>().unwrap(), Language::De);
        assert_eq!("deutsch".parse::<Language>().unwrap(), Language::De);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_modes_and_status() {
        assert!(!GameMode::Humans.allows_bots());
        assert!(GameMode::Bots.allows_bots());
        assert!(GameMode::Mixed.allows_bots());
        assert!(LobbyStatus::Finished.is_terminal());
        assert!(!LobbyStatus::Running.is_terminal());
    }
}
