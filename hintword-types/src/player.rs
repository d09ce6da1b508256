use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{ClueId, PlayerId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub total_score: i64,
    pub total_correct_guesses: i64,
    pub created_at: String, // ISO 8601 string for simplicity
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Role {
    ClueCreator,
    Guesser,
}

/// Human players act through the transport; every other variant is a bot
/// that draws its clues from one suggestion source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PlayerType {
    Human,
    RandomBot,
    SynonymBot,
    AntonymBot,
}

impl PlayerType {
    pub fn is_human(&self) -> bool {
        matches!(self, PlayerType::Human)
    }

    pub fn is_bot(&self) -> bool {
        !self.is_human()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PlayerStatus {
    Joined,
    Ready,
    Playing,
    WritingClues,
    ReviewingClues,
    WaitingForClues,
    WaitingForGuess,
    Finished,
    Left,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerView {
    pub id: PlayerId,
    pub user_id: Option<UserId>,
    pub display_name: String,
    pub role: Role,
    pub player_type: PlayerType,
    pub status: PlayerStatus,
    pub clue: Option<ClueId>,
    pub is_creator: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_type_classification() {
        assert!(PlayerType::Human.is_human());
        for bot in [PlayerType::RandomBot, PlayerType::SynonymBot, PlayerType::AntonymBot] {
            assert!(bot.is_bot());
        }
    }
}
