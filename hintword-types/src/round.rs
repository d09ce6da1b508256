use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{ClueId, LobbyId, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum WordStatus {
    NotUsed,
    InUse,
    Used,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClueStatus {
    Created,
    Active,
    Disabled,
}

/// Where the active round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoundPhase {
    ChoosingWord,   // Guesser picks a word from the active card
    WritingClues,   // Clue creators submit hints
    ReviewingClues, // Clue creators flag and compare
    Guessing,       // Guesser resolves the card
    Finished,       // Deck exhausted
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClueView {
    pub id: ClueId,
    pub author: Option<PlayerId>,
    pub hint: Option<String>,
    pub status: ClueStatus,
    pub flags: u32,
    pub elapsed_ms: u64,
}

impl ClueView {
    /// Guessers never see the text of a clue the table disabled.
    pub fn for_guesser(mut self) -> Self {
        if self.status == ClueStatus::Disabled {
            self.hint = None;
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameView {
    pub lobby_id: LobbyId,
    pub round: u32,
    pub phase: RoundPhase,
    pub active_guess: Option<String>,
    pub last_success: Option<bool>,
    pub won_cards: u32,
    pub lost_cards: u32,
    pub left_cards: u32,
    pub words_on_card: u32,
    pub mystery_word: Option<String>,
    pub clue_deadline: Option<String>, // ISO 8601 string
    pub clues: Vec<ClueView>,
}

impl GameView {
    /// Version of the view that is safe to send to the guesser.
    pub fn for_guesser(mut self) -> Self {
        if self.phase != RoundPhase::Finished {
            self.mystery_word = None;
        }
        self.clues = self.clues.into_iter().map(ClueView::for_guesser).collect();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameStatsView {
    pub player_id: PlayerId,
    pub lobby_id: LobbyId,
    pub guess_count: u32,
    pub correct_guess_count: u32,
    pub clues_given: u32,
    pub good_clues: u32,
    pub guess_time_ms: u64,
    pub clue_time_ms: u64,
    pub team_points: u32,
    pub score: i64,
    pub average_guess_time_ms: Option<u64>,
    pub average_clue_time_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn clue(status: ClueStatus) -> ClueView {
        ClueView {
            id: Uuid::new_v4(),
            author: Some(Uuid::new_v4()),
            hint: Some("bright".to_string()),
            status,
            flags: 0,
            elapsed_ms: 1200,
        }
    }

    #[test]
    fn test_guesser_view_hides_word_and_disabled_hints() {
        let view = GameView {
            lobby_id: Uuid::new_v4(),
            round: 1,
            phase: RoundPhase::Guessing,
            active_guess: None,
            last_success: None,
            won_cards: 0,
            lost_cards: 0,
            left_cards: 3,
            words_on_card: 5,
            mystery_word: Some("Sun".to_string()),
            clue_deadline: None,
            clues: vec![clue(ClueStatus::Active), clue(ClueStatus::Disabled)],
        };

        let safe = view.for_guesser();
        assert!(safe.mystery_word.is_none());
        assert_eq!(safe.clues[0].hint.as_deref(), Some("bright"));
        assert!(safe.clues[1].hint.is_none());
    }
}
