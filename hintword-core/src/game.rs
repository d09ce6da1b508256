use std::collections::HashSet;

use chrono::{DateTime, Utc};
use hintword_types::{ClueId, ClueStatus, ClueView, PlayerId, RoundPhase};
use uuid::Uuid;

/// A single-word hint. Referenced by its author and by the round it was
/// written for; the author reference is cleared when the author leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct Clue {
    pub id: ClueId,
    pub author: Option<PlayerId>,
    pub hint: String,
    pub status: ClueStatus,
    pub flags: u32,
    pub flagged_by: HashSet<PlayerId>,
    pub elapsed_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl Clue {
    pub fn new(author: PlayerId, hint: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            author: Some(author),
            hint: hint.into(),
            status: ClueStatus::Created,
            flags: 0,
            flagged_by: HashSet::new(),
            elapsed_ms,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ClueStatus::Active
    }

    pub fn to_view(&self) -> ClueView {
        ClueView {
            id: self.id,
            author: self.author,
            hint: Some(self.hint.clone()),
            status: self.status,
            flags: self.flags,
            elapsed_ms: self.elapsed_ms,
        }
    }
}

/// One play session of a lobby: card counters plus the clues of the
/// current round.
#[derive(Debug, Clone)]
pub struct Game {
    pub id: Uuid,
    pub round: u32,
    pub phase: RoundPhase,
    pub active_guess: Option<String>,
    pub last_success: Option<bool>,
    pub won_cards: u32,
    pub lost_cards: u32,
    pub left_cards: u32,
    pub clues: Vec<Clue>,
    pub finished_comparing: HashSet<PlayerId>,
    pub started_at: DateTime<Utc>,
}

impl Game {
    pub fn new(card_count: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            round: 1,
            phase: RoundPhase::ChoosingWord,
            active_guess: None,
            last_success: None,
            won_cards: 0,
            lost_cards: 0,
            left_cards: card_count,
            clues: Vec::new(),
            finished_comparing: HashSet::new(),
            started_at: Utc::now(),
        }
    }

    pub fn clue(&self, clue_id: ClueId) -> Option<&Clue> {
        self.clues.iter().find(|c| c.id == clue_id)
    }

    pub fn clue_mut(&mut self, clue_id: ClueId) -> Option<&mut Clue> {
        self.clues.iter_mut().find(|c| c.id == clue_id)
    }

    /// Take a clue out of the round and forget its author.
    pub fn detach_clue(&mut self, clue_id: ClueId) -> Option<Clue> {
        let index = self.clues.iter().position(|c| c.id == clue_id)?;
        let mut clue = self.clues.remove(index);
        clue.author = None;
        Some(clue)
    }

    /// Apply the card-progress policy for one resolved card.
    ///
    /// A miss with a real guess after at least one win also turns one won
    /// card into a lost one.
    pub fn record_card_outcome(&mut self, success: bool, guess_was_empty: bool) {
        if success {
            self.won_cards += 1;
        } else {
            if !guess_was_empty && self.won_cards > 0 {
                self.won_cards -= 1;
                self.lost_cards += 1;
            }
            self.lost_cards += 1;
        }
        self.left_cards = self.left_cards.saturating_sub(1);
    }

    /// Clear per-round state before the next card.
    pub fn begin_next_round(&mut self) {
        self.round += 1;
        self.phase = RoundPhase::ChoosingWord;
        self.clues.clear();
        self.finished_comparing.clear();
    }

    pub fn clue_views(&self) -> Vec<ClueView> {
        self.clues.iter().map(Clue::to_view).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_counts_from_deck() {
        let game = Game::new(13);
        assert_eq!(game.left_cards, 13);
        assert_eq!(game.won_cards, 0);
        assert_eq!(game.lost_cards, 0);
        assert!(game.active_guess.is_none());
        assert!(game.last_success.is_none());
        assert_eq!(game.phase, RoundPhase::ChoosingWord);
    }

    #[test]
    fn test_correct_guess_wins_card() {
        let mut game = Game::new(5);
        game.record_card_outcome(true, false);
        assert_eq!((game.won_cards, game.lost_cards, game.left_cards), (1, 0, 4));
    }

    #[test]
    fn test_miss_after_win_applies_streak_penalty() {
        let mut game = Game::new(5);
        game.record_card_outcome(true, false);
        game.record_card_outcome(false, false);
        assert_eq!((game.won_cards, game.lost_cards, game.left_cards), (0, 2, 3));
    }

    #[test]
    fn test_miss_without_wins_or_with_pass() {
        let mut game = Game::new(5);
        game.record_card_outcome(false, false);
        assert_eq!((game.won_cards, game.lost_cards, game.left_cards), (0, 1, 4));

        game.record_card_outcome(true, false);
        // A pass never converts a won card
        game.record_card_outcome(false, true);
        assert_eq!((game.won_cards, game.lost_cards, game.left_cards), (1, 2, 2));
    }

    #[test]
    fn test_left_cards_never_underflow() {
        let mut game = Game::new(0);
        game.record_card_outcome(false, true);
        assert_eq!(game.left_cards, 0);
    }

    #[test]
    fn test_detach_clue_clears_author() {
        let mut game = Game::new(1);
        let author = Uuid::new_v4();
        let clue = Clue::new(author, "bright", 100);
        let clue_id = clue.id;
        game.clues.push(clue);

        let detached = game.detach_clue(clue_id).unwrap();
        assert!(detached.author.is_none());
        assert!(game.clue(clue_id).is_none());
        assert!(game.detach_clue(clue_id).is_none());
    }
}
