use hintword_types::{LobbyError, LobbyResult, PlayerId};
use tracing::{debug, info};

use crate::deck::Deck;
use crate::game::Game;
use crate::lobby::Lobby;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    pub guess: String,
    pub success: bool,
    pub won_cards: u32,
    pub lost_cards: u32,
    pub left_cards: u32,
}

/// Guess resolution, card progress and the statistics that follow from them.
pub struct RoundEngine;

impl RoundEngine {
    pub fn create_new_game(deck: &Deck) -> Game {
        Game::new(deck.len() as u32)
    }

    /// Text of the word in use on the active card, empty when none is.
    pub fn get_mystery_word(lobby: &Lobby) -> String {
        lobby
            .deck
            .as_ref()
            .and_then(Deck::word_in_use)
            .map(|w| w.text.clone())
            .unwrap_or_default()
    }

    pub fn compare_guess(
        lobby: &mut Lobby,
        guess: &str,
        guesser_id: PlayerId,
        elapsed_ms: u64,
    ) -> LobbyResult<GuessOutcome> {
        let word = lobby
            .deck
            .as_ref()
            .and_then(Deck::word_in_use)
            .ok_or_else(|| LobbyError::validation("no mystery word in use"))?;
        let guess = guess.trim().to_string();
        let success = !guess.is_empty() && word.matches(&guess);

        let game = lobby.game_mut()?;
        game.active_guess = Some(guess.clone());
        game.last_success = Some(success);
        game.record_card_outcome(success, guess.is_empty());
        let (won_cards, lost_cards, left_cards) =
            (game.won_cards, game.lost_cards, game.left_cards);

        lobby
            .stats
            .expect_mut(guesser_id)?
            .record_guess(success, elapsed_ms);
        if success {
            if let Some(guesser) = lobby.players.get_mut(guesser_id) {
                guesser.total_correct_guesses += 1;
            }
        }

        // Team points follow the won-card count for everyone at the table
        for player in lobby.players.iter() {
            lobby.stats.expect_mut(player.id)?.set_team_points(won_cards);
        }

        debug!(
            "Lobby {} guess '{}' success={} won={} lost={} left={}",
            lobby.id, guess, success, won_cards, lost_cards, left_cards
        );

        if left_cards == 0 {
            Self::fold_scores(lobby)?;
        }

        Ok(GuessOutcome {
            guess,
            success,
            won_cards,
            lost_cards,
            left_cards,
        })
    }

    /// Add each player's lobby score to their persistent total.
    fn fold_scores(lobby: &mut Lobby) -> LobbyResult<()> {
        for player in lobby.players.iter_mut() {
            player.total_score += lobby.stats.expect_mut(player.id)?.score;
        }
        info!("Folded final scores for lobby {}", lobby.id);
        Ok(())
    }

    pub fn update_clue_generator_stats(
        lobby: &mut Lobby,
        was_good_clue: bool,
        elapsed_ms: u64,
        player_id: PlayerId,
    ) -> LobbyResult<()> {
        lobby
            .stats
            .expect_mut(player_id)?
            .record_clue(was_good_clue, elapsed_ms);
        Ok(())
    }

    /// Take back a good clue that the table later flagged.
    pub fn reduce_good_clues(lobby: &mut Lobby, player_id: PlayerId) -> LobbyResult<()> {
        lobby.stats.expect_mut(player_id)?.reduce_good_clues();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Card;
    use crate::lobby::LobbySettings;
    use crate::player::Player;
    use chrono::Utc;
    use hintword_types::{ErrorKind, GameMode, Language, Role, User};
    use uuid::Uuid;

    fn lobby_with_creator() -> Lobby {
        let user = User {
            id: Uuid::new_v4(),
            display_name: "A".to_string(),
            total_score: 7,
            total_correct_guesses: 0,
            created_at: Utc::now().to_rfc3339(),
        };
        Lobby::new(
            "L",
            Language::En,
            GameMode::Humans,
            Player::human(&user, Role::ClueCreator),
            Deck::new(vec![Card::from_words(Language::En, &["Sun", "Moon"])]),
            LobbySettings::default(),
        )
    }

    #[test]
    fn test_fold_scores_without_stats_is_invariant() {
        let mut lobby = lobby_with_creator();
        let creator = lobby.creator;
        lobby.stats.remove(creator);

        let err = RoundEngine::fold_scores(&mut lobby).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
        assert_eq!(lobby.player(creator).unwrap().total_score, 7);
    }

    #[test]
    fn test_fold_scores_adds_lobby_score() {
        let mut lobby = lobby_with_creator();
        let creator = lobby.creator;
        lobby.stats.expect_mut(creator).unwrap().set_team_points(1);
        let score = lobby.stats_for(creator).unwrap().score;

        RoundEngine::fold_scores(&mut lobby).unwrap();
        assert_eq!(lobby.player(creator).unwrap().total_score, 7 + score);
    }
}
