use chrono::Utc;
use hintword_types::{
    ClueId, ClueStatus, ClueView, LobbyError, LobbyEvent, LobbyResult, PlayerId, PlayerStatus,
    RoundPhase,
};
use tracing::{debug, info};

use crate::engine::RoundEngine;
use crate::game::Clue;
use crate::lobby::Lobby;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagOutcome {
    pub flags: u32,
    pub disabled: bool,
}

/// Submission, flagging and release of the clues of the active round.
pub struct ClueLedger;

impl ClueLedger {
    /// Check that a hint is one token and does not give the word away.
    pub fn validate_hint(hint: &str, mystery_word: &str) -> LobbyResult<String> {
        let hint = hint.trim();
        if hint.is_empty() {
            return Err(LobbyError::validation("clue must not be empty"));
        }
        if hint.chars().any(char::is_whitespace) {
            return Err(LobbyError::validation("clue must be a single word"));
        }
        if hint.to_lowercase() == mystery_word.trim().to_lowercase() {
            return Err(LobbyError::validation("clue must not be the mystery word"));
        }
        Ok(hint.to_string())
    }

    fn require_clue_creator(lobby: &Lobby, player_id: PlayerId) -> LobbyResult<()> {
        if !lobby.players.member(player_id)?.is_clue_creator() {
            return Err(LobbyError::unauthorized("only clue creators may do this"));
        }
        Ok(())
    }

    pub fn submit(lobby: &mut Lobby, author: PlayerId, hint: &str) -> LobbyResult<ClueId> {
        lobby.ensure_running()?;
        Self::require_clue_creator(lobby, author)?;
        if lobby.players.get(author).and_then(|p| p.clue).is_some() {
            return Err(LobbyError::conflict("already annotated"));
        }
        if lobby.phase() != Some(RoundPhase::WritingClues) {
            return Err(LobbyError::validation("clues are not being written right now"));
        }

        let word = lobby
            .deck
            .as_ref()
            .and_then(|deck| deck.word_in_use())
            .ok_or_else(|| LobbyError::validation("no mystery word in use"))?;
        let hint = Self::validate_hint(hint, &word.text)?;
        let elapsed_ms = word
            .drawn_at
            .map(|drawn| (Utc::now() - drawn).num_milliseconds().max(0) as u64)
            .unwrap_or(0);

        let mut clue = Clue::new(author, hint, elapsed_ms);
        clue.status = ClueStatus::Active;
        let clue_id = clue.id;
        lobby.game_mut()?.clues.push(clue);

        if let Some(player) = lobby.players.get_mut(author) {
            player.clue = Some(clue_id);
            player.set_status(PlayerStatus::ReviewingClues);
        }
        RoundEngine::update_clue_generator_stats(lobby, true, elapsed_ms, author)?;

        debug!("Clue {} submitted by {} in lobby {}", clue_id, author, lobby.id);
        lobby.events.record(LobbyEvent::ClueSubmitted {
            lobby_id: lobby.id,
            clue_id,
            author,
        });
        lobby.refresh_phase();
        Ok(clue_id)
    }

    /// A clue creator moves on without a clue this round.
    pub fn skip(lobby: &mut Lobby, player_id: PlayerId) -> LobbyResult<()> {
        lobby.ensure_running()?;
        Self::require_clue_creator(lobby, player_id)?;
        if lobby.phase() != Some(RoundPhase::WritingClues) {
            return Err(LobbyError::validation("clues are not being written right now"));
        }

        if let Some(player) = lobby.players.get_mut(player_id) {
            if player.status != PlayerStatus::WritingClues {
                return Ok(());
            }
            player.set_status(PlayerStatus::ReviewingClues);
        }
        lobby.events.record(LobbyEvent::ClueSkipped {
            lobby_id: lobby.id,
            player_id,
        });
        lobby.refresh_phase();
        Ok(())
    }

    /// Count a flag against a clue. Once at least half of the lobby has
    /// flagged an active clue it is disabled.
    pub fn flag(lobby: &mut Lobby, clue_id: ClueId, flagger: PlayerId) -> LobbyResult<FlagOutcome> {
        lobby.ensure_running()?;
        Self::require_clue_creator(lobby, flagger)?;

        let player_count = lobby.players.len() as u32;
        let clue = lobby
            .game_mut()?
            .clue_mut(clue_id)
            .ok_or_else(|| LobbyError::not_found(format!("clue {}", clue_id)))?;

        if !clue.flagged_by.insert(flagger) {
            return Err(LobbyError::conflict("clue already flagged by this player"));
        }
        clue.flags += 1;

        let mut disabled = false;
        if clue.is_active() && clue.flags * 2 >= player_count {
            clue.status = ClueStatus::Disabled;
            disabled = true;
        }
        let flags = clue.flags;
        let author = clue.author;

        if disabled {
            info!("Clue {} disabled after {} flags in lobby {}", clue_id, flags, lobby.id);
            if let Some(author) = author {
                RoundEngine::reduce_good_clues(lobby, author)?;
            }
            lobby.events.record(LobbyEvent::ClueDisabled {
                lobby_id: lobby.id,
                clue_id,
            });
        }

        Ok(FlagOutcome { flags, disabled })
    }

    pub fn clues_for_review(lobby: &Lobby, requester: PlayerId) -> LobbyResult<Vec<ClueView>> {
        let player = lobby.players.member(requester)?;
        let game = lobby
            .game
            .as_ref()
            .ok_or_else(|| LobbyError::validation("game has not started"))?;
        if game.phase == RoundPhase::ChoosingWord || !lobby.all_annotated() {
            return Err(LobbyError::validation("not all annotated"));
        }
        Ok(Self::redact_for(player.is_guesser(), game.clue_views()))
    }

    /// A human clue creator is done comparing. Repeats are ignored.
    pub fn finish_comparing(lobby: &mut Lobby, player_id: PlayerId) -> LobbyResult<()> {
        lobby.ensure_running()?;
        Self::require_clue_creator(lobby, player_id)?;
        match lobby.phase() {
            Some(RoundPhase::ReviewingClues) => {}
            Some(RoundPhase::Guessing) => return Ok(()),
            _ => return Err(LobbyError::validation("not all annotated")),
        }

        lobby.game_mut()?.finished_comparing.insert(player_id);
        lobby.refresh_phase();
        Ok(())
    }

    pub fn clues_for_guessing(lobby: &Lobby, requester: PlayerId) -> LobbyResult<Vec<ClueView>> {
        let player = lobby.players.member(requester)?;
        let game = lobby
            .game
            .as_ref()
            .ok_or_else(|| LobbyError::validation("game has not started"))?;
        if game.phase != RoundPhase::Guessing {
            return Err(LobbyError::validation("comparing not finished"));
        }

        Ok(Self::redact_for(player.is_guesser(), game.clue_views()))
    }

    fn redact_for(guesser: bool, clues: Vec<ClueView>) -> Vec<ClueView> {
        if guesser {
            clues.into_iter().map(ClueView::for_guesser).collect()
        } else {
            clues
        }
    }
}
