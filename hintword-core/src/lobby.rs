use chrono::{DateTime, Duration, Utc};
use hintword_types::{
    ClueId, ClueView, GameMode, GameStatsView, GameView, Language, LobbyError, LobbyEvent,
    LobbyId, LobbyResult, LobbyStatus, LobbyView, PlayerId, PlayerStatus, PlayerType, Role,
    RoundPhase, UserId,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clues::{ClueLedger, FlagOutcome};
use crate::deck::{Card, Deck};
use crate::engine::{GuessOutcome, RoundEngine};
use crate::events::EventLog;
use crate::game::{Clue, Game};
use crate::player::{Player, Roster};
use crate::stats::{GameStats, StatsBook};

#[derive(Debug, Clone)]
pub struct LobbySettings {
    pub min_players: usize,
    pub max_players: usize,
    pub clue_time: Duration,
}

impl Default for LobbySettings {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: 8,
            clue_time: Duration::seconds(90),
        }
    }
}

/// What a removal changed, for the host to persist and announce.
#[derive(Debug, Clone)]
pub struct RemovalOutcome {
    pub player: Player,
    pub detached_clue: Option<Clue>,
    pub new_creator: Option<PlayerId>,
    pub new_guesser: Option<PlayerId>,
    pub finished: bool,
}

/// The lobby aggregate: players, deck, game, clues and statistics. Every
/// mutation goes through `&mut self`, so whoever holds the lobby holds the
/// whole aggregate.
#[derive(Debug)]
pub struct Lobby {
    pub id: LobbyId,
    pub name: String,
    pub status: LobbyStatus,
    pub language: Language,
    pub mode: GameMode,
    pub creator: PlayerId,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub(crate) settings: LobbySettings,
    pub(crate) players: Roster,
    pub(crate) deck: Option<Deck>,
    pub(crate) game: Option<Game>,
    pub(crate) stats: StatsBook,
    pub(crate) events: EventLog,
}

impl Lobby {
    pub fn new(
        name: impl Into<String>,
        language: Language,
        mode: GameMode,
        mut creator: Player,
        deck: Deck,
        settings: LobbySettings,
    ) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let creator_id = creator.id;
        creator.set_status(PlayerStatus::Joined);

        let mut players = Roster::new();
        players.push(creator);
        let mut stats = StatsBook::new(id);
        stats.ensure(creator_id);
        let mut events = EventLog::new();
        events.record(LobbyEvent::LobbyCreated {
            lobby_id: id,
            creator: creator_id,
        });

        let lobby = Self {
            id,
            name: name.into(),
            status: LobbyStatus::Waiting,
            language,
            mode,
            creator: creator_id,
            created_at: now,
            last_activity: now,
            settings,
            players,
            deck: Some(deck),
            game: None,
            stats,
            events,
        };
        info!(
            "Created lobby '{}' ({}) with {} cards",
            lobby.name,
            lobby.id,
            lobby.deck_size()
        );
        lobby
    }

    pub fn players(&self) -> &Roster {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn player_by_user(&self, user_id: UserId) -> Option<&Player> {
        self.players.by_user(user_id)
    }

    pub fn deck(&self) -> Option<&Deck> {
        self.deck.as_ref()
    }

    pub fn deck_size(&self) -> usize {
        self.deck.as_ref().map(Deck::len).unwrap_or(0)
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn stats(&self) -> &StatsBook {
        &self.stats
    }

    pub fn phase(&self) -> Option<RoundPhase> {
        self.game.as_ref().map(|g| g.phase)
    }

    pub fn is_creator(&self, player_id: PlayerId) -> bool {
        self.creator == player_id
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    pub fn take_events(&mut self) -> Vec<LobbyEvent> {
        self.events.drain()
    }

    pub fn mystery_word(&self) -> String {
        RoundEngine::get_mystery_word(self)
    }

    pub fn left_cards(&self) -> u32 {
        self.game.as_ref().map(|g| g.left_cards).unwrap_or(0)
    }

    /// User identities seated in this lobby.
    pub fn user_ids(&self) -> Vec<UserId> {
        self.players.iter().filter_map(|p| p.user_id).collect()
    }

    /// Bots that still owe a clue this round.
    pub fn writing_bots(&self) -> Vec<(PlayerId, PlayerType)> {
        self.players
            .iter()
            .filter(|p| !p.is_human() && p.status == PlayerStatus::WritingClues)
            .map(|p| (p.id, p.player_type))
            .collect()
    }

    pub(crate) fn ensure_running(&self) -> LobbyResult<()> {
        if self.status != LobbyStatus::Running {
            return Err(LobbyError::validation(format!(
                "lobby is {:?}, not running",
                self.status
            )));
        }
        Ok(())
    }

    pub(crate) fn game_mut(&mut self) -> LobbyResult<&mut Game> {
        self.game
            .as_mut()
            .ok_or_else(|| LobbyError::validation("game has not started"))
    }

    pub fn add_player(&mut self, player: Player) -> LobbyResult<PlayerId> {
        if self.status != LobbyStatus::Waiting {
            return Err(LobbyError::validation("lobby has already started"));
        }
        if self.players.len() >= self.settings.max_players {
            return Err(LobbyError::validation(format!(
                "lobby is full ({} players)",
                self.settings.max_players
            )));
        }
        if let Some(user_id) = player.user_id {
            if self.players.by_user(user_id).is_some() {
                return Err(LobbyError::conflict("user already plays in this lobby"));
            }
        }
        if !player.is_human() && !self.mode.allows_bots() {
            return Err(LobbyError::validation("this lobby does not allow bots"));
        }

        let player_id = player.id;
        info!(
            "Player {} ({}) joined lobby {}",
            player.display_name, player_id, self.id
        );
        self.players.push(player);
        self.stats.ensure(player_id);
        self.events.record(LobbyEvent::PlayerJoined {
            lobby_id: self.id,
            player_id,
        });
        Ok(player_id)
    }

    pub fn add_bot(&mut self, requester: PlayerId, player_type: PlayerType) -> LobbyResult<PlayerId> {
        if !self.is_creator(requester) {
            return Err(LobbyError::unauthorized("only the creator can add bots"));
        }
        let bot = Player::bot(player_type)?;
        self.add_player(bot)
    }

    /// Flip a human between JOINED and READY. Returns the new readiness.
    pub fn toggle_ready(&mut self, player_id: PlayerId) -> LobbyResult<bool> {
        if self.status != LobbyStatus::Waiting {
            return Err(LobbyError::validation("lobby has already started"));
        }
        let lobby_id = self.id;
        let player = self
            .players
            .get_mut(player_id)
            .ok_or_else(|| LobbyError::unauthorized("player is not a member of this lobby"))?;

        let ready = match player.status {
            PlayerStatus::Ready => {
                player.set_status(PlayerStatus::Joined);
                false
            }
            _ => {
                player.set_status(PlayerStatus::Ready);
                true
            }
        };
        self.events.record(LobbyEvent::PlayerReady {
            lobby_id,
            player_id,
            ready,
        });
        Ok(ready)
    }

    /// Creator-only transition from WAITING to RUNNING.
    pub fn start(&mut self, requester: PlayerId) -> LobbyResult<()> {
        if !self.is_creator(requester) {
            return Err(LobbyError::unauthorized("only the creator can start the game"));
        }
        if self.status != LobbyStatus::Waiting {
            return Err(LobbyError::validation("lobby is not waiting for players"));
        }
        if self.players.len() < self.settings.min_players {
            return Err(LobbyError::validation(format!(
                "need at least {} players to start, have {}",
                self.settings.min_players,
                self.players.len()
            )));
        }
        if self
            .players
            .iter()
            .any(|p| p.is_human() && p.status != PlayerStatus::Ready)
        {
            return Err(LobbyError::validation("not all players are ready"));
        }
        let deck = self
            .deck
            .as_ref()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| LobbyError::validation("lobby has no cards to play"))?;
        let guesser = self
            .players
            .first_human()
            .map(|p| p.id)
            .ok_or_else(|| LobbyError::validation("a human player is needed to guess"))?;

        let game = RoundEngine::create_new_game(deck);
        let cards = game.left_cards;
        self.game = Some(game);

        for player in self.players.iter_mut() {
            if player.id == guesser {
                player.set_role(Role::Guesser);
                player.set_status(PlayerStatus::WaitingForClues);
            } else {
                player.set_role(Role::ClueCreator);
                player.set_status(PlayerStatus::Playing);
            }
            player.clue = None;
        }

        self.status = LobbyStatus::Running;
        info!("Lobby {} started with {} cards", self.id, cards);
        self.events.record(LobbyEvent::GameStarted {
            lobby_id: self.id,
            cards,
        });
        self.events.record(LobbyEvent::StatusChanged {
            lobby_id: self.id,
            status: LobbyStatus::Running,
        });
        self.events.record(LobbyEvent::GuesserChanged {
            lobby_id: self.id,
            guesser,
        });
        Ok(())
    }

    /// The guesser picks word `number` (1 based) of the active card.
    pub fn choose_word(&mut self, player_id: PlayerId, number: usize) -> LobbyResult<()> {
        self.ensure_running()?;
        if !self.players.member(player_id)?.is_guesser() {
            return Err(LobbyError::unauthorized("only the guesser chooses the word"));
        }
        if self.phase() != Some(RoundPhase::ChoosingWord) {
            return Err(LobbyError::validation("a word is already in play"));
        }
        if number == 0 {
            return Err(LobbyError::validation("word numbers start at 1"));
        }

        let clue_time = self.settings.clue_time;
        let deck = self
            .deck
            .as_mut()
            .ok_or_else(|| LobbyError::invariant("running lobby has no deck"))?;
        deck.choose_word(number - 1, Utc::now(), clue_time)?;

        let game = self.game_mut()?;
        game.phase = RoundPhase::WritingClues;
        let round = game.round;

        for player in self.players.iter_mut() {
            if player.is_clue_creator() {
                player.set_status(PlayerStatus::WritingClues);
            }
        }
        debug!("Lobby {} round {} word chosen", self.id, round);
        self.events.record(LobbyEvent::WordChosen {
            lobby_id: self.id,
            round,
        });
        self.refresh_phase();
        Ok(())
    }

    pub fn submit_clue(&mut self, author: PlayerId, hint: &str) -> LobbyResult<ClueId> {
        ClueLedger::submit(self, author, hint)
    }

    pub fn skip_clue(&mut self, player_id: PlayerId) -> LobbyResult<()> {
        ClueLedger::skip(self, player_id)
    }

    pub fn flag_clue(&mut self, flagger: PlayerId, clue_id: ClueId) -> LobbyResult<FlagOutcome> {
        ClueLedger::flag(self, clue_id, flagger)
    }

    pub fn clues_for_review(&self, requester: PlayerId) -> LobbyResult<Vec<ClueView>> {
        ClueLedger::clues_for_review(self, requester)
    }

    pub fn finish_comparing(&mut self, player_id: PlayerId) -> LobbyResult<()> {
        ClueLedger::finish_comparing(self, player_id)
    }

    pub fn clues_for_guessing(&self, requester: PlayerId) -> LobbyResult<Vec<ClueView>> {
        ClueLedger::clues_for_guessing(self, requester)
    }

    /// Resolve the active card with the guesser's answer and move on.
    pub fn guess(
        &mut self,
        player_id: PlayerId,
        guess: &str,
        elapsed_ms: u64,
    ) -> LobbyResult<GuessOutcome> {
        self.ensure_running()?;
        if !self.players.member(player_id)?.is_guesser() {
            return Err(LobbyError::unauthorized("only the guesser may guess"));
        }
        if self.phase() != Some(RoundPhase::Guessing) {
            return Err(LobbyError::validation("comparing not finished"));
        }

        let outcome = RoundEngine::compare_guess(self, guess, player_id, elapsed_ms)?;
        let more_cards = self
            .deck
            .as_mut()
            .map(|deck| deck.finish_active_card(outcome.success))
            .unwrap_or(false);

        self.events.record(LobbyEvent::GuessResolved {
            lobby_id: self.id,
            guess: outcome.guess.clone(),
            success: outcome.success,
            left_cards: outcome.left_cards,
        });

        if outcome.left_cards == 0 || !more_cards {
            self.finish_game();
        } else {
            self.game_mut()?.begin_next_round();
            for player in self.players.iter_mut() {
                player.clue = None;
                if player.is_guesser() {
                    player.set_status(PlayerStatus::WaitingForClues);
                } else {
                    player.set_status(PlayerStatus::Playing);
                }
            }
        }
        Ok(outcome)
    }

    fn finish_game(&mut self) {
        if let Some(game) = self.game.as_mut() {
            game.phase = RoundPhase::Finished;
        }
        for player in self.players.iter_mut() {
            player.set_status(PlayerStatus::Finished);
        }
        self.status = LobbyStatus::Finished;
        info!("Lobby {} finished", self.id);
        self.events.record(LobbyEvent::StatusChanged {
            lobby_id: self.id,
            status: LobbyStatus::Finished,
        });
    }

    /// Move the round forward once everyone it waits on is done.
    pub(crate) fn refresh_phase(&mut self) {
        if self.phase() == Some(RoundPhase::WritingClues) && self.all_annotated() {
            if let Some(game) = self.game.as_mut() {
                game.phase = RoundPhase::ReviewingClues;
            }
            for player in self.players.iter_mut().filter(|p| p.is_guesser()) {
                player.set_status(PlayerStatus::WaitingForGuess);
            }
            self.events
                .record(LobbyEvent::ReviewStarted { lobby_id: self.id });
        }

        if self.phase() == Some(RoundPhase::ReviewingClues) && self.comparing_finished() {
            if let Some(game) = self.game.as_mut() {
                game.phase = RoundPhase::Guessing;
            }
            self.events
                .record(LobbyEvent::GuessingStarted { lobby_id: self.id });
        }
    }

    /// No clue creator is still writing.
    pub fn all_annotated(&self) -> bool {
        self.players
            .clue_creators()
            .all(|p| p.status != PlayerStatus::WritingClues)
    }

    /// Every human clue creator has signalled the end of comparing.
    pub fn comparing_finished(&self) -> bool {
        let Some(game) = self.game.as_ref() else {
            return false;
        };
        let participants: Vec<PlayerId> = self
            .players
            .clue_creators()
            .filter(|p| p.is_human())
            .map(|p| p.id)
            .collect();
        let finished = participants
            .iter()
            .filter(|id| game.finished_comparing.contains(id))
            .count();
        finished == participants.len()
    }

    pub fn remove_player(&mut self, player_id: PlayerId) -> LobbyResult<RemovalOutcome> {
        let clue_id = self
            .players
            .get(player_id)
            .ok_or_else(|| LobbyError::not_found(format!("player {} is not in this lobby", player_id)))?
            .clue;

        let mut detached_clue = None;
        if let Some(game) = self.game.as_mut() {
            if let Some(clue_id) = clue_id {
                detached_clue = game.detach_clue(clue_id);
            }
            game.finished_comparing.remove(&player_id);
        }

        let mut player = self
            .players
            .remove(player_id)
            .ok_or_else(|| LobbyError::invariant("player vanished during removal"))?;
        player.clue = None;
        player.set_status(PlayerStatus::Left);
        info!(
            "Player {} ({}) left lobby {}",
            player.display_name, player_id, self.id
        );
        self.events.record(LobbyEvent::PlayerLeft {
            lobby_id: self.id,
            player_id,
        });

        let mut outcome = RemovalOutcome {
            player,
            detached_clue,
            new_creator: None,
            new_guesser: None,
            finished: false,
        };

        if self.players.first_human().is_none() {
            self.game = None;
            if !self.status.is_terminal() {
                self.status = LobbyStatus::Finished;
                info!("Lobby {} has no human players left, finishing", self.id);
                self.events.record(LobbyEvent::StatusChanged {
                    lobby_id: self.id,
                    status: LobbyStatus::Finished,
                });
            }
            outcome.finished = true;
            return Ok(outcome);
        }

        if self.creator == player_id {
            if let Some(successor) = self.players.first_human().map(|p| p.id) {
                self.creator = successor;
                outcome.new_creator = Some(successor);
                info!("Player {} is now creator of lobby {}", successor, self.id);
                self.events.record(LobbyEvent::CreatorChanged {
                    lobby_id: self.id,
                    creator: successor,
                });
            }
        }

        if outcome.player.is_guesser() && self.status == LobbyStatus::Running {
            outcome.new_guesser = self.reassign_guesser();
        }

        self.refresh_phase();
        Ok(outcome)
    }

    /// Hand the GUESSER role to the first remaining human.
    fn reassign_guesser(&mut self) -> Option<PlayerId> {
        let successor = self.players.first_human()?.id;
        let phase = self.phase();
        let waiting_status = match phase {
            Some(RoundPhase::ReviewingClues) | Some(RoundPhase::Guessing) => {
                PlayerStatus::WaitingForGuess
            }
            _ => PlayerStatus::WaitingForClues,
        };

        let own_clue = self.players.get_mut(successor).and_then(|player| {
            player.set_role(Role::Guesser);
            player.set_status(waiting_status);
            player.clue.take()
        });
        if let Some(game) = self.game.as_mut() {
            if let Some(clue_id) = own_clue {
                game.detach_clue(clue_id);
            }
            game.finished_comparing.remove(&successor);
        }

        info!("Player {} is now guesser in lobby {}", successor, self.id);
        self.events.record(LobbyEvent::GuesserChanged {
            lobby_id: self.id,
            guesser: successor,
        });
        Some(successor)
    }

    /// Creator-only removal of another player. Refusals are soft.
    pub fn kick_player(&mut self, requester: PlayerId, target: PlayerId) -> Option<RemovalOutcome> {
        if !self.is_creator(requester) || requester == target || !self.players.contains(target) {
            debug!(
                "Refused kick of {} by {} in lobby {}",
                target, requester, self.id
            );
            return None;
        }
        let outcome = self.remove_player(target).ok()?;
        self.events.record(LobbyEvent::PlayerKicked {
            lobby_id: self.id,
            player_id: target,
        });
        Some(outcome)
    }

    pub fn authorize_termination(&self, requester: PlayerId) -> LobbyResult<()> {
        if !self.is_creator(requester) {
            return Err(LobbyError::unauthorized("only the creator can terminate the lobby"));
        }
        Ok(())
    }

    /// Drop game and statistics and hand back the cards for release.
    pub fn terminate(&mut self) -> Vec<Card> {
        self.game = None;
        self.stats.clear();
        self.status = LobbyStatus::Finished;
        self.events
            .record(LobbyEvent::LobbyTerminated { lobby_id: self.id });
        self.release_deck()
    }

    pub fn release_deck(&mut self) -> Vec<Card> {
        self.deck.take().map(Deck::into_cards).unwrap_or_default()
    }

    /// Close a lobby nobody plays in any more and hand back its cards.
    /// Joins and round actions are refused from here on.
    pub fn retire(&mut self) -> Vec<Card> {
        self.status = LobbyStatus::Finished;
        self.release_deck()
    }

    pub fn to_view(&self) -> LobbyView {
        LobbyView {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            language: self.language,
            mode: self.mode,
            creator: self.creator,
            players: self.players.iter().map(|p| p.to_view(self.creator)).collect(),
            deck_size: self.deck_size() as u32,
            created_at: self.created_at.to_rfc3339(),
        }
    }

    /// Unredacted game state, for persistence.
    pub fn game_snapshot(&self) -> Option<GameView> {
        let game = self.game.as_ref()?;
        let active_card = self.deck.as_ref().and_then(Deck::active_card);
        let word = self.deck.as_ref().and_then(Deck::word_in_use);
        Some(GameView {
            lobby_id: self.id,
            round: game.round,
            phase: game.phase,
            active_guess: game.active_guess.clone(),
            last_success: game.last_success,
            won_cards: game.won_cards,
            lost_cards: game.lost_cards,
            left_cards: game.left_cards,
            words_on_card: active_card.map(|c| c.words.len() as u32).unwrap_or(0),
            mystery_word: word.map(|w| w.text.clone()),
            clue_deadline: word.and_then(|w| w.clue_deadline).map(|d| d.to_rfc3339()),
            clues: game.clue_views(),
        })
    }

    /// Game state as `viewer` may see it.
    pub fn game_view(&self, viewer: PlayerId) -> LobbyResult<GameView> {
        let player = self.players.member(viewer)?;
        let view = self
            .game_snapshot()
            .ok_or_else(|| LobbyError::validation("game has not started"))?;

        Ok(if player.is_guesser() {
            view.for_guesser()
        } else {
            view
        })
    }

    /// Persistent totals of every seated human, for the identity store.
    pub fn user_totals(&self) -> Vec<(UserId, i64, i64)> {
        self.players
            .iter()
            .filter_map(|p| {
                p.user_id
                    .map(|user_id| (user_id, p.total_score, p.total_correct_guesses))
            })
            .collect()
    }

    pub fn stats_for(&self, player_id: PlayerId) -> Option<&GameStats> {
        self.stats.get(player_id)
    }

    pub fn stats_views(&self) -> Vec<GameStatsView> {
        self.stats.iter().map(GameStats::to_view).collect()
    }
}
