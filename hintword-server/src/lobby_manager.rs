use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use hintword_core::{
    Card, CardCatalog, Deck, FlagOutcome, GuessOutcome, Lobby, LobbyCleanup, LobbySettings,
    Player, RemovalOutcome,
};
use hintword_types::{
    ClueId, ClueView, ErrorKind, GameMode, GameStatsView, GameView, Language, LobbyError,
    LobbyEvent, LobbyId, LobbyResult, LobbyStatus, LobbyView, PlayerId, PlayerType, PlayerView,
    Role, RoundPhase, User, UserId,
};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::identity::IdentityProvider;
use crate::store::{LobbySnapshot, LobbyStore};
use crate::suggestions::{SuggestionSource, SuggestionStrategy};

/// One hosted lobby. `writes` is taken before the lobby lock is released,
/// so store writes land in the order the lobby accepted the actions.
/// `closed` is set under the lobby lock when the lobby is terminated or
/// reclaimed; later actions and late writes are dropped.
struct LobbySlot {
    lobby: Mutex<Lobby>,
    writes: Mutex<()>,
    closed: AtomicBool,
}

impl LobbySlot {
    fn new(lobby: Lobby) -> Self {
        Self {
            lobby: Mutex::new(lobby),
            writes: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn ensure_open(&self, lobby_id: LobbyId) -> LobbyResult<()> {
        if self.is_closed() {
            return Err(LobbyError::not_found(format!("lobby {}", lobby_id)));
        }
        Ok(())
    }
}

type LobbyHandle = Arc<LobbySlot>;

/// Store writes owed after an accepted action.
struct Commit {
    lobby_id: LobbyId,
    snapshot: LobbySnapshot,
    stats: Vec<GameStatsView>,
    settlement: Option<Settlement>,
}

/// Work owed once a lobby reaches FINISHED.
struct Settlement {
    name_key: String,
    totals: Vec<(UserId, i64, i64)>,
}

/// Bot clue work read under the lock and carried out after it is released.
struct BotJob {
    round: u32,
    language: Language,
    word: String,
    bots: Vec<(PlayerId, PlayerType)>,
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn member_id(lobby: &Lobby, user_id: UserId) -> LobbyResult<PlayerId> {
    lobby
        .player_by_user(user_id)
        .map(|p| p.id)
        .ok_or_else(|| LobbyError::unauthorized("not a member of this lobby"))
}

fn player_view(lobby: &Lobby, player_id: PlayerId) -> LobbyResult<PlayerView> {
    lobby
        .player(player_id)
        .map(|p| p.to_view(lobby.creator))
        .ok_or_else(|| LobbyError::invariant(format!("player {} vanished after joining", player_id)))
}

fn log_rejection(lobby_id: LobbyId, err: &LobbyError) {
    if err.is_recoverable() {
        debug!("Lobby {} rejected action: {}", lobby_id, err);
    } else {
        error!("Lobby {} invariant violated: {}", lobby_id, err);
    }
}

/// Hosts every lobby. Each lobby sits behind its own mutex, so actions on one
/// lobby are serialized while different lobbies proceed in parallel.
pub struct LobbyManager {
    lobbies: DashMap<LobbyId, LobbyHandle>,
    memberships: DashMap<UserId, LobbyId>,
    names: DashMap<String, LobbyId>,
    catalog: Mutex<CardCatalog>,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn LobbyStore>,
    suggestions: Arc<dyn SuggestionSource>,
    suggestion_timeout: Duration,
    settings: LobbySettings,
    cards_per_lobby: usize,
    cleanup: LobbyCleanup,
    events: broadcast::Sender<LobbyEvent>,
}

impl LobbyManager {
    pub fn new(
        config: &Config,
        catalog: CardCatalog,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn LobbyStore>,
        suggestions: Arc<dyn SuggestionSource>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            lobbies: DashMap::new(),
            memberships: DashMap::new(),
            names: DashMap::new(),
            catalog: Mutex::new(catalog),
            identity,
            store,
            suggestions,
            suggestion_timeout: config.suggestion_timeout(),
            settings: config.lobby_settings(),
            cards_per_lobby: config.cards_per_lobby,
            cleanup: config.cleanup_policy(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LobbyEvent> {
        self.events.subscribe()
    }

    pub fn active_lobbies(&self) -> usize {
        self.lobbies.len()
    }

    pub async fn available_cards(&self, language: Language) -> usize {
        self.catalog.lock().await.available(language)
    }

    async fn authenticate(&self, token: &str) -> LobbyResult<User> {
        self.identity
            .resolve(token)
            .await
            .ok_or_else(|| LobbyError::unauthorized("unknown session token"))
    }

    fn handle(&self, lobby_id: LobbyId) -> LobbyResult<LobbyHandle> {
        self.lobbies
            .get(&lobby_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LobbyError::not_found(format!("lobby {}", lobby_id)))
    }

    /// One active membership per identity.
    fn register(&self, user_id: UserId, lobby_id: LobbyId) -> LobbyResult<()> {
        match self.memberships.entry(user_id) {
            Entry::Occupied(existing) => Err(LobbyError::conflict(format!(
                "user already plays in lobby {}",
                existing.get()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(lobby_id);
                Ok(())
            }
        }
    }

    fn release_membership(&self, user_id: UserId, lobby_id: LobbyId) {
        self.memberships
            .remove_if(&user_id, |_, current| *current == lobby_id);
    }

    fn reserve(&self, user_id: UserId, name: &str, lobby_id: LobbyId) -> LobbyResult<()> {
        self.register(user_id, lobby_id)?;
        match self.names.entry(name_key(name)) {
            Entry::Occupied(_) => {
                self.release_membership(user_id, lobby_id);
                Err(LobbyError::conflict(format!("lobby name '{}' is taken", name)))
            }
            Entry::Vacant(slot) => {
                slot.insert(lobby_id);
                Ok(())
            }
        }
    }

    async fn draw_deck(&self, language: Language) -> LobbyResult<Vec<Card>> {
        let mut catalog = self.catalog.lock().await;
        let mut rng = rand::rng();
        match catalog.draw_cards(language, self.cards_per_lobby, &mut rng) {
            Ok(cards) => Ok(cards),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let cards = catalog.draw_available(language, self.cards_per_lobby, &mut rng);
                if cards.is_empty() {
                    return Err(err);
                }
                warn!(
                    "Only {} of {} cards left for {}, using a partial deck",
                    cards.len(),
                    self.cards_per_lobby,
                    language
                );
                Ok(cards)
            }
            Err(err) => Err(err),
        }
    }

    fn commit(lobby: &Lobby, was_finished: bool) -> Commit {
        let settlement = (!was_finished && lobby.status == LobbyStatus::Finished).then(|| {
            Settlement {
                name_key: name_key(&lobby.name),
                totals: lobby.user_totals(),
            }
        });
        Commit {
            lobby_id: lobby.id,
            snapshot: LobbySnapshot {
                lobby: lobby.to_view(),
                game: lobby.game_snapshot(),
            },
            stats: lobby.stats_views(),
            settlement,
        }
    }

    /// Sent while the lobby lock is held, so subscribers see one lobby's
    /// events in the order its actions were accepted.
    fn broadcast(&self, events: Vec<LobbyEvent>) {
        for event in events {
            // Nobody listening is fine
            let _ = self.events.send(event);
        }
    }

    /// Persist a commit. Callers hold the slot's write lock.
    async fn persist(&self, slot: &LobbySlot, commit: Commit) {
        if slot.is_closed() {
            debug!("Lobby {} is closed, dropping its snapshot", commit.lobby_id);
        } else {
            if let Err(e) = self.store.save_lobby(commit.snapshot).await {
                warn!("Failed to save lobby {}: {}", commit.lobby_id, e);
            }
            if let Err(e) = self.store.save_all_stats(commit.stats).await {
                warn!("Failed to save stats of lobby {}: {}", commit.lobby_id, e);
            }
        }
        if let Some(settlement) = commit.settlement {
            self.settle(commit.lobby_id, settlement).await;
        }
    }

    /// Free the name and memberships of a finished lobby and record totals.
    async fn settle(&self, lobby_id: LobbyId, settlement: Settlement) {
        self.names
            .remove_if(&settlement.name_key, |_, id| *id == lobby_id);
        for (user_id, total_score, total_correct_guesses) in settlement.totals {
            self.release_membership(user_id, lobby_id);
            self.save_totals(user_id, total_score, total_correct_guesses)
                .await;
        }
        info!("Lobby {} settled", lobby_id);
    }

    async fn save_totals(&self, user_id: UserId, total_score: i64, total_correct_guesses: i64) {
        if let Some(user) = self
            .identity
            .update_totals(user_id, total_score, total_correct_guesses)
            .await
        {
            if let Err(e) = self.store.save_user(user).await {
                warn!("Failed to save totals of user {}: {}", user_id, e);
            }
        }
    }

    /// Run `action` under the lobby lock, broadcast its events, then persist
    /// what it changed in acceptance order.
    async fn locked<T, F>(&self, handle: &LobbyHandle, action: F) -> LobbyResult<T>
    where
        F: FnOnce(&mut Lobby) -> LobbyResult<T> + Send,
        T: Send,
    {
        let mut guard = handle.lobby.lock().await;
        let lobby = &mut *guard;
        handle.ensure_open(lobby.id)?;
        let was_finished = lobby.status == LobbyStatus::Finished;
        let result = action(&mut *lobby);
        let value = match result {
            Ok(value) => value,
            Err(e) => {
                log_rejection(lobby.id, &e);
                return Err(e);
            }
        };

        lobby.touch(Utc::now());
        self.broadcast(lobby.take_events());
        let commit = Self::commit(lobby, was_finished);
        let writes = handle.writes.lock().await;
        drop(guard);

        self.persist(handle, commit).await;
        drop(writes);
        Ok(value)
    }

    /// Resolve the caller's player in the lobby, then run `action` as them.
    async fn act<T, F>(&self, token: &str, lobby_id: LobbyId, action: F) -> LobbyResult<T>
    where
        F: FnOnce(&mut Lobby, PlayerId) -> LobbyResult<T> + Send,
        T: Send,
    {
        let user = self.authenticate(token).await?;
        let handle = self.handle(lobby_id)?;
        self.locked(&handle, move |lobby| {
            let player_id = member_id(lobby, user.id)?;
            action(lobby, player_id)
        })
        .await
    }

    async fn read<T, F>(&self, token: &str, lobby_id: LobbyId, view: F) -> LobbyResult<T>
    where
        F: FnOnce(&Lobby, PlayerId) -> LobbyResult<T> + Send,
    {
        let user = self.authenticate(token).await?;
        let handle = self.handle(lobby_id)?;
        let lobby = handle.lobby.lock().await;
        handle.ensure_open(lobby_id)?;
        let player_id = member_id(&lobby, user.id)?;
        view(&lobby, player_id)
    }

    pub async fn create_lobby(
        &self,
        token: &str,
        name: &str,
        language: Language,
        mode: GameMode,
    ) -> LobbyResult<LobbyView> {
        let user = self.authenticate(token).await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(LobbyError::validation("lobby name must not be empty"));
        }
        if let Some(existing) = self.memberships.get(&user.id).map(|e| *e.value()) {
            return Err(LobbyError::conflict(format!(
                "user already plays in lobby {}",
                existing
            )));
        }
        if self.names.contains_key(&name_key(name)) {
            return Err(LobbyError::conflict(format!("lobby name '{}' is taken", name)));
        }

        let cards = self.draw_deck(language).await?;
        let mut lobby = Lobby::new(
            name,
            language,
            mode,
            Player::human(&user, Role::ClueCreator),
            Deck::new(cards),
            self.settings.clone(),
        );
        let lobby_id = lobby.id;

        if let Err(e) = self.reserve(user.id, name, lobby_id) {
            let cards = lobby.release_deck();
            self.catalog.lock().await.release(cards);
            return Err(e);
        }

        self.broadcast(lobby.take_events());
        let commit = Self::commit(&lobby, false);
        let view = lobby.to_view();
        let handle = Arc::new(LobbySlot::new(lobby));
        let writes = handle.writes.lock().await;
        self.lobbies.insert(lobby_id, Arc::clone(&handle));
        self.persist(&handle, commit).await;
        drop(writes);
        Ok(view)
    }

    pub async fn join_lobby(&self, token: &str, lobby_id: LobbyId) -> LobbyResult<PlayerView> {
        let user = self.authenticate(token).await?;
        let handle = self.handle(lobby_id)?;
        self.register(user.id, lobby_id)?;

        let joined = self
            .locked(&handle, |lobby| {
                let player_id = lobby.add_player(Player::human(&user, Role::ClueCreator))?;
                player_view(lobby, player_id)
            })
            .await;
        if joined.is_err() {
            self.release_membership(user.id, lobby_id);
        }
        joined
    }

    pub async fn leave_lobby(&self, token: &str, lobby_id: LobbyId) -> LobbyResult<()> {
        let outcome = self
            .act(token, lobby_id, |lobby, player_id| lobby.remove_player(player_id))
            .await?;
        self.after_removal(lobby_id, outcome).await;
        Ok(())
    }

    /// Soft refusal: `Ok(false)` when the caller may not kick `target`.
    pub async fn kick_player(
        &self,
        token: &str,
        lobby_id: LobbyId,
        target: PlayerId,
    ) -> LobbyResult<bool> {
        let outcome = self
            .act(token, lobby_id, |lobby, player_id| {
                Ok(lobby.kick_player(player_id, target))
            })
            .await?;
        match outcome {
            Some(outcome) => {
                self.after_removal(lobby_id, outcome).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn after_removal(&self, lobby_id: LobbyId, outcome: RemovalOutcome) {
        let player = &outcome.player;
        if let Some(user_id) = player.user_id {
            self.release_membership(user_id, lobby_id);
            self.save_totals(user_id, player.total_score, player.total_correct_guesses)
                .await;
        }
        if outcome.finished {
            self.reclaim(lobby_id).await;
        }
    }

    /// Creator-only. Deletes the lobby, its game and all of its stats.
    pub async fn terminate_lobby(&self, token: &str, lobby_id: LobbyId) -> LobbyResult<()> {
        let user = self.authenticate(token).await?;
        let handle = self.handle(lobby_id)?;

        let mut lobby = handle.lobby.lock().await;
        handle.ensure_open(lobby_id)?;
        let player_id = member_id(&lobby, user.id)?;
        lobby.authorize_termination(player_id)?;
        let users = lobby.user_ids();
        let cards = lobby.terminate();
        let key = name_key(&lobby.name);
        handle.close();
        self.broadcast(lobby.take_events());
        let writes = handle.writes.lock().await;
        drop(lobby);

        self.lobbies.remove(&lobby_id);
        for user_id in users {
            self.release_membership(user_id, lobby_id);
        }
        self.names.remove_if(&key, |_, id| *id == lobby_id);
        self.catalog.lock().await.release(cards);

        if let Err(e) = self.store.delete_lobby(lobby_id).await {
            warn!("Failed to delete lobby {}: {}", lobby_id, e);
        }
        if let Err(e) = self.store.delete_all_stats(lobby_id).await {
            warn!("Failed to delete stats of lobby {}: {}", lobby_id, e);
        }
        drop(writes);
        info!("Lobby {} terminated by {}", lobby_id, user.id);
        Ok(())
    }

    pub async fn toggle_ready(&self, token: &str, lobby_id: LobbyId) -> LobbyResult<bool> {
        self.act(token, lobby_id, |lobby, player_id| lobby.toggle_ready(player_id))
            .await
    }

    pub async fn add_bot(
        &self,
        token: &str,
        lobby_id: LobbyId,
        player_type: PlayerType,
    ) -> LobbyResult<PlayerView> {
        self.act(token, lobby_id, |lobby, player_id| {
            let bot_id = lobby.add_bot(player_id, player_type)?;
            player_view(lobby, bot_id)
        })
        .await
    }

    pub async fn start_game(&self, token: &str, lobby_id: LobbyId) -> LobbyResult<()> {
        self.act(token, lobby_id, |lobby, player_id| lobby.start(player_id))
            .await
    }

    /// The guesser picks a word. Bots write their clues afterwards, outside
    /// the lobby lock.
    pub async fn choose_word(
        &self,
        token: &str,
        lobby_id: LobbyId,
        number: usize,
    ) -> LobbyResult<()> {
        let job = self
            .act(token, lobby_id, |lobby, player_id| {
                lobby.choose_word(player_id, number)?;
                Ok(BotJob {
                    round: lobby.game().map(|g| g.round).unwrap_or_default(),
                    language: lobby.language,
                    word: lobby.mystery_word(),
                    bots: lobby.writing_bots(),
                })
            })
            .await?;
        self.write_bot_clues(lobby_id, job).await;
        Ok(())
    }

    async fn write_bot_clues(&self, lobby_id: LobbyId, job: BotJob) {
        if job.bots.is_empty() {
            return;
        }

        // Bots ask concurrently; each answer is bounded by the suggestion timeout
        let timeout = self.suggestion_timeout;
        let bot_ids: Vec<PlayerId> = job.bots.iter().map(|(id, _)| *id).collect();
        let mut pending = JoinSet::new();
        for (bot_id, player_type) in job.bots {
            let suggestions = Arc::clone(&self.suggestions);
            let (language, word) = (job.language, job.word.clone());
            pending.spawn(async move {
                let Some(strategy) = SuggestionStrategy::for_player(player_type) else {
                    return (bot_id, None);
                };
                let answer =
                    tokio::time::timeout(timeout, suggestions.suggest(strategy, language, &word))
                        .await;
                let draft = match answer {
                    Ok(Ok(hint)) => Some(hint),
                    Ok(Err(e)) => {
                        warn!("Bot {} produced no clue in lobby {}: {}", bot_id, lobby_id, e);
                        None
                    }
                    Err(_) => {
                        warn!(
                            "Bot {} gave up after {:?} in lobby {}",
                            bot_id, timeout, lobby_id
                        );
                        None
                    }
                };
                (bot_id, draft)
            });
        }

        let mut drafts: HashMap<PlayerId, String> = HashMap::new();
        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok((bot_id, Some(hint))) => {
                    drafts.insert(bot_id, hint);
                }
                Ok((_, None)) => {}
                Err(e) => error!("Bot suggestion task failed in lobby {}: {}", lobby_id, e),
            }
        }

        let Ok(handle) = self.handle(lobby_id) else {
            return;
        };
        let round = job.round;
        let written = self
            .locked(&handle, move |lobby| {
                if lobby.game().map(|g| g.round) != Some(round)
                    || lobby.phase() != Some(RoundPhase::WritingClues)
                {
                    debug!("Round moved on before bot clues arrived in lobby {}", lobby.id);
                    return Ok(0);
                }
                let mut written = 0;
                for bot_id in bot_ids {
                    let submitted = match drafts.remove(&bot_id) {
                        Some(hint) => lobby.submit_clue(bot_id, &hint).map(|_| ()),
                        None => Err(LobbyError::validation("no suggestion")),
                    };
                    match submitted {
                        Ok(()) => written += 1,
                        Err(e) => {
                            debug!("Bot {} skips this round: {}", bot_id, e);
                            if let Err(e) = lobby.skip_clue(bot_id) {
                                debug!("Bot {} could not skip: {}", bot_id, e);
                            }
                        }
                    }
                }
                Ok(written)
            })
            .await;
        if let Ok(written) = written {
            debug!("{} bot clues written in lobby {}", written, lobby_id);
        }
    }

    pub async fn submit_clue(
        &self,
        token: &str,
        lobby_id: LobbyId,
        hint: &str,
    ) -> LobbyResult<ClueId> {
        self.act(token, lobby_id, |lobby, player_id| lobby.submit_clue(player_id, hint))
            .await
    }

    pub async fn flag_clue(
        &self,
        token: &str,
        lobby_id: LobbyId,
        clue_id: ClueId,
    ) -> LobbyResult<FlagOutcome> {
        self.act(token, lobby_id, |lobby, player_id| lobby.flag_clue(player_id, clue_id))
            .await
    }

    pub async fn clues_for_review(
        &self,
        token: &str,
        lobby_id: LobbyId,
    ) -> LobbyResult<Vec<ClueView>> {
        self.read(token, lobby_id, |lobby, player_id| lobby.clues_for_review(player_id))
            .await
    }

    pub async fn finish_comparing(&self, token: &str, lobby_id: LobbyId) -> LobbyResult<()> {
        self.act(token, lobby_id, |lobby, player_id| lobby.finish_comparing(player_id))
            .await
    }

    pub async fn clues_for_guessing(
        &self,
        token: &str,
        lobby_id: LobbyId,
    ) -> LobbyResult<Vec<ClueView>> {
        self.read(token, lobby_id, |lobby, player_id| lobby.clues_for_guessing(player_id))
            .await
    }

    pub async fn guess(
        &self,
        token: &str,
        lobby_id: LobbyId,
        guess: &str,
        elapsed_ms: u64,
    ) -> LobbyResult<GuessOutcome> {
        self.act(token, lobby_id, |lobby, player_id| {
            lobby.guess(player_id, guess, elapsed_ms)
        })
        .await
    }

    pub async fn game_view(&self, token: &str, lobby_id: LobbyId) -> LobbyResult<GameView> {
        self.read(token, lobby_id, |lobby, player_id| lobby.game_view(player_id))
            .await
    }

    pub async fn lobby_view(&self, lobby_id: LobbyId) -> LobbyResult<LobbyView> {
        let handle = self.handle(lobby_id)?;
        let lobby = handle.lobby.lock().await;
        Ok(lobby.to_view())
    }

    pub async fn list_lobbies(&self) -> Vec<LobbyView> {
        let handles: Vec<LobbyHandle> = self
            .lobbies
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut views = Vec::with_capacity(handles.len());
        for handle in handles {
            views.push(handle.lobby.lock().await.to_view());
        }
        views
    }

    pub async fn stats(&self, lobby_id: LobbyId) -> LobbyResult<Vec<GameStatsView>> {
        let handle = self.handle(lobby_id)?;
        let lobby = handle.lobby.lock().await;
        Ok(lobby.stats_views())
    }

    /// The caller's lobby and player.
    pub async fn lookup_by_token(&self, token: &str) -> LobbyResult<(LobbyId, PlayerView)> {
        let user = self.authenticate(token).await?;
        let lobby_id = self
            .memberships
            .get(&user.id)
            .map(|entry| *entry.value())
            .ok_or_else(|| LobbyError::unauthorized("no active player for this session"))?;
        let handle = self
            .handle(lobby_id)
            .map_err(|_| LobbyError::unauthorized("no active player for this session"))?;
        let lobby = handle.lobby.lock().await;
        let player_id = member_id(&lobby, user.id)?;
        Ok((lobby_id, player_view(&lobby, player_id)?))
    }

    /// Drop lobbies the cleanup policy gives up on. Returns how many went.
    pub async fn cleanup_lobbies(&self, now: DateTime<Utc>) -> usize {
        let handles: Vec<(LobbyId, LobbyHandle)> = self
            .lobbies
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut reclaimed = 0;
        for (lobby_id, handle) in handles {
            let reason = {
                let lobby = handle.lobby.lock().await;
                self.cleanup.should_reclaim(&lobby, now)
            };
            if let Some(reason) = reason {
                info!("Reclaiming lobby {} ({:?})", lobby_id, reason);
                self.reclaim(lobby_id).await;
                reclaimed += 1;
            }
        }
        if reclaimed > 0 {
            info!("Cleaned up {} lobbies, {} remain", reclaimed, self.lobbies.len());
        }
        reclaimed
    }

    async fn reclaim(&self, lobby_id: LobbyId) {
        let Some((_, handle)) = self.lobbies.remove(&lobby_id) else {
            return;
        };
        let mut lobby = handle.lobby.lock().await;
        if handle.is_closed() {
            return;
        }
        let cards = lobby.retire();
        let users = lobby.user_ids();
        let key = name_key(&lobby.name);
        handle.close();
        let writes = handle.writes.lock().await;
        drop(lobby);

        for user_id in users {
            self.release_membership(user_id, lobby_id);
        }
        self.names.remove_if(&key, |_, id| *id == lobby_id);
        let returned = cards.len();
        self.catalog.lock().await.release(cards);

        if let Err(e) = self.store.delete_lobby(lobby_id).await {
            warn!("Failed to delete lobby {}: {}", lobby_id, e);
        }
        drop(writes);
        debug!("Lobby {} reclaimed, {} cards returned", lobby_id, returned);
    }
}
