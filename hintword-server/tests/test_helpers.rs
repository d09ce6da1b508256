#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hintword_core::CardCatalog;
use hintword_server::LobbyManager;
use hintword_server::config::Config;
use hintword_server::identity::InMemoryIdentity;
use hintword_server::store::{LobbySnapshot, LobbyStore, MemoryStore, StoreError};
use hintword_server::suggestions::{SuggestionError, SuggestionSource, SuggestionStrategy};
use hintword_types::{GameMode, GameStatsView, Language, LobbyId, PlayerId, User, UserId};

pub const TEST_CARDS: &str = "\
Sun,Moon
River,Stone,Cloud
Apple,Pear
Train,Plane,Boat
Castle,Tower
";

/// Canned bot answers; `None` makes every suggestion fail.
pub struct StubSuggestions {
    pub reply: Option<String>,
}

#[async_trait]
impl SuggestionSource for StubSuggestions {
    async fn suggest(
        &self,
        _strategy: SuggestionStrategy,
        _language: Language,
        word: &str,
    ) -> Result<String, SuggestionError> {
        self.reply
            .clone()
            .ok_or_else(|| SuggestionError::NoCandidate(word.to_string()))
    }
}

/// Never answers; only a timeout gets a bot past it.
pub struct HangingSuggestions;

#[async_trait]
impl SuggestionSource for HangingSuggestions {
    async fn suggest(
        &self,
        _strategy: SuggestionStrategy,
        _language: Language,
        _word: &str,
    ) -> Result<String, SuggestionError> {
        std::future::pending().await
    }
}

/// Memory store whose lobby and stats writes take `delay`.
pub struct SlowStore {
    pub inner: Arc<MemoryStore>,
    pub delay: Duration,
}

#[async_trait]
impl LobbyStore for SlowStore {
    async fn save_lobby(&self, snapshot: LobbySnapshot) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.save_lobby(snapshot).await
    }

    async fn find_lobby(&self, lobby_id: LobbyId) -> Result<Option<LobbySnapshot>, StoreError> {
        self.inner.find_lobby(lobby_id).await
    }

    async fn find_lobby_by_name(&self, name: &str) -> Result<Option<LobbySnapshot>, StoreError> {
        self.inner.find_lobby_by_name(name).await
    }

    async fn delete_lobby(&self, lobby_id: LobbyId) -> Result<(), StoreError> {
        self.inner.delete_lobby(lobby_id).await
    }

    async fn save_all_stats(&self, stats: Vec<GameStatsView>) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.save_all_stats(stats).await
    }

    async fn find_stats(
        &self,
        player_id: PlayerId,
        lobby_id: LobbyId,
    ) -> Result<Option<GameStatsView>, StoreError> {
        self.inner.find_stats(player_id, lobby_id).await
    }

    async fn find_all_stats_by_lobby(
        &self,
        lobby_id: LobbyId,
    ) -> Result<Vec<GameStatsView>, StoreError> {
        self.inner.find_all_stats_by_lobby(lobby_id).await
    }

    async fn find_all_stats_by_player(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<GameStatsView>, StoreError> {
        self.inner.find_all_stats_by_player(player_id).await
    }

    async fn delete_all_stats(&self, lobby_id: LobbyId) -> Result<(), StoreError> {
        self.inner.delete_all_stats(lobby_id).await
    }

    async fn save_user(&self, user: User) -> Result<(), StoreError> {
        self.inner.save_user(user).await
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        self.inner.find_user(user_id).await
    }
}

pub fn create_test_config(cards_per_lobby: usize) -> Config {
    let mut config = Config::new();
    config.cards_per_lobby = cards_per_lobby;
    config.min_players_to_start = 3;
    config.max_players_per_lobby = 8;
    config.lobby_idle_minutes = 30;
    config.finished_grace_seconds = 300;
    config
}

/// Test setup that provides the manager and its in-memory collaborators
pub struct TestServer {
    pub manager: Arc<LobbyManager>,
    pub identity: Arc<InMemoryIdentity>,
    pub store: Arc<MemoryStore>,
}

impl TestServer {
    pub fn new() -> Self {
        Self::with(3, TEST_CARDS, Some("glow"))
    }

    pub fn with(cards_per_lobby: usize, card_list: &str, bot_reply: Option<&str>) -> Self {
        let suggestions = Arc::new(StubSuggestions {
            reply: bot_reply.map(str::to_string),
        });
        Self::assemble(create_test_config(cards_per_lobby), card_list, None, suggestions)
    }

    /// Every lobby and stats write sleeps for `delay` first.
    pub fn with_slow_store(delay: Duration) -> Self {
        let suggestions = Arc::new(StubSuggestions {
            reply: Some("glow".to_string()),
        });
        Self::assemble(create_test_config(3), TEST_CARDS, Some(delay), suggestions)
    }

    /// Bots ask a source that never answers and give up after `timeout_ms`.
    pub fn with_hanging_bots(timeout_ms: u64) -> Self {
        let mut config = create_test_config(3);
        config.suggestion_timeout_ms = timeout_ms;
        Self::assemble(config, TEST_CARDS, None, Arc::new(HangingSuggestions))
    }

    fn assemble(
        config: Config,
        card_list: &str,
        store_delay: Option<Duration>,
        suggestions: Arc<dyn SuggestionSource>,
    ) -> Self {
        let identity = Arc::new(InMemoryIdentity::new());
        let store = Arc::new(MemoryStore::new());
        let manager_store: Arc<dyn LobbyStore> = match store_delay {
            Some(delay) => Arc::new(SlowStore {
                inner: store.clone(),
                delay,
            }),
            None => store.clone(),
        };
        let manager = Arc::new(LobbyManager::new(
            &config,
            CardCatalog::from_card_list(Language::En, card_list),
            identity.clone(),
            manager_store,
            suggestions,
        ));
        Self {
            manager,
            identity,
            store,
        }
    }

    pub async fn user(&self, name: &str) -> (String, User) {
        self.identity.issue_token(name).await
    }

    pub async fn tokens(&self, names: &[&str]) -> Vec<String> {
        let mut tokens = Vec::new();
        for name in names {
            tokens.push(self.user(name).await.0);
        }
        tokens
    }

    /// The first name creates lobby `lobby_name`, the rest join it
    pub async fn lobby_with(
        &self,
        lobby_name: &str,
        names: &[&str],
        mode: GameMode,
    ) -> (LobbyId, Vec<String>) {
        let tokens = self.tokens(names).await;
        let view = self
            .manager
            .create_lobby(&tokens[0], lobby_name, Language::En, mode)
            .await
            .unwrap();
        for token in &tokens[1..] {
            self.manager.join_lobby(token, view.id).await.unwrap();
        }
        (view.id, tokens)
    }

    pub async fn ready_and_start(&self, lobby_id: LobbyId, tokens: &[String]) {
        for token in tokens {
            self.manager.toggle_ready(token, lobby_id).await.unwrap();
        }
        self.manager.start_game(&tokens[0], lobby_id).await.unwrap();
    }

    /// Started lobby with the first word of the first card in play. The
    /// first token is the creator and the guesser.
    pub async fn running_game(&self, names: &[&str]) -> (LobbyId, Vec<String>) {
        let (lobby_id, tokens) = self.lobby_with("L", names, GameMode::Mixed).await;
        self.ready_and_start(lobby_id, &tokens).await;
        self.manager
            .choose_word(&tokens[0], lobby_id, 1)
            .await
            .unwrap();
        (lobby_id, tokens)
    }

    /// The word in play, as a clue creator sees it.
    pub async fn mystery_word(&self, lobby_id: LobbyId, clue_creator: &str) -> String {
        self.manager
            .game_view(clue_creator, lobby_id)
            .await
            .unwrap()
            .mystery_word
            .unwrap()
    }

    /// Every clue creator in `tokens[1..]` writes a clue and finishes comparing
    pub async fn play_to_guessing(&self, lobby_id: LobbyId, tokens: &[String]) {
        for (n, token) in tokens[1..].iter().enumerate() {
            self.manager
                .submit_clue(token, lobby_id, &format!("hint{}", n))
                .await
                .unwrap();
        }
        for token in &tokens[1..] {
            self.manager
                .finish_comparing(token, lobby_id)
                .await
                .unwrap();
        }
    }
}
