use std::collections::HashMap;

use async_trait::async_trait;
use hintword_types::{GameStatsView, GameView, LobbyId, LobbyView, PlayerId, User, UserId};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// What gets written after every accepted lobby action.
#[derive(Debug, Clone)]
pub struct LobbySnapshot {
    pub lobby: LobbyView,
    pub game: Option<GameView>,
}

/// Persistence collaborator. Writes are visible to the next call on the same
/// store, nothing stronger.
#[async_trait]
pub trait LobbyStore: Send + Sync {
    async fn save_lobby(&self, snapshot: LobbySnapshot) -> Result<(), StoreError>;
    async fn find_lobby(&self, lobby_id: LobbyId) -> Result<Option<LobbySnapshot>, StoreError>;
    async fn find_lobby_by_name(&self, name: &str) -> Result<Option<LobbySnapshot>, StoreError>;
    async fn delete_lobby(&self, lobby_id: LobbyId) -> Result<(), StoreError>;

    async fn save_all_stats(&self, stats: Vec<GameStatsView>) -> Result<(), StoreError>;
    async fn find_stats(
        &self,
        player_id: PlayerId,
        lobby_id: LobbyId,
    ) -> Result<Option<GameStatsView>, StoreError>;
    async fn find_all_stats_by_lobby(
        &self,
        lobby_id: LobbyId,
    ) -> Result<Vec<GameStatsView>, StoreError>;
    async fn find_all_stats_by_player(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<GameStatsView>, StoreError>;
    async fn delete_all_stats(&self, lobby_id: LobbyId) -> Result<(), StoreError>;

    async fn save_user(&self, user: User) -> Result<(), StoreError>;
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    lobbies: RwLock<HashMap<LobbyId, LobbySnapshot>>,
    stats: RwLock<HashMap<(PlayerId, LobbyId), GameStatsView>>,
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LobbyStore for MemoryStore {
    async fn save_lobby(&self, snapshot: LobbySnapshot) -> Result<(), StoreError> {
        self.lobbies
            .write()
            .await
            .insert(snapshot.lobby.id, snapshot);
        Ok(())
    }

    async fn find_lobby(&self, lobby_id: LobbyId) -> Result<Option<LobbySnapshot>, StoreError> {
        Ok(self.lobbies.read().await.get(&lobby_id).cloned())
    }

    async fn find_lobby_by_name(&self, name: &str) -> Result<Option<LobbySnapshot>, StoreError> {
        Ok(self
            .lobbies
            .read()
            .await
            .values()
            .find(|s| s.lobby.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn delete_lobby(&self, lobby_id: LobbyId) -> Result<(), StoreError> {
        self.lobbies
            .write()
            .await
            .remove(&lobby_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("lobby {}", lobby_id)))
    }

    async fn save_all_stats(&self, stats: Vec<GameStatsView>) -> Result<(), StoreError> {
        let mut rows = self.stats.write().await;
        for row in stats {
            rows.insert((row.player_id, row.lobby_id), row);
        }
        Ok(())
    }

    async fn find_stats(
        &self,
        player_id: PlayerId,
        lobby_id: LobbyId,
    ) -> Result<Option<GameStatsView>, StoreError> {
        Ok(self.stats.read().await.get(&(player_id, lobby_id)).cloned())
    }

    async fn find_all_stats_by_lobby(
        &self,
        lobby_id: LobbyId,
    ) -> Result<Vec<GameStatsView>, StoreError> {
        Ok(self
            .stats
            .read()
            .await
            .values()
            .filter(|row| row.lobby_id == lobby_id)
            .cloned()
            .collect())
    }

    async fn find_all_stats_by_player(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<GameStatsView>, StoreError> {
        Ok(self
            .stats
            .read()
            .await
            .values()
            .filter(|row| row.player_id == player_id)
            .cloned()
            .collect())
    }

    async fn delete_all_stats(&self, lobby_id: LobbyId) -> Result<(), StoreError> {
        self.stats
            .write()
            .await
            .retain(|(_, lobby), _| *lobby != lobby_id);
        Ok(())
    }

    async fn save_user(&self, user: User) -> Result<(), StoreError> {
        self.users.write().await.insert(user.id, user);
        Ok(())
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }
}
