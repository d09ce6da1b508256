use chrono::{DateTime, Utc};
use hintword_types::LobbyStatus;
use std::time::Duration;

use crate::Lobby;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimReason {
    Finished,
    Idle,
}

pub struct LobbyCleanup {
    pub idle_threshold: Duration,     // No accepted action for this long
    pub finished_grace: Duration,     // Keep finished lobbies around for result screens
}

impl Default for LobbyCleanup {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::from_secs(30 * 60), // 30 minutes
            finished_grace: Duration::from_secs(5 * 60),  // 5 minutes
        }
    }
}

impl LobbyCleanup {
    pub fn new(idle_threshold: Duration, finished_grace: Duration) -> Self {
        Self {
            idle_threshold,
            finished_grace,
        }
    }

    /// Decide whether a lobby should be reclaimed at `now`.
    pub fn should_reclaim(&self, lobby: &Lobby, now: DateTime<Utc>) -> Option<ReclaimReason> {
        let quiet_for = (now - lobby.last_activity).to_std().unwrap_or(Duration::ZERO);

        if lobby.status == LobbyStatus::Finished {
            if quiet_for >= self.finished_grace {
                return Some(ReclaimReason::Finished);
            }
            return None;
        }

        if quiet_for >= self.idle_threshold {
            return Some(ReclaimReason::Idle);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Card, Deck, LobbySettings, Player};
    use hintword_types::{GameMode, Language, Role, User};
    use uuid::Uuid;

    fn create_test_lobby() -> Lobby {
        let user = User {
            id: Uuid::new_v4(),
            display_name: "Test".to_string(),
            total_score: 0,
            total_correct_guesses: 0,
            created_at: Utc::now().to_rfc3339(),
        };
        let deck = Deck::new(vec![Card::from_words(Language::En, &["Sun", "Moon"])]);
        Lobby::new(
            "test",
            Language::En,
            GameMode::Humans,
            Player::human(&user, Role::ClueCreator),
            deck,
            LobbySettings::default(),
        )
    }

    #[test]
    fn test_cleanup_configuration() {
        let cleanup = LobbyCleanup::default();

        assert_eq!(cleanup.idle_threshold, Duration::from_secs(1800));
        assert_eq!(cleanup.finished_grace, Duration::from_secs(300));
    }

    #[test]
    fn test_active_lobby_is_kept() {
        let cleanup = LobbyCleanup::default();
        let lobby = create_test_lobby();
        assert_eq!(cleanup.should_reclaim(&lobby, Utc::now()), None);
    }

    #[test]
    fn test_idle_lobby_is_reclaimed() {
        let cleanup = LobbyCleanup::new(Duration::from_secs(60), Duration::from_secs(10));
        let lobby = create_test_lobby();
        let later = lobby.last_activity + chrono::Duration::seconds(61);
        assert_eq!(cleanup.should_reclaim(&lobby, later), Some(ReclaimReason::Idle));
    }

    #[test]
    fn test_finished_lobby_waits_for_grace_period() {
        let cleanup = LobbyCleanup::new(Duration::from_secs(600), Duration::from_secs(10));
        let mut lobby = create_test_lobby();
        lobby.status = LobbyStatus::Finished;

        let soon = lobby.last_activity + chrono::Duration::seconds(5);
        assert_eq!(cleanup.should_reclaim(&lobby, soon), None);

        let later = lobby.last_activity + chrono::Duration::seconds(11);
        assert_eq!(
            cleanup.should_reclaim(&lobby, later),
            Some(ReclaimReason::Finished)
        );
    }
}
