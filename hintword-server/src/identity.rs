use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use hintword_types::{User, UserId};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Resolves opaque session tokens to users and keeps their lifetime totals.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> Option<User>;

    /// Overwrite a user's persistent totals. Returns the updated user.
    async fn update_totals(
        &self,
        user_id: UserId,
        total_score: i64,
        total_correct_guesses: i64,
    ) -> Option<User>;
}

#[derive(Default)]
pub struct InMemoryIdentity {
    tokens: RwLock<HashMap<String, UserId>>,
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user and hand out a fresh token for it.
    pub async fn issue_token(&self, display_name: &str) -> (String, User) {
        let user = User {
            id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            total_score: 0,
            total_correct_guesses: 0,
            created_at: Utc::now().to_rfc3339(),
        };
        let token = Uuid::new_v4().to_string();

        self.users.write().await.insert(user.id, user.clone());
        self.tokens.write().await.insert(token.clone(), user.id);
        info!("Issued session for {} ({})", user.display_name, user.id);
        (token, user)
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token).is_some()
    }

    pub async fn user(&self, user_id: UserId) -> Option<User> {
        self.users.read().await.get(&user_id).cloned()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    async fn resolve(&self, token: &str) -> Option<User> {
        let user_id = *self.tokens.read().await.get(token)?;
        let user = self.users.read().await.get(&user_id).cloned();
        if user.is_none() {
            debug!("Token resolved to unknown user {}", user_id);
        }
        user
    }

    async fn update_totals(
        &self,
        user_id: UserId,
        total_score: i64,
        total_correct_guesses: i64,
    ) -> Option<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id)?;
        user.total_score = total_score;
        user.total_correct_guesses = total_correct_guesses;
        Some(user.clone())
    }
}
