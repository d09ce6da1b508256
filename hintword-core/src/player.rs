use chrono::{DateTime, Utc};
use hintword_types::{
    ClueId, LobbyError, LobbyResult, PlayerId, PlayerStatus, PlayerType, PlayerView, Role, User,
    UserId,
};
use uuid::Uuid;

/// A user's seat in one lobby. Bots have no user identity.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub user_id: Option<UserId>,
    pub display_name: String,
    pub role: Role,
    pub player_type: PlayerType,
    pub status: PlayerStatus,
    pub clue: Option<ClueId>,
    pub joined_at: DateTime<Utc>,
    pub total_score: i64,
    pub total_correct_guesses: i64,
}

impl Player {
    pub fn human(user: &User, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: Some(user.id),
            display_name: user.display_name.clone(),
            role,
            player_type: PlayerType::Human,
            status: PlayerStatus::Joined,
            clue: None,
            joined_at: Utc::now(),
            total_score: user.total_score,
            total_correct_guesses: user.total_correct_guesses,
        }
    }

    /// Bots always write clues and never need to ready up.
    pub fn bot(player_type: PlayerType) -> LobbyResult<Self> {
        let display_name = match player_type {
            PlayerType::Human => {
                return Err(LobbyError::unsupported("cannot create a bot of type Human"));
            }
            PlayerType::RandomBot => "Random Bot",
            PlayerType::SynonymBot => "Synonym Bot",
            PlayerType::AntonymBot => "Antonym Bot",
        };

        Ok(Self {
            id: Uuid::new_v4(),
            user_id: None,
            display_name: display_name.to_string(),
            role: Role::ClueCreator,
            player_type,
            status: PlayerStatus::Ready,
            clue: None,
            joined_at: Utc::now(),
            total_score: 0,
            total_correct_guesses: 0,
        })
    }

    pub fn is_human(&self) -> bool {
        self.player_type.is_human()
    }

    pub fn is_guesser(&self) -> bool {
        self.role == Role::Guesser
    }

    pub fn is_clue_creator(&self) -> bool {
        self.role == Role::ClueCreator
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn set_status(&mut self, status: PlayerStatus) {
        self.status = status;
    }

    pub fn to_view(&self, creator: PlayerId) -> PlayerView {
        PlayerView {
            id: self.id,
            user_id: self.user_id,
            display_name: self.display_name.clone(),
            role: self.role,
            player_type: self.player_type,
            status: self.status,
            clue: self.clue,
            is_creator: self.id == creator,
        }
    }
}

/// Players of one lobby in join order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn get_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Member lookup that reports strangers as Unauthorized.
    pub fn member(&self, player_id: PlayerId) -> LobbyResult<&Player> {
        self.get(player_id)
            .ok_or_else(|| LobbyError::unauthorized("player is not a member of this lobby"))
    }

    pub fn by_user(&self, user_id: UserId) -> Option<&Player> {
        self.players.iter().find(|p| p.user_id == Some(user_id))
    }

    pub fn push(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn remove(&mut self, player_id: PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == player_id)?;
        Some(self.players.remove(index))
    }

    pub fn first(&self) -> Option<&Player> {
        self.players.first()
    }

    pub fn first_human(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_human())
    }

    pub fn guesser(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_guesser())
    }

    /// Human players other than `active`, in join order.
    pub fn humans_except(&self, active: PlayerId) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| p.is_human() && p.id != active)
            .collect()
    }

    pub fn bot_players(&self) -> Vec<&Player> {
        self.players.iter().filter(|p| !p.is_human()).collect()
    }

    pub fn clue_creators(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_clue_creator())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            display_name: name.to_string(),
            total_score: 40,
            total_correct_guesses: 2,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_human_player_carries_user_totals() {
        let player = Player::human(&user("Alice"), Role::Guesser);
        assert!(player.is_human());
        assert!(player.is_guesser());
        assert_eq!(player.status, PlayerStatus::Joined);
        assert_eq!(player.total_score, 40);
        assert_eq!(player.total_correct_guesses, 2);
    }

    #[test]
    fn test_create_bot_player() {
        let bot = Player::bot(PlayerType::SynonymBot).unwrap();
        assert!(bot.user_id.is_none());
        assert_eq!(bot.role, Role::ClueCreator);
        assert_eq!(bot.status, PlayerStatus::Ready);

        let err = Player::bot(PlayerType::Human).unwrap_err();
        assert_eq!(err.kind(), hintword_types::ErrorKind::Unsupported);
    }

    #[test]
    fn test_roster_queries_keep_join_order() {
        let mut roster = Roster::new();
        let alice = Player::human(&user("Alice"), Role::Guesser);
        let bot = Player::bot(PlayerType::RandomBot).unwrap();
        let bob = Player::human(&user("Bob"), Role::ClueCreator);
        let carol = Player::human(&user("Carol"), Role::ClueCreator);
        let (alice_id, bot_id, bob_id, carol_id) = (alice.id, bot.id, bob.id, carol.id);

        roster.push(alice);
        roster.push(bot);
        roster.push(bob);
        roster.push(carol);

        let others: Vec<_> = roster.humans_except(alice_id).iter().map(|p| p.id).collect();
        assert_eq!(others, vec![bob_id, carol_id]);

        let bots: Vec<_> = roster.bot_players().iter().map(|p| p.id).collect();
        assert_eq!(bots, vec![bot_id]);

        assert_eq!(roster.guesser().map(|p| p.id), Some(alice_id));
        assert_eq!(roster.clue_creators().count(), 3);

        roster.remove(alice_id);
        assert_eq!(roster.first().map(|p| p.id), Some(bot_id));
        assert_eq!(roster.first_human().map(|p| p.id), Some(bob_id));
        assert!(roster.member(alice_id).is_err());
    }
}
