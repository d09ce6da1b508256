use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{ClueId, LobbyId, LobbyStatus, PlayerId};

/// Everything the lobby core reports after an accepted action. The transport
/// relays these to connected players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LobbyEvent {
    LobbyCreated { lobby_id: LobbyId, creator: PlayerId },
    PlayerJoined { lobby_id: LobbyId, player_id: PlayerId },
    PlayerReady { lobby_id: LobbyId, player_id: PlayerId, ready: bool },
    PlayerLeft { lobby_id: LobbyId, player_id: PlayerId },
    PlayerKicked { lobby_id: LobbyId, player_id: PlayerId },
    CreatorChanged { lobby_id: LobbyId, creator: PlayerId },
    GuesserChanged { lobby_id: LobbyId, guesser: PlayerId },
    GameStarted { lobby_id: LobbyId, cards: u32 },
    WordChosen { lobby_id: LobbyId, round: u32 },
    ClueSubmitted { lobby_id: LobbyId, clue_id: ClueId, author: PlayerId },
    ClueSkipped { lobby_id: LobbyId, player_id: PlayerId },
    ClueDisabled { lobby_id: LobbyId, clue_id: ClueId },
    ReviewStarted { lobby_id: LobbyId },
    GuessingStarted { lobby_id: LobbyId },
    GuessResolved { lobby_id: LobbyId, guess: String, success: bool, left_cards: u32 },
    StatusChanged { lobby_id: LobbyId, status: LobbyStatus },
    LobbyTerminated { lobby_id: LobbyId },
}

impl LobbyEvent {
    pub fn lobby_id(&self) -> LobbyId {
        match self {
            LobbyEvent::LobbyCreated { lobby_id, .. }
            | LobbyEvent::PlayerJoined { lobby_id, .. }
            | LobbyEvent::PlayerReady { lobby_id, .. }
            | LobbyEvent::PlayerLeft { lobby_id, .. }
            | LobbyEvent::PlayerKicked { lobby_id, .. }
            | LobbyEvent::CreatorChanged { lobby_id, .. }
            | LobbyEvent::GuesserChanged { lobby_id, .. }
            | LobbyEvent::GameStarted { lobby_id, .. }
            | LobbyEvent::WordChosen { lobby_id, .. }
            | LobbyEvent::ClueSubmitted { lobby_id, .. }
            | LobbyEvent::ClueSkipped { lobby_id, .. }
            | LobbyEvent::ClueDisabled { lobby_id, .. }
            | LobbyEvent::ReviewStarted { lobby_id }
            | LobbyEvent::GuessingStarted { lobby_id }
            | LobbyEvent::GuessResolved { lobby_id, .. }
            | LobbyEvent::StatusChanged { lobby_id, .. }
            | LobbyEvent::LobbyTerminated { lobby_id } => *lobby_id,
        }
    }
}
