pub mod errors;
pub mod lobby;
pub mod messages;
pub mod player;
pub mod round;

use uuid::Uuid;

pub type LobbyId = Uuid;
pub type PlayerId = Uuid;
pub type UserId = Uuid;
pub type ClueId = Uuid;
pub type CardId = Uuid;

// Re-export all types
pub use errors::*;
pub use lobby::*;
pub use messages::*;
pub use player::*;
pub use round::*;
