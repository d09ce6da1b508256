pub mod catalog;
pub mod cleanup;
pub mod clues;
pub mod deck;
pub mod engine;
pub mod events;
pub mod game;
pub mod lobby;
pub mod player;
pub mod stats;

// Re-export main components
pub use catalog::*;
pub use cleanup::*;
pub use clues::*;
pub use deck::*;
pub use engine::*;
pub use events::*;
pub use game::*;
pub use lobby::*;
pub use player::*;
pub use stats::*;
