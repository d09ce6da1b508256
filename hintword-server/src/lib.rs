pub mod config;
pub mod identity;
pub mod lobby_manager;
pub mod store;
pub mod suggestions;

pub use lobby_manager::LobbyManager;
