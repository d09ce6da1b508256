#![allow(dead_code)]

use chrono::Utc;
use hintword_core::{Card, Deck, Lobby, LobbySettings, Player};
use hintword_types::{GameMode, Language, PlayerId, Role, User};
use uuid::Uuid;

/// Creates a test user with the given display name
pub fn create_test_user(name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        display_name: name.to_string(),
        total_score: 0,
        total_correct_guesses: 0,
        created_at: Utc::now().to_rfc3339(),
    }
}

pub fn create_test_player(name: &str) -> Player {
    Player::human(&create_test_user(name), Role::ClueCreator)
}

/// Deck whose first card is {"Sun", "Moon"}
pub fn create_test_deck(cards: usize) -> Deck {
    let pool: [&[&str]; 4] = [
        &["Sun", "Moon"],
        &["River", "Stone", "Cloud"],
        &["Apple", "Pear"],
        &["Train", "Plane", "Boat"],
    ];
    Deck::new(
        pool.iter()
            .cycle()
            .take(cards)
            .map(|words| Card::from_words(Language::En, words))
            .collect(),
    )
}

pub struct TestTable {
    pub lobby: Lobby,
    pub players: Vec<PlayerId>,
}

impl TestTable {
    pub fn id(&self, name: &str) -> PlayerId {
        let index = match name {
            "A" => 0,
            "B" => 1,
            "C" => 2,
            "D" => 3,
            other => panic!("unknown test player {}", other),
        };
        self.players[index]
    }
}

/// Lobby "L" in WAITING with the creator A and the given extra players
pub fn create_waiting_lobby(names: &[&str], cards: usize, mode: GameMode) -> TestTable {
    let creator = create_test_player(names[0]);
    let mut players = vec![creator.id];
    let mut lobby = Lobby::new(
        "L",
        Language::En,
        mode,
        creator,
        create_test_deck(cards),
        LobbySettings::default(),
    );
    for name in &names[1..] {
        let id = lobby.add_player(create_test_player(name)).unwrap();
        players.push(id);
    }
    TestTable { lobby, players }
}

/// Every human readies up and the creator starts the game
pub fn start_table(table: &mut TestTable) {
    for id in table.players.clone() {
        table.lobby.toggle_ready(id).unwrap();
    }
    let creator = table.lobby.creator;
    table.lobby.start(creator).unwrap();
}

/// Running lobby with A (creator, guesser), B, C and "Sun" in use
pub fn create_running_table(cards: usize) -> TestTable {
    create_running_table_with(&["A", "B", "C"], cards)
}

pub fn create_running_table_with(names: &[&str], cards: usize) -> TestTable {
    let mut table = create_waiting_lobby(names, cards, GameMode::Mixed);
    start_table(&mut table);
    let guesser = table.id("A");
    table.lobby.choose_word(guesser, 1).unwrap();
    table
}

/// Every clue creator submits `hint-<n>` and finishes comparing
pub fn advance_to_guessing(table: &mut TestTable) {
    let creators: Vec<PlayerId> = table
        .lobby
        .players()
        .clue_creators()
        .map(|p| p.id)
        .collect();
    for (n, id) in creators.iter().enumerate() {
        table.lobby.submit_clue(*id, &format!("hint{}", n)).unwrap();
    }
    for id in &creators {
        table.lobby.finish_comparing(*id).unwrap();
    }
}
