use std::collections::HashMap;

use hintword_types::{GameStatsView, LobbyError, LobbyId, LobbyResult, PlayerId};
use tracing::error;

pub const TEAM_CARD_POINTS: i64 = 10;
pub const CORRECT_GUESS_POINTS: i64 = 5;
pub const GOOD_CLUE_POINTS: i64 = 3;

/// Running counters for one player in one lobby. Counters only grow, except
/// good clues which a later flag can take back.
#[derive(Debug, Clone, PartialEq)]
pub struct GameStats {
    pub player_id: PlayerId,
    pub lobby_id: LobbyId,
    pub guess_count: u32,
    pub correct_guess_count: u32,
    pub clues_given: u32,
    pub good_clues: u32,
    pub guess_time_ms: u64,
    pub clue_time_ms: u64,
    pub team_points: u32,
    pub score: i64,
}

impl GameStats {
    pub fn new(player_id: PlayerId, lobby_id: LobbyId) -> Self {
        Self {
            player_id,
            lobby_id,
            guess_count: 0,
            correct_guess_count: 0,
            clues_given: 0,
            good_clues: 0,
            guess_time_ms: 0,
            clue_time_ms: 0,
            team_points: 0,
            score: 0,
        }
    }

    pub fn compute_score(team_points: u32, correct_guesses: u32, good_clues: u32) -> i64 {
        team_points as i64 * TEAM_CARD_POINTS
            + correct_guesses as i64 * CORRECT_GUESS_POINTS
            + good_clues as i64 * GOOD_CLUE_POINTS
    }

    fn recompute_score(&mut self) {
        self.score = Self::compute_score(self.team_points, self.correct_guess_count, self.good_clues);
    }

    pub fn record_guess(&mut self, success: bool, elapsed_ms: u64) {
        self.guess_count += 1;
        self.guess_time_ms += elapsed_ms;
        if success {
            self.correct_guess_count += 1;
        }
        self.recompute_score();
    }

    pub fn record_clue(&mut self, was_good_clue: bool, elapsed_ms: u64) {
        self.clues_given += 1;
        self.clue_time_ms += elapsed_ms;
        if was_good_clue {
            self.good_clues += 1;
        }
        self.recompute_score();
    }

    pub fn reduce_good_clues(&mut self) {
        self.good_clues = self.good_clues.saturating_sub(1);
        self.recompute_score();
    }

    pub fn set_team_points(&mut self, team_points: u32) {
        self.team_points = team_points;
        self.recompute_score();
    }

    pub fn to_view(&self) -> GameStatsView {
        GameStatsView {
            player_id: self.player_id,
            lobby_id: self.lobby_id,
            guess_count: self.guess_count,
            correct_guess_count: self.correct_guess_count,
            clues_given: self.clues_given,
            good_clues: self.good_clues,
            guess_time_ms: self.guess_time_ms,
            clue_time_ms: self.clue_time_ms,
            team_points: self.team_points,
            score: self.score,
            average_guess_time_ms: (self.guess_count > 0)
                .then(|| self.guess_time_ms / self.guess_count as u64),
            average_clue_time_ms: (self.clues_given > 0)
                .then(|| self.clue_time_ms / self.clues_given as u64),
        }
    }
}

/// Every GameStats row of one lobby. Rows are created when a player joins;
/// a missing row on update is a construction bug.
#[derive(Debug, Clone)]
pub struct StatsBook {
    lobby_id: LobbyId,
    rows: HashMap<PlayerId, GameStats>,
}

impl StatsBook {
    pub fn new(lobby_id: LobbyId) -> Self {
        Self {
            lobby_id,
            rows: HashMap::new(),
        }
    }

    pub fn ensure(&mut self, player_id: PlayerId) -> &mut GameStats {
        let lobby_id = self.lobby_id;
        self.rows
            .entry(player_id)
            .or_insert_with(|| GameStats::new(player_id, lobby_id))
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&GameStats> {
        self.rows.get(&player_id)
    }

    pub fn expect_mut(&mut self, player_id: PlayerId) -> LobbyResult<&mut GameStats> {
        let lobby_id = self.lobby_id;
        self.rows.get_mut(&player_id).ok_or_else(|| {
            error!(
                "GameStats missing for player {} in lobby {}",
                player_id, lobby_id
            );
            LobbyError::invariant(format!(
                "no stats for player {} in lobby {}",
                player_id, lobby_id
            ))
        })
    }

    pub fn remove(&mut self, player_id: PlayerId) -> Option<GameStats> {
        self.rows.remove(&player_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameStats> {
        self.rows.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameStats> {
        self.rows.values_mut()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
