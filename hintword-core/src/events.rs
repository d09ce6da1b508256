use hintword_types::LobbyEvent;

/// Events recorded while an action runs, drained by the host once the
/// action has been accepted.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pending: Vec<LobbyEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: LobbyEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<LobbyEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_drain_empties_log() {
        let mut log = EventLog::new();
        let lobby_id = Uuid::new_v4();
        log.record(LobbyEvent::ReviewStarted { lobby_id });
        log.record(LobbyEvent::GuessingStarted { lobby_id });
        assert_eq!(log.len(), 2);

        let events = log.drain();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.lobby_id() == lobby_id));
        assert!(log.is_empty());
    }
}
