use chrono::{DateTime, Duration, Utc};
use hintword_types::{CardId, Language, LobbyError, LobbyResult, WordStatus};
use uuid::Uuid;

/// Upper bound on words per card.
pub const MAX_WORDS_PER_CARD: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct MysteryWord {
    pub text: String,
    pub status: WordStatus,
    pub description: Option<String>,
    pub drawn_at: Option<DateTime<Utc>>,
    pub clue_deadline: Option<DateTime<Utc>>,
    pub last_guess_correct: Option<bool>,
}

impl MysteryWord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: WordStatus::NotUsed,
            description: None,
            drawn_at: None,
            clue_deadline: None,
            last_guess_correct: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn matches(&self, text: &str) -> bool {
        self.text.to_lowercase() == text.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: CardId,
    pub language: Language,
    pub words: Vec<MysteryWord>,
    pub drawn: bool,
}

impl Card {
    /// Build a card, keeping at most [`MAX_WORDS_PER_CARD`] words.
    pub fn new(language: Language, mut words: Vec<MysteryWord>) -> Self {
        words.truncate(MAX_WORDS_PER_CARD);
        Self {
            id: Uuid::new_v4(),
            language,
            words,
            drawn: false,
        }
    }

    pub fn from_words(language: Language, words: &[&str]) -> Self {
        Self::new(language, words.iter().map(|w| MysteryWord::new(*w)).collect())
    }

    pub fn word_in_use(&self) -> Option<&MysteryWord> {
        self.words.iter().find(|w| w.status == WordStatus::InUse)
    }

    fn word_in_use_mut(&mut self) -> Option<&mut MysteryWord> {
        self.words.iter_mut().find(|w| w.status == WordStatus::InUse)
    }

    /// Reset every word so the card can be drawn again.
    pub fn reset(&mut self) {
        self.drawn = false;
        for word in &mut self.words {
            word.status = WordStatus::NotUsed;
            word.drawn_at = None;
            word.clue_deadline = None;
            word.last_guess_correct = None;
        }
    }
}

/// The cards a lobby plays through, front to back.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Card>,
    active: Option<usize>,
}

impl Deck {
    pub fn new(cards: Vec<Card>) -> Self {
        let active = if cards.is_empty() { None } else { Some(0) };
        Self { cards, active }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_card(&self) -> Option<&Card> {
        self.active.and_then(|i| self.cards.get(i))
    }

    fn active_card_mut(&mut self) -> Option<&mut Card> {
        match self.active {
            Some(i) => self.cards.get_mut(i),
            None => None,
        }
    }

    pub fn word_in_use(&self) -> Option<&MysteryWord> {
        self.active_card().and_then(Card::word_in_use)
    }

    /// Put the word at `index` (zero based) of the active card in play.
    pub fn choose_word(
        &mut self,
        index: usize,
        now: DateTime<Utc>,
        clue_time: Duration,
    ) -> LobbyResult<&MysteryWord> {
        let card = self
            .active_card_mut()
            .ok_or_else(|| LobbyError::validation("no active card"))?;

        if card.word_in_use().is_some() {
            return Err(LobbyError::conflict("a word is already in use on this card"));
        }

        let word_count = card.words.len();
        let word = card.words.get_mut(index).ok_or_else(|| {
            LobbyError::validation(format!(
                "word number {} is not on the card (1..={})",
                index + 1,
                word_count
            ))
        })?;

        word.status = WordStatus::InUse;
        word.drawn_at = Some(now);
        word.clue_deadline = Some(now + clue_time);
        Ok(word)
    }

    /// Mark the word in use as played and move to the next card.
    /// Returns `true` while cards remain.
    pub fn finish_active_card(&mut self, guessed_correctly: bool) -> bool {
        if let Some(word) = self.active_card_mut().and_then(Card::word_in_use_mut) {
            word.status = WordStatus::Used;
            word.last_guess_correct = Some(guessed_correctly);
        }

        self.active = match self.active {
            Some(i) if i + 1 < self.cards.len() => Some(i + 1),
            _ => None,
        };
        self.active.is_some()
    }

    pub fn into_cards(self) -> Vec<Card> {
        self.cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck() -> Deck {
        Deck::new(vec![
            Card::from_words(Language::En, &["Sun", "Moon"]),
            Card::from_words(Language::En, &["River", "Stone", "Cloud"]),
        ])
    }

    #[test]
    fn test_card_truncates_to_five_words() {
        let card = Card::from_words(Language::En, &["a", "b", "c", "d", "e", "f"]);
        assert_eq!(card.words.len(), MAX_WORDS_PER_CARD);
    }

    #[test]
    fn test_choose_word_marks_in_use_and_deadline() {
        let mut deck = deck();
        let now = Utc::now();
        let word = deck.choose_word(0, now, Duration::seconds(90)).unwrap();
        assert_eq!(word.text, "Sun");
        assert_eq!(word.status, WordStatus::InUse);
        assert_eq!(word.clue_deadline, Some(now + Duration::seconds(90)));
        assert_eq!(deck.word_in_use().map(|w| w.text.as_str()), Some("Sun"));

        // A second choice on the same card is refused
        assert!(deck.choose_word(1, now, Duration::seconds(90)).is_err());
    }

    #[test]
    fn test_choose_word_out_of_range() {
        let mut deck = deck();
        let err = deck.choose_word(7, Utc::now(), Duration::seconds(1)).unwrap_err();
        assert!(err.message().contains("not on the card"));
    }

    #[test]
    fn test_finish_active_card_advances_until_exhausted() {
        let mut deck = deck();
        deck.choose_word(1, Utc::now(), Duration::seconds(1)).unwrap();
        assert!(deck.finish_active_card(true));
        assert_eq!(deck.cards()[0].words[1].status, WordStatus::Used);
        assert_eq!(deck.cards()[0].words[1].last_guess_correct, Some(true));
        assert_eq!(deck.active_index(), Some(1));

        assert!(!deck.finish_active_card(false));
        assert!(deck.active_card().is_none());
        assert!(deck.word_in_use().is_none());
    }

    #[test]
    fn test_word_match_is_case_insensitive() {
        let word = MysteryWord::new("Sun");
        assert!(word.matches("sUN"));
        assert!(word.matches(" sun "));
        assert!(!word.matches("suns"));
    }

    #[test]
    fn test_reset_clears_play_state() {
        let mut deck = deck();
        deck.choose_word(0, Utc::now(), Duration::seconds(1)).unwrap();
        let mut cards = deck.into_cards();
        cards[0].drawn = true;
        cards[0].reset();
        assert!(!cards[0].drawn);
        assert_eq!(cards[0].words[0].text, "Sun");
        assert_eq!(cards[0].words[0].status, WordStatus::NotUsed);
        assert!(cards[0].words[0].drawn_at.is_none());
    }
}
