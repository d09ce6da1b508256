use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use hintword_types::{Language, LobbyError, LobbyResult};
use rand::Rng;
use tracing::{debug, warn};

use crate::deck::{Card, MAX_WORDS_PER_CARD, MysteryWord};

/// Immutable card stock, one pool per language. Drawing marks cards as
/// consumed until they are released again.
#[derive(Debug, Default)]
pub struct CardCatalog {
    cards: HashMap<Language, Vec<Card>>,
}

impl CardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a card list: one card per line, words separated by `,`, each
    /// word optionally followed by `=description`. Blank lines and `#`
    /// comments are skipped.
    pub fn parse_cards(language: Language, card_list: &str) -> Vec<Card> {
        card_list
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let words: Vec<MysteryWord> = line
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(|entry| match entry.split_once('=') {
                        Some((word, description)) => {
                            MysteryWord::new(word.trim()).with_description(description.trim())
                        }
                        None => MysteryWord::new(entry),
                    })
                    .collect();

                if words.is_empty() {
                    return None;
                }
                if words.len() > MAX_WORDS_PER_CARD {
                    warn!(
                        "Card '{}' has {} words, keeping the first {}",
                        line,
                        words.len(),
                        MAX_WORDS_PER_CARD
                    );
                }
                Some(Card::new(language, words))
            })
            .collect()
    }

    pub fn from_card_list(language: Language, card_list: &str) -> Self {
        let mut catalog = Self::new();
        catalog.add_cards(Self::parse_cards(language, card_list));
        catalog
    }

    /// Load `<language-code>.txt` for every supported language found in `dir`.
    pub fn load_directory<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut catalog = Self::new();

        for language in Language::all() {
            let path = dir.join(format!("{}.txt", language.code()));
            if !path.exists() {
                warn!("No card file for language {} at {}", language, path.display());
                continue;
            }

            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("reading card file {}", path.display()))?;
            let cards = Self::parse_cards(language, &contents);
            debug!("Loaded {} cards for language {}", cards.len(), language);
            catalog.add_cards(cards);
        }

        if catalog.total_cards() == 0 {
            return Err(anyhow!("no cards found in {}", dir.display()));
        }

        Ok(catalog)
    }

    pub fn add_cards(&mut self, cards: impl IntoIterator<Item = Card>) {
        for card in cards {
            self.cards.entry(card.language).or_default().push(card);
        }
    }

    pub fn total_cards(&self) -> usize {
        self.cards.values().map(Vec::len).sum()
    }

    /// Number of undrawn cards for `language`.
    pub fn available(&self, language: Language) -> usize {
        self.cards
            .get(&language)
            .map(|cards| cards.iter().filter(|c| !c.drawn).count())
            .unwrap_or(0)
    }

    /// Draw exactly `count` undrawn cards, chosen uniformly at random.
    pub fn draw_cards<R: Rng + ?Sized>(
        &mut self,
        language: Language,
        count: usize,
        rng: &mut R,
    ) -> LobbyResult<Vec<Card>> {
        let available = self.available(language);
        if available < count {
            return Err(LobbyError::not_found(format!(
                "only {} of {} cards available for language {}",
                available, count, language
            )));
        }
        Ok(self.draw_available(language, count, rng))
    }

    /// Draw up to `count` undrawn cards; fewer when the pool runs low.
    pub fn draw_available<R: Rng + ?Sized>(
        &mut self,
        language: Language,
        count: usize,
        rng: &mut R,
    ) -> Vec<Card> {
        let Some(pool) = self.cards.get_mut(&language) else {
            return Vec::new();
        };

        let undrawn: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, card)| !card.drawn)
            .map(|(i, _)| i)
            .collect();
        let amount = count.min(undrawn.len());

        rand::seq::index::sample(rng, undrawn.len(), amount)
            .into_iter()
            .map(|pick| {
                let card = &mut pool[undrawn[pick]];
                card.drawn = true;
                card.clone()
            })
            .collect()
    }

    /// Return cards from a reclaimed deck to the undrawn pool.
    pub fn release(&mut self, cards: impl IntoIterator<Item = Card>) {
        for card in cards {
            if let Some(stock) = self
                .cards
                .get_mut(&card.language)
                .and_then(|pool| pool.iter_mut().find(|c| c.id == card.id))
            {
                stock.reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    const CARDS: &str = "# english cards\nSun, Moon, Star\n\nRiver=a flowing body of water, Stone\nApple, Pear, Plum, Fig, Lime, Kiwi\n";

    #[test]
    fn test_parse_cards() {
        let cards = CardCatalog::parse_cards(Language::En, CARDS);
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].words.len(), 3);
        assert_eq!(cards[1].words[0].text, "River");
        assert_eq!(
            cards[1].words[0].description.as_deref(),
            Some("a flowing body of water")
        );
        assert_eq!(cards[2].words.len(), MAX_WORDS_PER_CARD);
    }

    #[test]
    fn test_draw_marks_cards_drawn() {
        let mut catalog = CardCatalog::from_card_list(Language::En, CARDS);
        let mut rng = StdRng::seed_from_u64(7);

        let drawn = catalog.draw_cards(Language::En, 2, &mut rng).unwrap();
        assert_eq!(drawn.len(), 2);
        assert!(drawn.iter().all(|c| c.drawn));
        assert_eq!(catalog.available(Language::En), 1);

        let ids: HashSet<_> = drawn.iter().map(|c| c.id).collect();
        let last = catalog.draw_cards(Language::En, 1, &mut rng).unwrap();
        assert!(!ids.contains(&last[0].id));
        assert_eq!(catalog.available(Language::En), 0);
    }

    #[test]
    fn test_draw_more_than_available_is_not_found() {
        let mut catalog = CardCatalog::from_card_list(Language::En, CARDS);
        let mut rng = StdRng::seed_from_u64(1);

        let err = catalog.draw_cards(Language::En, 4, &mut rng).unwrap_err();
        assert_eq!(err.kind(), hintword_types::ErrorKind::NotFound);
        // Nothing was consumed by the failed draw
        assert_eq!(catalog.available(Language::En), 3);

        let partial = catalog.draw_available(Language::En, 4, &mut rng);
        assert_eq!(partial.len(), 3);
        assert!(catalog.draw_available(Language::De, 2, &mut rng).is_empty());
    }

    #[test]
    fn test_release_returns_cards() {
        let mut catalog = CardCatalog::from_card_list(Language::En, CARDS);
        let mut rng = StdRng::seed_from_u64(3);

        let drawn = catalog.draw_cards(Language::En, 3, &mut rng).unwrap();
        assert_eq!(catalog.available(Language::En), 0);
        catalog.release(drawn);
        assert_eq!(catalog.available(Language::En), 3);
    }

    #[test]
    fn test_load_directory_without_files_fails() {
        let dir = std::env::temp_dir().join(format!("hintword-empty-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(CardCatalog::load_directory(&dir).is_err());

        std::fs::write(dir.join("de.txt"), "Sonne, Mond\n").unwrap();
        let catalog = CardCatalog::load_directory(&dir).unwrap();
        assert_eq!(catalog.available(Language::De), 1);
        assert_eq!(catalog.available(Language::En), 0);
        std::fs::remove_dir_all(&dir).ok();
    }
}
