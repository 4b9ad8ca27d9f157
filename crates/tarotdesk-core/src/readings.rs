//! Digital card readings: lookup and the member-facing selection flow.
//!
//! A member picks a category, then a Major Arcana card number. If a video
//! reading exists for that pair it is shown, otherwise a "coming soon" state.

use crate::models::{CardNumber, DigitalReading, ReadingCategory};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadingLookup<'a> {
    Found(&'a DigitalReading),
    ComingSoon {
        category: ReadingCategory,
        card_number: CardNumber,
    },
}

impl ReadingLookup<'_> {
    pub fn is_found(&self) -> bool {
        matches!(self, ReadingLookup::Found(_))
    }
}

/// Find the reading for a category and card. Never fails; a missing record
/// yields `ComingSoon`.
pub fn lookup(readings: &[DigitalReading], category: ReadingCategory, card_number: CardNumber) -> ReadingLookup<'_> {
    readings
        .iter()
        .find(|r| r.category == category && r.card_number == card_number)
        .map(ReadingLookup::Found)
        .unwrap_or(ReadingLookup::ComingSoon {
            category,
            card_number,
        })
}

/// Which cards in a category have a recorded reading
pub fn available_cards(readings: &[DigitalReading], category: ReadingCategory) -> Vec<CardNumber> {
    let mut cards: Vec<CardNumber> = readings
        .iter()
        .filter(|r| r.category == category)
        .map(|r| r.card_number)
        .collect();
    cards.sort();
    cards.dedup();
    cards
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReadingStep {
    #[default]
    Initial,
    NumberSelection {
        category: ReadingCategory,
    },
    VideoResult {
        reading: DigitalReading,
    },
    ComingSoon {
        category: ReadingCategory,
        card_number: CardNumber,
    },
}

/// Member-facing selection flow:
/// `Initial → NumberSelection → VideoResult | ComingSoon`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingFlow {
    step: ReadingStep,
}

impl ReadingFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> &ReadingStep {
        &self.step
    }

    pub fn category(&self) -> Option<ReadingCategory> {
        match &self.step {
            ReadingStep::Initial => None,
            ReadingStep::NumberSelection { category } | ReadingStep::ComingSoon { category, .. } => Some(*category),
            ReadingStep::VideoResult { reading } => Some(reading.category),
        }
    }

    pub fn select_category(&mut self, category: ReadingCategory) {
        self.step = ReadingStep::NumberSelection { category };
    }

    /// Pick a card. Ignored unless a category has been chosen.
    pub fn select_number(&mut self, card_number: CardNumber, readings: &[DigitalReading]) {
        let ReadingStep::NumberSelection { category } = self.step else {
            return;
        };
        self.step = match lookup(readings, category, card_number) {
            ReadingLookup::Found(reading) => ReadingStep::VideoResult {
                reading: reading.clone(),
            },
            ReadingLookup::ComingSoon { category, card_number } => ReadingStep::ComingSoon {
                category,
                card_number,
            },
        };
    }

    /// Start over with nothing selected.
    pub fn choose_again(&mut self) {
        self.step = ReadingStep::Initial;
    }

    /// Leave number selection to pick another category.
    pub fn change_category(&mut self) {
        if matches!(self.step, ReadingStep::NumberSelection { .. }) {
            self.step = ReadingStep::Initial;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(category: ReadingCategory, n: i32) -> DigitalReading {
        let card_number = CardNumber::new(n).unwrap();
        DigitalReading {
            id: format!("{}-{}", category.as_str(), n),
            category,
            card_number,
            card_name: card_number.arcana_name().to_string(),
            card_meaning: None,
            video_url: format!("https://youtu.be/card{}", n),
            created_at: None,
            updated_at: None,
        }
    }

    fn library() -> Vec<DigitalReading> {
        vec![
            reading(ReadingCategory::LoveRelationships, 6),
            reading(ReadingCategory::General, 0),
            reading(ReadingCategory::General, 21),
            reading(ReadingCategory::General, 6),
        ]
    }

    #[test]
    fn test_lookup_every_pair() {
        let readings = library();
        for category in ReadingCategory::ALL {
            for card in CardNumber::all() {
                match lookup(&readings, category, card) {
                    ReadingLookup::Found(r) => {
                        assert_eq!(r.category, category);
                        assert_eq!(r.card_number, card);
                    }
                    ReadingLookup::ComingSoon { category: c, card_number } => {
                        assert_eq!(c, category);
                        assert_eq!(card_number, card);
                        assert!(!readings.iter().any(|r| r.category == category && r.card_number == card));
                    }
                }
            }
        }
    }

    #[test]
    fn test_lookup_respects_category() {
        let readings = library();
        let lovers = CardNumber::new(6).unwrap();
        let love = lookup(&readings, ReadingCategory::LoveRelationships, lovers);
        assert!(matches!(love, ReadingLookup::Found(r) if r.id == "love_relationships-6"));

        let zero = CardNumber::new(0).unwrap();
        assert!(!lookup(&readings, ReadingCategory::LoveRelationships, zero).is_found());
        assert!(lookup(&readings, ReadingCategory::General, zero).is_found());
        assert!(!lookup(&[], ReadingCategory::General, zero).is_found());
    }

    #[test]
    fn test_available_cards() {
        let cards: Vec<u8> = available_cards(&library(), ReadingCategory::General)
            .iter()
            .map(|c| c.get())
            .collect();
        assert_eq!(cards, vec![0, 6, 21]);
    }

    #[test]
    fn test_flow_to_video_and_back() {
        let readings = library();
        let mut flow = ReadingFlow::new();

        // Numbers are ignored before a category is chosen
        flow.select_number(CardNumber::new(0).unwrap(), &readings);
        assert_eq!(flow.step(), &ReadingStep::Initial);

        flow.select_category(ReadingCategory::General);
        flow.select_number(CardNumber::new(21).unwrap(), &readings);
        match flow.step() {
            ReadingStep::VideoResult { reading } => assert_eq!(reading.card_name, "The World"),
            other => panic!("unexpected step: {:?}", other),
        }

        flow.choose_again();
        assert_eq!(flow.step(), &ReadingStep::Initial);
        assert_eq!(flow.category(), None);
    }

    #[test]
    fn test_flow_coming_soon_and_change_category() {
        let readings = library();
        let mut flow = ReadingFlow::new();
        flow.select_category(ReadingCategory::LoveRelationships);
        flow.change_category();
        assert_eq!(flow.step(), &ReadingStep::Initial);

        flow.select_category(ReadingCategory::LoveRelationships);
        flow.select_number(CardNumber::new(13).unwrap(), &readings);
        assert_eq!(
            flow.step(),
            &ReadingStep::ComingSoon {
                category: ReadingCategory::LoveRelationships,
                card_number: CardNumber::new(13).unwrap(),
            }
        );
        assert_eq!(flow.category(), Some(ReadingCategory::LoveRelationships));

        // Change category only applies during number selection
        flow.change_category();
        assert!(matches!(flow.step(), ReadingStep::ComingSoon { .. }));
    }
}
