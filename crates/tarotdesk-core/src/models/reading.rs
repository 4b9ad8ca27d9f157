use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category a member chooses before picking a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingCategory {
    LoveRelationships,
    General,
}

impl ReadingCategory {
    pub const ALL: [ReadingCategory; 2] = [ReadingCategory::LoveRelationships, ReadingCategory::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingCategory::LoveRelationships => "love_relationships",
            ReadingCategory::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "love_relationships" | "love" => Some(ReadingCategory::LoveRelationships),
            "general" => Some(ReadingCategory::General),
            _ => None,
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            ReadingCategory::LoveRelationships => ReadingCategory::General,
            ReadingCategory::General => ReadingCategory::LoveRelationships,
        }
    }
}

impl std::fmt::Display for ReadingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadingCategory::LoveRelationships => write!(f, "Love & Relationships"),
            ReadingCategory::General => write!(f, "General Guidance"),
        }
    }
}

/// Names of the 22 Major Arcana, indexed by card number.
pub const MAJOR_ARCANA: [&str; 22] = [
    "The Fool",
    "The Magician",
    "The High Priestess",
    "The Empress",
    "The Emperor",
    "The Hierophant",
    "The Lovers",
    "The Chariot",
    "Strength",
    "The Hermit",
    "Wheel of Fortune",
    "Justice",
    "The Hanged Man",
    "Death",
    "Temperance",
    "The Devil",
    "The Tower",
    "The Star",
    "The Moon",
    "The Sun",
    "Judgement",
    "The World",
];

/// A Major Arcana card number, 0 through 21.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct CardNumber(u8);

impl CardNumber {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 21;

    pub fn new(n: i32) -> Option<Self> {
        if (Self::MIN as i32..=Self::MAX as i32).contains(&n) {
            Some(Self(n as u8))
        } else {
            None
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn arcana_name(&self) -> &'static str {
        MAJOR_ARCANA[self.0 as usize]
    }

    /// Every card number in order.
    pub fn all() -> impl Iterator<Item = CardNumber> {
        (Self::MIN..=Self::MAX).map(CardNumber)
    }
}

impl TryFrom<i32> for CardNumber {
    type Error = String;

    fn try_from(n: i32) -> Result<Self, Self::Error> {
        CardNumber::new(n).ok_or_else(|| format!("Card number must be between 0 and 21, got {}", n))
    }
}

impl From<CardNumber> for i32 {
    fn from(c: CardNumber) -> i32 {
        c.0 as i32
    }
}

impl std::fmt::Display for CardNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pre-recorded video reading for one card in one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigitalReading {
    pub id: String,
    pub category: ReadingCategory,
    pub card_number: CardNumber,
    pub card_name: String,
    #[serde(default)]
    pub card_meaning: Option<String>,
    pub video_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDigitalReading {
    pub category: ReadingCategory,
    pub card_number: CardNumber,
    pub card_name: String,
    pub card_meaning: Option<String>,
    pub video_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DigitalReadingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ReadingCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number: Option<CardNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_meaning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_number_range() {
        assert!(CardNumber::new(-1).is_none());
        assert_eq!(CardNumber::new(0).map(|c| c.get()), Some(0));
        assert_eq!(CardNumber::new(21).map(|c| c.get()), Some(21));
        assert!(CardNumber::new(22).is_none());
        assert_eq!(CardNumber::all().count(), 22);
    }

    #[test]
    fn test_card_number_serde_rejects_out_of_range() {
        let ok: CardNumber = serde_json::from_value(serde_json::json!(13)).unwrap();
        assert_eq!(ok.arcana_name(), "Death");
        assert!(serde_json::from_value::<CardNumber>(serde_json::json!(22)).is_err());
        assert_eq!(serde_json::to_value(ok).unwrap(), serde_json::json!(13));
    }

    #[test]
    fn test_category_parse_and_toggle() {
        assert_eq!(ReadingCategory::parse("love"), Some(ReadingCategory::LoveRelationships));
        assert_eq!(ReadingCategory::parse("GENERAL"), Some(ReadingCategory::General));
        assert_eq!(ReadingCategory::parse("career"), None);
        assert_eq!(ReadingCategory::General.toggle(), ReadingCategory::LoveRelationships);
    }
}
