use std::sync::Arc;

use super::error::require;
use super::{ServiceError, ServiceResult, Table};
use crate::api::{Backend, Query};
use crate::models::{CardNumber, DigitalReading, DigitalReadingUpdate, NewDigitalReading, ReadingCategory};
use crate::readings::{self, ReadingLookup};

pub const DIGITAL_READINGS_TABLE: &str = "digital_readings";

fn duplicate_reading_message(category: ReadingCategory, card: CardNumber) -> String {
    format!(
        "A {} reading for card {} ({}) already exists",
        category,
        card,
        card.arcana_name()
    )
}

/// Outcome of looking up a reading against the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    Found(DigitalReading),
    ComingSoon {
        category: ReadingCategory,
        card_number: CardNumber,
    },
}

impl From<ReadingLookup<'_>> for LookupResult {
    fn from(lookup: ReadingLookup<'_>) -> Self {
        match lookup {
            ReadingLookup::Found(r) => LookupResult::Found(r.clone()),
            ReadingLookup::ComingSoon { category, card_number } => LookupResult::ComingSoon {
                category,
                card_number,
            },
        }
    }
}

#[derive(Clone)]
pub struct DigitalReadingService {
    readings: Table,
}

impl DigitalReadingService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            readings: Table::new(backend, DIGITAL_READINGS_TABLE, "Reading"),
        }
    }

    /// All readings by category, then card number
    pub async fn list(&self) -> ServiceResult<Vec<DigitalReading>> {
        self.readings
            .list(&Query::new().asc("category").asc("card_number"))
            .await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<DigitalReading> {
        self.readings.get(id).await
    }

    async fn find_pair(&self, category: ReadingCategory, card: CardNumber) -> ServiceResult<Option<DigitalReading>> {
        self.readings
            .find(
                &Query::new()
                    .eq("category", category.as_str())
                    .eq("card_number", card.get()),
            )
            .await
    }

    pub async fn create(&self, reading: &NewDigitalReading) -> ServiceResult<DigitalReading> {
        require(&reading.card_name, "Card name")?;
        require(&reading.video_url, "Video URL")?;

        if self.find_pair(reading.category, reading.card_number).await?.is_some() {
            return Err(ServiceError::Conflict(duplicate_reading_message(
                reading.category,
                reading.card_number,
            )));
        }

        match self.readings.insert(reading).await {
            Err(ServiceError::Backend(e)) if e.is_unique_violation() => Err(ServiceError::Conflict(
                duplicate_reading_message(reading.category, reading.card_number),
            )),
            other => other,
        }
    }

    pub async fn update(&self, id: &str, update: &DigitalReadingUpdate) -> ServiceResult<DigitalReading> {
        if let Some(ref name) = update.card_name {
            require(name, "Card name")?;
        }
        if let Some(ref url) = update.video_url {
            require(url, "Video URL")?;
        }

        if update.category.is_some() || update.card_number.is_some() {
            let current = self.get(id).await?;
            let category = update.category.unwrap_or(current.category);
            let card = update.card_number.unwrap_or(current.card_number);
            if let Some(existing) = self.find_pair(category, card).await? {
                if existing.id != id {
                    return Err(ServiceError::Conflict(duplicate_reading_message(category, card)));
                }
            }
        }

        self.readings.update(id, update).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.readings.delete(id).await
    }

    pub async fn lookup(&self, category: ReadingCategory, card_number: CardNumber) -> ServiceResult<LookupResult> {
        let candidates: Vec<DigitalReading> = self
            .readings
            .list(&Query::new().eq("category", category.as_str()))
            .await?;
        Ok(readings::lookup(&candidates, category, card_number).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;

    fn new_reading(category: ReadingCategory, n: i32) -> NewDigitalReading {
        let card_number = CardNumber::new(n).unwrap();
        NewDigitalReading {
            category,
            card_number,
            card_name: card_number.arcana_name().to_string(),
            card_meaning: Some("New beginnings".to_string()),
            video_url: "https://www.youtube.com/watch?v=abc123".to_string(),
        }
    }

    fn service() -> DigitalReadingService {
        DigitalReadingService::new(Arc::new(MemoryBackend::with_schema()))
    }

    #[tokio::test]
    async fn test_duplicate_pair_rejected() {
        let readings = service();
        readings.create(&new_reading(ReadingCategory::General, 0)).await.unwrap();
        // Same card in the other category is fine
        readings
            .create(&new_reading(ReadingCategory::LoveRelationships, 0))
            .await
            .unwrap();

        let err = readings
            .create(&new_reading(ReadingCategory::General, 0))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "A General Guidance reading for card 0 (The Fool) already exists");
    }

    #[tokio::test]
    async fn test_update_into_taken_pair() {
        let readings = service();
        readings.create(&new_reading(ReadingCategory::General, 1)).await.unwrap();
        let other = readings.create(&new_reading(ReadingCategory::General, 2)).await.unwrap();

        let update = DigitalReadingUpdate {
            card_number: CardNumber::new(1),
            ..Default::default()
        };
        assert!(readings.update(&other.id, &update).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_lookup_found_and_coming_soon() {
        let readings = service();
        let created = readings
            .create(&new_reading(ReadingCategory::LoveRelationships, 6))
            .await
            .unwrap();

        let six = CardNumber::new(6).unwrap();
        assert_eq!(
            readings.lookup(ReadingCategory::LoveRelationships, six).await.unwrap(),
            LookupResult::Found(created)
        );
        assert_eq!(
            readings.lookup(ReadingCategory::General, six).await.unwrap(),
            LookupResult::ComingSoon {
                category: ReadingCategory::General,
                card_number: six,
            }
        );
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let readings = service();
        readings.create(&new_reading(ReadingCategory::General, 9)).await.unwrap();
        readings.create(&new_reading(ReadingCategory::General, 3)).await.unwrap();
        readings.create(&new_reading(ReadingCategory::LoveRelationships, 1)).await.unwrap();

        let order: Vec<(ReadingCategory, u8)> = readings
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| (r.category, r.card_number.get()))
            .collect();
        assert_eq!(
            order,
            vec![
                (ReadingCategory::General, 3),
                (ReadingCategory::General, 9),
                (ReadingCategory::LoveRelationships, 1),
            ]
        );
    }
}
