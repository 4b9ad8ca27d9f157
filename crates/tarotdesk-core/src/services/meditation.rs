use std::sync::Arc;

use super::error::require;
use super::{ServiceResult, Table};
use crate::api::{Backend, Query};
use crate::models::{Meditation, MeditationUpdate, NewMeditation};

pub const MEDITATIONS_TABLE: &str = "meditations";

#[derive(Clone)]
pub struct MeditationService {
    meditations: Table,
}

impl MeditationService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            meditations: Table::new(backend, MEDITATIONS_TABLE, "Meditation"),
        }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Meditation>> {
        self.meditations.list(&Query::new().desc("created_at")).await
    }

    /// Published meditations as members see them
    pub async fn list_published(&self) -> ServiceResult<Vec<Meditation>> {
        self.meditations
            .list(&Query::new().eq("is_published", true).desc("created_at"))
            .await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Meditation> {
        self.meditations.get(id).await
    }

    pub async fn create(&self, meditation: &NewMeditation) -> ServiceResult<Meditation> {
        require(&meditation.title, "Title")?;
        require(&meditation.audio_url, "Audio URL")?;
        self.meditations.insert(meditation).await
    }

    pub async fn update(&self, id: &str, update: &MeditationUpdate) -> ServiceResult<Meditation> {
        if let Some(ref title) = update.title {
            require(title, "Title")?;
        }
        if let Some(ref url) = update.audio_url {
            require(url, "Audio URL")?;
        }
        self.meditations.update(id, update).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.meditations.delete(id).await
    }

    pub async fn toggle_published(&self, meditation: &Meditation) -> ServiceResult<Meditation> {
        self.meditations
            .set_flag(&meditation.id, "is_published", !meditation.is_published)
            .await
    }

    pub async fn toggle_featured(&self, meditation: &Meditation) -> ServiceResult<Meditation> {
        self.meditations
            .set_flag(&meditation.id, "is_featured", !meditation.is_featured)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::models::MeditationCategory;

    fn new_meditation() -> NewMeditation {
        NewMeditation {
            title: "Grounding Before a Reading".to_string(),
            description: Some("Ten minutes of breath work".to_string()),
            audio_url: "https://cdn.example.com/grounding.mp3".to_string(),
            duration_minutes: Some(10),
            category: MeditationCategory::Intuition,
            is_featured: false,
            is_published: true,
        }
    }

    #[tokio::test]
    async fn test_toggles_flip_one_flag() {
        let service = MeditationService::new(Arc::new(MemoryBackend::new()));
        let created = service.create(&new_meditation()).await.unwrap();

        let featured = service.toggle_featured(&created).await.unwrap();
        assert!(featured.is_featured);
        assert_eq!(featured.is_published, created.is_published);
        assert_eq!(featured.title, created.title);
        assert_eq!(featured.audio_url, created.audio_url);
        assert_eq!(featured.duration_minutes, created.duration_minutes);
        assert_eq!(featured.category, created.category);

        let hidden = service.toggle_published(&featured).await.unwrap();
        assert!(!hidden.is_published);
        assert!(hidden.is_featured);
        assert!(service.list_published().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_requires_audio() {
        let service = MeditationService::new(Arc::new(MemoryBackend::new()));
        let mut m = new_meditation();
        m.audio_url = "  ".to_string();
        assert!(service.create(&m).await.unwrap_err().is_validation());
    }
}
