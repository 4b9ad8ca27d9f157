use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::error::require;
use super::{ServiceError, ServiceResult, Table};
use crate::api::{Backend, Query};
use crate::models::{Announcement, AnnouncementUpdate, NewAnnouncement};

pub const ANNOUNCEMENTS_TABLE: &str = "announcements";

#[derive(Clone)]
pub struct AnnouncementService {
    announcements: Table,
}

impl AnnouncementService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            announcements: Table::new(backend, ANNOUNCEMENTS_TABLE, "Announcement"),
        }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Announcement>> {
        self.announcements.list(&Query::new().desc("created_at")).await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Announcement> {
        self.announcements.get(id).await
    }

    pub async fn create(&self, announcement: &NewAnnouncement) -> ServiceResult<Announcement> {
        require(&announcement.title, "Title")?;
        require(&announcement.content, "Content")?;
        self.announcements.insert(announcement).await
    }

    pub async fn update(&self, id: &str, update: &AnnouncementUpdate) -> ServiceResult<Announcement> {
        if let Some(ref title) = update.title {
            require(title, "Title")?;
        }
        if let Some(ref content) = update.content {
            require(content, "Content")?;
        }
        self.announcements.update(id, update).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.announcements.delete(id).await
    }

    pub async fn set_published(&self, id: &str, published: bool) -> ServiceResult<Announcement> {
        self.announcements.set_flag(id, "is_published", published).await
    }

    /// Record that an announcement went out. Delivery itself happens elsewhere.
    pub async fn mark_sent(&self, id: &str) -> ServiceResult<Announcement> {
        let current = self.get(id).await?;
        if !current.can_mark_sent() {
            return Err(ServiceError::Validation(
                "Only published announcements that have not been sent can be marked as sent".to_string(),
            ));
        }
        let patch = json!({ "is_sent": true, "sent_at": Utc::now() });
        let sent: Announcement = self.announcements.update(id, &patch).await?;
        info!(id = id, audience = ?sent.audience(), "Announcement marked as sent");
        Ok(sent)
    }
}
