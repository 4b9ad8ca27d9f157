use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::error::require;
use super::{ServiceResult, Table};
use crate::api::{Backend, Query};
use crate::models::{NewWeeklyMessage, WeeklyMessage, WeeklyMessageUpdate};

pub const WEEKLY_MESSAGES_TABLE: &str = "weekly_messages";

#[derive(Clone)]
pub struct WeeklyMessageService {
    messages: Table,
}

impl WeeklyMessageService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            messages: Table::new(backend, WEEKLY_MESSAGES_TABLE, "Message"),
        }
    }

    /// All messages, latest publish date first
    pub async fn list(&self) -> ServiceResult<Vec<WeeklyMessage>> {
        self.messages.list(&Query::new().desc("published_date")).await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<WeeklyMessage> {
        self.messages.get(id).await
    }

    pub async fn current(&self) -> ServiceResult<Option<WeeklyMessage>> {
        self.messages
            .find(&Query::new().eq("is_current", true).desc("published_date"))
            .await
    }

    async fn clear_current(&self) -> ServiceResult<()> {
        let current: Vec<WeeklyMessage> = self.messages.list(&Query::new().eq("is_current", true)).await?;
        for message in current {
            let _: WeeklyMessage = self.messages.set_flag(&message.id, "is_current", false).await?;
        }
        Ok(())
    }

    pub async fn create(&self, message: &NewWeeklyMessage) -> ServiceResult<WeeklyMessage> {
        require(&message.title, "Title")?;
        require(&message.message_content, "Message")?;
        if message.is_current {
            self.clear_current().await?;
        }
        self.messages.insert(message).await
    }

    pub async fn update(&self, id: &str, update: &WeeklyMessageUpdate) -> ServiceResult<WeeklyMessage> {
        if let Some(ref title) = update.title {
            require(title, "Title")?;
        }
        if let Some(ref content) = update.message_content {
            require(content, "Message")?;
        }
        if update.is_current == Some(true) {
            self.get(id).await?;
            self.clear_current().await?;
        }
        self.messages.update(id, update).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.messages.delete(id).await
    }

    /// Make one message current and every other message not current.
    pub async fn set_current(&self, id: &str) -> ServiceResult<WeeklyMessage> {
        // Fail before clearing anything if the id is unknown
        self.get(id).await?;
        self.clear_current().await?;
        let message: WeeklyMessage = self.messages.update(id, &json!({ "is_current": true })).await?;
        info!(id = id, title = %message.title, "Set current weekly message");
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use chrono::NaiveDate;

    fn new_message(title: &str, day: u32, current: bool) -> NewWeeklyMessage {
        NewWeeklyMessage {
            title: title.to_string(),
            message_content: "Trust the slow unfolding.".to_string(),
            published_date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap_or_default(),
            is_current: current,
        }
    }

    #[tokio::test]
    async fn test_set_current_is_exclusive() {
        let service = WeeklyMessageService::new(Arc::new(MemoryBackend::new()));
        let first = service.create(&new_message("Week 1", 5, true)).await.unwrap();
        let second = service.create(&new_message("Week 2", 12, false)).await.unwrap();

        service.set_current(&second.id).await.unwrap();

        let all = service.list().await.unwrap();
        assert_eq!(all.iter().filter(|m| m.is_current).count(), 1);
        assert_eq!(service.current().await.unwrap().map(|m| m.id), Some(second.id.clone()));
        assert!(!service.get(&first.id).await.unwrap().is_current);
    }

    #[tokio::test]
    async fn test_create_current_replaces_previous() {
        let service = WeeklyMessageService::new(Arc::new(MemoryBackend::new()));
        service.create(&new_message("Week 1", 5, true)).await.unwrap();
        let newer = service.create(&new_message("Week 2", 12, true)).await.unwrap();

        let current: Vec<_> = service.list().await.unwrap().into_iter().filter(|m| m.is_current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].id, newer.id);
    }

    #[tokio::test]
    async fn test_set_current_unknown_id_keeps_current() {
        let service = WeeklyMessageService::new(Arc::new(MemoryBackend::new()));
        let first = service.create(&new_message("Week 1", 5, true)).await.unwrap();

        assert!(service.set_current("missing").await.unwrap_err().is_not_found());
        assert_eq!(service.current().await.unwrap().map(|m| m.id), Some(first.id));
    }

    #[tokio::test]
    async fn test_list_latest_first() {
        let service = WeeklyMessageService::new(Arc::new(MemoryBackend::new()));
        service.create(&new_message("Week 1", 5, false)).await.unwrap();
        service.create(&new_message("Week 3", 19, false)).await.unwrap();
        service.create(&new_message("Week 2", 12, false)).await.unwrap();

        let titles: Vec<_> = service.list().await.unwrap().into_iter().map(|m| m.title).collect();
        assert_eq!(titles, vec!["Week 3", "Week 2", "Week 1"]);
    }
}
