//! Per-entity services over the backend.
//!
//! Every service follows the same shape: list, get, create, update, delete,
//! plus the toggles its entity has. Validation happens here, before a
//! request is sent; backend failures pass through as `ServiceError::Backend`
//! with the backend's message intact.

use std::sync::Arc;

use serde_json::Value;

use crate::api::Backend;

pub mod announcement;
pub mod booking;
pub mod course;
pub mod dashboard;
mod error;
pub mod meditation;
pub mod member;
pub mod message;
pub mod product;
pub mod reading;
pub mod resource;
mod table;

pub use announcement::AnnouncementService;
pub use booking::BookingService;
pub use course::{next_available_module_number, CourseService, LessonLocation, LessonRef};
pub use dashboard::{DashboardService, DashboardStats};
pub use error::{ServiceError, ServiceResult};
pub use meditation::MeditationService;
pub use member::MemberService;
pub use message::WeeklyMessageService;
pub use product::ReadingProductService;
pub use reading::{DigitalReadingService, LookupResult};
pub use resource::ResourceService;
pub use table::Table;

/// Every table the application reads or writes.
pub const TABLES: [&str; 11] = [
    course::MODULES_TABLE,
    course::LESSONS_TABLE,
    member::MEMBERS_TABLE,
    booking::BOOKINGS_TABLE,
    booking::READING_HISTORY_TABLE,
    announcement::ANNOUNCEMENTS_TABLE,
    meditation::MEDITATIONS_TABLE,
    resource::RESOURCES_TABLE,
    reading::DIGITAL_READINGS_TABLE,
    message::WEEKLY_MESSAGES_TABLE,
    product::READING_PRODUCTS_TABLE,
];

/// All services over one shared backend.
#[derive(Clone)]
pub struct Services {
    backend: Arc<dyn Backend>,
    pub courses: CourseService,
    pub members: MemberService,
    pub bookings: BookingService,
    pub announcements: AnnouncementService,
    pub meditations: MeditationService,
    pub resources: ResourceService,
    pub readings: DigitalReadingService,
    pub messages: WeeklyMessageService,
    pub products: ReadingProductService,
    pub dashboard: DashboardService,
}

impl Services {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            courses: CourseService::new(backend.clone()),
            members: MemberService::new(backend.clone()),
            bookings: BookingService::new(backend.clone()),
            announcements: AnnouncementService::new(backend.clone()),
            meditations: MeditationService::new(backend.clone()),
            resources: ResourceService::new(backend.clone()),
            readings: DigitalReadingService::new(backend.clone()),
            messages: WeeklyMessageService::new(backend.clone()),
            products: ReadingProductService::new(backend.clone()),
            dashboard: DashboardService::new(backend.clone()),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Raw rows of a known table
    pub async fn dump_table(&self, table: &str) -> ServiceResult<Vec<Value>> {
        let name = TABLES
            .iter()
            .find(|t| **t == table)
            .copied()
            .ok_or_else(|| ServiceError::Validation(format!(
                "Unknown table '{}'. Known tables: {}",
                table,
                TABLES.join(", ")
            )))?;
        Table::new(self.backend.clone(), name, "Table").dump().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use serde_json::json;

    #[tokio::test]
    async fn test_dump_table() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert("members", json!({"full_name": "Ada"})).await.unwrap();
        let services = Services::new(backend);

        let rows = services.dump_table("members").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(services.dump_table("secrets").await.unwrap_err().is_validation());
    }
}
