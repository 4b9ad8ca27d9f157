use std::sync::Arc;

use super::{ServiceError, ServiceResult, Table};
use crate::api::{Backend, Query};
use crate::models::{
    Booking, BookingFilter, BookingStatus, BookingSummary, BookingUpdate, Member, NewBooking,
    ReadingHistory,
};

pub const BOOKINGS_TABLE: &str = "bookings";
pub const READING_HISTORY_TABLE: &str = "reading_history";

#[derive(Clone)]
pub struct BookingService {
    bookings: Table,
    history: Table,
}

impl BookingService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            bookings: Table::new(backend.clone(), BOOKINGS_TABLE, "Booking"),
            history: Table::new(backend, READING_HISTORY_TABLE, "Reading"),
        }
    }

    /// All bookings, latest booking date first
    pub async fn list(&self) -> ServiceResult<Vec<Booking>> {
        self.bookings.list(&Query::new().desc("booking_date")).await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Booking> {
        self.bookings.get(id).await
    }

    pub async fn create(&self, booking: &NewBooking) -> ServiceResult<Booking> {
        if booking.member_id.trim().is_empty() {
            return Err(ServiceError::Validation("Please select a member".to_string()));
        }
        self.bookings.insert(booking).await
    }

    pub async fn update(&self, id: &str, update: &BookingUpdate) -> ServiceResult<Booking> {
        self.bookings.update(id, update).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.bookings.delete(id).await
    }

    pub async fn set_status(&self, id: &str, status: BookingStatus) -> ServiceResult<Booking> {
        let update = BookingUpdate {
            status: Some(status),
            ..Default::default()
        };
        self.bookings.update(id, &update).await
    }

    /// Past readings for one member, most recent first
    pub async fn reading_history(&self, member_id: &str) -> ServiceResult<Vec<ReadingHistory>> {
        self.history
            .list(&Query::new().eq("member_id", member_id).desc("reading_date"))
            .await
    }

    pub async fn summary(&self) -> ServiceResult<BookingSummary> {
        Ok(BookingSummary::from_bookings(&self.list().await?))
    }

    pub async fn search(&self, filter: &BookingFilter, members: &[Member]) -> ServiceResult<Vec<Booking>> {
        let bookings = self.list().await?;
        Ok(filter.apply(&bookings, members).into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::models::{MembershipTier, ReadingType};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn new_booking(member_id: &str, rt: ReadingType, status: BookingStatus, days: i64) -> NewBooking {
        NewBooking {
            member_id: member_id.to_string(),
            reading_type: rt,
            booking_date: Utc::now() + Duration::days(days),
            status,
            customer_questions: Some("Will the move go well?".to_string()),
            special_requests: None,
            payment_amount: Some(rt.list_price()),
        }
    }

    fn member(id: &str, name: &str, tier: MembershipTier) -> Member {
        Member {
            id: id.to_string(),
            full_name: name.to_string(),
            email: format!("{}@example.com", id),
            membership_tier: tier,
            membership_start_date: None,
            membership_end_date: None,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_list_newest_first_and_summary() {
        let bookings = BookingService::new(Arc::new(MemoryBackend::new()));
        bookings
            .create(&new_booking("m1", ReadingType::Express, BookingStatus::Completed, -10))
            .await
            .unwrap();
        bookings
            .create(&new_booking("m1", ReadingType::InDepth, BookingStatus::Pending, 5))
            .await
            .unwrap();
        bookings
            .create(&new_booking("m2", ReadingType::General, BookingStatus::Completed, -2))
            .await
            .unwrap();

        let all = bookings.list().await.unwrap();
        assert_eq!(all[0].reading_type, ReadingType::InDepth);
        assert_eq!(all[2].reading_type, ReadingType::Express);

        let summary = bookings.summary().await.unwrap();
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.upcoming, 1);
        assert_eq!(summary.revenue, dec!(85));
    }

    #[tokio::test]
    async fn test_set_status_keeps_other_fields() {
        let bookings = BookingService::new(Arc::new(MemoryBackend::new()));
        let created = bookings
            .create(&new_booking("m1", ReadingType::LoveRelationships, BookingStatus::Pending, 3))
            .await
            .unwrap();

        let confirmed = bookings.set_status(&created.id, BookingStatus::Confirmed).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(confirmed.customer_questions, created.customer_questions);
        assert_eq!(confirmed.payment_amount, Some(dec!(75)));
    }

    #[tokio::test]
    async fn test_search_intersects_filters() {
        let bookings = BookingService::new(Arc::new(MemoryBackend::new()));
        let members = vec![
            member("m1", "Luna Grey", MembershipTier::Vip),
            member("m2", "Iris Vale", MembershipTier::CircleMember),
        ];
        bookings.create(&new_booking("m1", ReadingType::Express, BookingStatus::Pending, 2)).await.unwrap();
        bookings.create(&new_booking("m2", ReadingType::Express, BookingStatus::Pending, 3)).await.unwrap();
        bookings.create(&new_booking("m1", ReadingType::General, BookingStatus::Cancelled, 4)).await.unwrap();

        let filter = BookingFilter {
            status: Some(BookingStatus::Pending),
            tier: Some(MembershipTier::Vip),
            search: "express".to_string(),
        };
        let found = bookings.search(&filter, &members).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].member_id, "m1");
    }

    #[tokio::test]
    async fn test_reading_history_for_member() {
        let backend = Arc::new(MemoryBackend::new());
        for (member, date) in [("m1", "2026-01-05T10:00:00Z"), ("m1", "2026-02-05T10:00:00Z"), ("m2", "2026-03-01T10:00:00Z")] {
            backend
                .insert(
                    READING_HISTORY_TABLE,
                    json!({"member_id": member, "reading_type": "general", "reading_date": date}),
                )
                .await
                .unwrap();
        }
        let bookings = BookingService::new(backend);

        let history = bookings.reading_history("m1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].reading_date > history[1].reading_date);
    }

    #[tokio::test]
    async fn test_create_requires_member() {
        let bookings = BookingService::new(Arc::new(MemoryBackend::new()));
        let err = bookings
            .create(&new_booking("", ReadingType::Express, BookingStatus::Pending, 2))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
