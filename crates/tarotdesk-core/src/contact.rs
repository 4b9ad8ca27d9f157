//! Public surface: contact inquiries and booking requests.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{Booking, BookingStatus, NewBooking, ReadingType};
use crate::services::{BookingService, ServiceError, ServiceResult};
use crate::utils::{looks_like_email, non_blank};

// ============================================================================
// Contact inquiries
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryType {
    #[default]
    General,
    Reading,
    Membership,
    Other,
}

impl InquiryType {
    pub const ALL: [InquiryType; 4] = [
        InquiryType::General,
        InquiryType::Reading,
        InquiryType::Membership,
        InquiryType::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            InquiryType::General => "General Enquiry",
            InquiryType::Reading => "Reading Question",
            InquiryType::Membership => "Membership Support",
            InquiryType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredContact {
    #[default]
    Email,
    Phone,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInquiry {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub inquiry_type: Option<InquiryType>,
    pub preferred_contact: PreferredContact,
    pub message: String,
}

/// A problem with one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

impl ContactInquiry {
    /// Every problem with the form, in field order. Empty when valid.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }

        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !looks_like_email(&self.email) {
            errors.push(FieldError::new("email", "Please enter a valid email address"));
        }

        let has_phone = self.phone.as_deref().and_then(non_blank).is_some();
        if self.preferred_contact == PreferredContact::Phone && !has_phone {
            errors.push(FieldError::new(
                "phone",
                "Phone number is required when phone is the preferred contact method",
            ));
        }

        if self.message.trim().is_empty() {
            errors.push(FieldError::new("message", "Message is required"));
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Booking calendar
// ============================================================================

/// Bookings must be made at least this far ahead.
pub const MIN_NOTICE_HOURS: i64 = 24;

/// Daily slots (hour, open), in GMT. 12:00 and 16:00 are held back.
const DAILY_SLOTS: [(u32, bool); 8] = [
    (10, true),
    (11, true),
    (12, false),
    (14, true),
    (15, true),
    (16, false),
    (17, true),
    (18, true),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub time: NaiveTime,
    pub available: bool,
}

impl TimeSlot {
    /// "02:00 PM"
    pub fn label(&self) -> String {
        self.time.format("%I:%M %p").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub available: bool,
}

/// A member's request for a reading at a calendar slot.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub member_id: String,
    pub reading_type: ReadingType,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub customer_questions: Option<String>,
    pub special_requests: Option<String>,
}

/// Slot availability relative to a fixed "now".
#[derive(Debug, Clone, Copy)]
pub struct BookingCalendar {
    now: DateTime<Utc>,
}

impl BookingCalendar {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    fn slot_start(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_time(time))
    }

    fn has_notice(&self, start: DateTime<Utc>) -> bool {
        start >= self.now + Duration::hours(MIN_NOTICE_HOURS)
    }

    /// The day's slots with availability for this date
    pub fn slots_for(&self, date: NaiveDate) -> Vec<TimeSlot> {
        let weekend = Self::is_weekend(date);
        DAILY_SLOTS
            .iter()
            .filter_map(|&(hour, open)| {
                let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
                let available = open && !weekend && self.has_notice(Self::slot_start(date, time));
                Some(TimeSlot { time, available })
            })
            .collect()
    }

    pub fn is_day_available(&self, date: NaiveDate) -> bool {
        self.slots_for(date).iter().any(|s| s.available)
    }

    /// The next `count` days starting today
    pub fn days(&self, count: usize) -> Vec<CalendarDay> {
        let today = self.now.date_naive();
        today
            .iter_days()
            .take(count)
            .map(|date| CalendarDay {
                date,
                available: self.is_day_available(date),
            })
            .collect()
    }

    pub fn is_slot_available(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.slots_for(date)
            .iter()
            .any(|s| s.time == time && s.available)
    }

    /// Create a pending booking for an open slot.
    pub async fn request(&self, bookings: &BookingService, request: &BookingRequest) -> ServiceResult<Booking> {
        if !self.is_slot_available(request.date, request.time) {
            return Err(ServiceError::Validation(format!(
                "{} at {} GMT is not available. Weekends are unavailable and bookings need {} hours notice.",
                request.date.format("%a %b %d"),
                request.time.format("%H:%M"),
                MIN_NOTICE_HOURS
            )));
        }

        let booking = NewBooking {
            member_id: request.member_id.clone(),
            reading_type: request.reading_type,
            booking_date: Self::slot_start(request.date, request.time),
            status: BookingStatus::Pending,
            customer_questions: request.customer_questions.as_deref().and_then(non_blank),
            special_requests: request.special_requests.as_deref().and_then(non_blank),
            payment_amount: Some(request.reading_type.list_price()),
        };
        let created = bookings.create(&booking).await?;
        info!(booking_id = %created.id, date = %created.booking_date, "Booking requested");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use std::sync::Arc;

    fn inquiry() -> ContactInquiry {
        ContactInquiry {
            name: "Iris Vale".to_string(),
            email: "iris@example.com".to_string(),
            phone: None,
            inquiry_type: Some(InquiryType::Reading),
            preferred_contact: PreferredContact::Email,
            message: "Do you read for couples?".to_string(),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn test_valid_inquiry() {
        assert!(inquiry().is_valid());
    }

    #[test]
    fn test_required_fields() {
        let empty = ContactInquiry::default();
        assert_eq!(fields(&empty.validate()), vec!["name", "email", "message"]);
    }

    #[test]
    fn test_email_shape_and_phone_preference() {
        let mut bad = inquiry();
        bad.email = "iris@example".to_string();
        bad.preferred_contact = PreferredContact::Phone;
        let errors = bad.validate();
        assert_eq!(fields(&errors), vec!["email", "phone"]);
        assert_eq!(errors[0].message, "Please enter a valid email address");

        bad.email = "iris@example.com".to_string();
        bad.phone = Some("+44 20 7946 0000".to_string());
        assert!(bad.is_valid());
    }

    // Wednesday 2026-01-07 09:00 GMT
    fn calendar() -> BookingCalendar {
        BookingCalendar::new(Utc.with_ymd_and_hms(2026, 1, 7, 9, 0, 0).unwrap())
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn hour(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_fixed_slots() {
        let slots = calendar().slots_for(date(12));
        assert_eq!(slots.len(), 8);
        let open: Vec<String> = slots.iter().filter(|s| s.available).map(|s| s.label()).collect();
        assert_eq!(open, vec!["10:00 AM", "11:00 AM", "02:00 PM", "03:00 PM", "05:00 PM", "06:00 PM"]);
    }

    #[test]
    fn test_notice_and_weekends() {
        let cal = calendar();
        // Same day: inside the notice window
        assert!(!cal.is_day_available(date(7)));
        // Next day: 10:00 is 25h away, fine
        assert!(cal.is_slot_available(date(8), hour(10)));
        // Saturday and Sunday
        assert!(!cal.is_day_available(date(10)));
        assert!(!cal.is_day_available(date(11)));

        let days = cal.days(7);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, date(7));
        let open: Vec<u32> = days.iter().filter(|d| d.available).map(|d| d.date.day()).collect();
        assert_eq!(open, vec![8, 9, 12, 13]);
    }

    #[test]
    fn test_notice_boundary() {
        // 10:00 tomorrow is exactly 24h away at 10:00 today
        let cal = BookingCalendar::new(Utc.with_ymd_and_hms(2026, 1, 7, 10, 0, 0).unwrap());
        assert!(cal.is_slot_available(date(8), hour(10)));
        let later = BookingCalendar::new(Utc.with_ymd_and_hms(2026, 1, 7, 10, 1, 0).unwrap());
        assert!(!later.is_slot_available(date(8), hour(10)));
    }

    #[tokio::test]
    async fn test_request_creates_pending_booking() {
        let bookings = BookingService::new(Arc::new(MemoryBackend::new()));
        let request = BookingRequest {
            member_id: "m1".to_string(),
            reading_type: ReadingType::LoveRelationships,
            date: date(8),
            time: hour(14),
            customer_questions: Some("  ".to_string()),
            special_requests: None,
        };

        let booking = calendar().request(&bookings, &request).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.booking_date, Utc.with_ymd_and_hms(2026, 1, 8, 14, 0, 0).unwrap());
        assert_eq!(booking.payment_amount, Some(ReadingType::LoveRelationships.list_price()));
        assert_eq!(booking.customer_questions, None);

        let held = BookingRequest { time: hour(12), ..request.clone() };
        assert!(calendar().request(&bookings, &held).await.unwrap_err().is_validation());
        let weekend = BookingRequest { date: date(10), ..request };
        assert!(calendar().request(&bookings, &weekend).await.is_err());
    }
}
