use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::member::{Member, MembershipTier};
use crate::utils::contains_ignore_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingType {
    Express,
    General,
    LoveRelationships,
    MoneyCareer,
    InDepth,
    LivePhone,
}

impl ReadingType {
    pub const ALL: [ReadingType; 6] = [
        ReadingType::Express,
        ReadingType::General,
        ReadingType::LoveRelationships,
        ReadingType::MoneyCareer,
        ReadingType::InDepth,
        ReadingType::LivePhone,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReadingType::Express => "Express Reading",
            ReadingType::General => "General Reading",
            ReadingType::LoveRelationships => "Love & Relationships",
            ReadingType::MoneyCareer => "Money & Career",
            ReadingType::InDepth => "Full In-Depth Reading",
            ReadingType::LivePhone => "Live Phone Reading",
        }
    }

    /// List price in whole dollars.
    pub fn list_price(&self) -> Decimal {
        let dollars: i64 = match self {
            ReadingType::Express => 35,
            ReadingType::General => 50,
            ReadingType::LoveRelationships | ReadingType::MoneyCareer => 75,
            ReadingType::InDepth => 125,
            ReadingType::LivePhone => 150,
        };
        Decimal::from(dollars)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingType::Express => "express",
            ReadingType::General => "general",
            ReadingType::LoveRelationships => "love_relationships",
            ReadingType::MoneyCareer => "money_career",
            ReadingType::InDepth => "in_depth",
            ReadingType::LivePhone => "live_phone",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s) || t.label().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for ReadingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|st| st.as_str().eq_ignore_ascii_case(s))
    }

    /// Pending and confirmed bookings still lie ahead.
    pub fn is_upcoming(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "Pending"),
            BookingStatus::Confirmed => write!(f, "Confirmed"),
            BookingStatus::Completed => write!(f, "Completed"),
            BookingStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub member_id: String,
    pub reading_type: ReadingType,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
    #[serde(default)]
    pub customer_questions: Option<String>,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub payment_amount: Option<Decimal>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn formatted_date(&self) -> String {
        self.booking_date.format("%b %d, %Y %H:%M").to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBooking {
    pub member_id: String,
    pub reading_type: ReadingType,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub customer_questions: Option<String>,
    pub special_requests: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub payment_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_type: Option<ReadingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_questions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option",
        default
    )]
    pub payment_amount: Option<Decimal>,
}

/// A past reading delivered to a member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingHistory {
    pub id: String,
    pub member_id: String,
    #[serde(default)]
    pub booking_id: Option<String>,
    pub reading_type: ReadingType,
    pub reading_date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Booking list filter. A booking is shown only if every active predicate matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub tier: Option<MembershipTier>,
    pub search: String,
}

impl BookingFilter {
    /// `member` is the booking's member if it is known to the caller.
    pub fn matches(&self, booking: &Booking, member: Option<&Member>) -> bool {
        let status_match = self.status.map_or(true, |s| booking.status == s);
        let tier_match = match self.tier {
            None => true,
            Some(t) => member.is_some_and(|m| m.membership_tier == t),
        };
        let query = self.search.trim();
        let search_match = query.is_empty()
            || member.is_some_and(|m| contains_ignore_case(&m.full_name, query))
            || contains_ignore_case(booking.reading_type.label(), query);
        status_match && tier_match && search_match
    }

    pub fn apply<'a>(&self, bookings: &'a [Booking], members: &[Member]) -> Vec<&'a Booking> {
        bookings
            .iter()
            .filter(|b| {
                let member = members.iter().find(|m| m.id == b.member_id);
                self.matches(b, member)
            })
            .collect()
    }

    /// Cycle the status predicate: all → pending → confirmed → completed → cancelled → all.
    pub fn cycle_status(&mut self) {
        self.status = match self.status {
            None => Some(BookingStatus::Pending),
            Some(BookingStatus::Pending) => Some(BookingStatus::Confirmed),
            Some(BookingStatus::Confirmed) => Some(BookingStatus::Completed),
            Some(BookingStatus::Completed) => Some(BookingStatus::Cancelled),
            Some(BookingStatus::Cancelled) => None,
        };
    }
}

/// Headline numbers for the bookings screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingSummary {
    pub completed: usize,
    pub upcoming: usize,
    pub revenue: Decimal,
}

impl BookingSummary {
    /// Revenue counts completed bookings only.
    pub fn from_bookings(bookings: &[Booking]) -> Self {
        let completed: Vec<&Booking> = bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .collect();
        Self {
            completed: completed.len(),
            upcoming: bookings.iter().filter(|b| b.status.is_upcoming()).count(),
            revenue: completed.iter().filter_map(|b| b.payment_amount).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

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

    fn booking(id: &str, member_id: &str, rt: ReadingType, status: BookingStatus, paid: Option<Decimal>) -> Booking {
        Booking {
            id: id.to_string(),
            member_id: member_id.to_string(),
            reading_type: rt,
            booking_date: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
            status,
            customer_questions: None,
            special_requests: None,
            payment_amount: paid,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_reading_type_prices() {
        assert_eq!(ReadingType::Express.list_price(), dec!(35));
        assert_eq!(ReadingType::General.list_price(), dec!(50));
        assert_eq!(ReadingType::MoneyCareer.list_price(), dec!(75));
        assert_eq!(ReadingType::InDepth.list_price(), dec!(125));
        assert_eq!(ReadingType::LivePhone.list_price(), dec!(150));
    }

    #[test]
    fn test_reading_type_parse() {
        assert_eq!(ReadingType::parse("in_depth"), Some(ReadingType::InDepth));
        assert_eq!(ReadingType::parse("love & relationships"), Some(ReadingType::LoveRelationships));
        assert_eq!(ReadingType::parse("palmistry"), None);
    }

    #[test]
    fn test_booking_parses_numeric_payment() {
        let b: Booking = serde_json::from_value(serde_json::json!({
            "id": "b1",
            "member_id": "m1",
            "reading_type": "love_relationships",
            "booking_date": "2026-03-01T10:00:00+00:00",
            "status": "confirmed",
            "payment_amount": 75.5
        }))
        .unwrap();
        assert_eq!(b.payment_amount, Some(dec!(75.5)));
        assert_eq!(b.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_filter_intersection() {
        let members = vec![
            member("m1", "Luna Grey", MembershipTier::Vip),
            member("m2", "Iris Vale", MembershipTier::CircleMember),
        ];
        let bookings = vec![
            booking("b1", "m1", ReadingType::General, BookingStatus::Pending, None),
            booking("b2", "m1", ReadingType::InDepth, BookingStatus::Completed, Some(dec!(125))),
            booking("b3", "m2", ReadingType::General, BookingStatus::Pending, None),
        ];

        let f = BookingFilter { status: Some(BookingStatus::Pending), ..Default::default() };
        assert_eq!(f.apply(&bookings, &members).len(), 2);

        let f = BookingFilter {
            status: Some(BookingStatus::Pending),
            tier: Some(MembershipTier::Vip),
            ..Default::default()
        };
        let ids: Vec<_> = f.apply(&bookings, &members).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b1"]);

        let f = BookingFilter { search: "in-depth".to_string(), ..Default::default() };
        let ids: Vec<_> = f.apply(&bookings, &members).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b2"]);

        let f = BookingFilter { search: "iris".to_string(), ..Default::default() };
        let ids: Vec<_> = f.apply(&bookings, &members).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b3"]);
    }

    #[test]
    fn test_tier_filter_excludes_unknown_member() {
        let b = booking("b1", "ghost", ReadingType::General, BookingStatus::Pending, None);
        let f = BookingFilter { tier: Some(MembershipTier::Vip), ..Default::default() };
        assert!(!f.matches(&b, None));
    }

    #[test]
    fn test_summary() {
        let bookings = vec![
            booking("b1", "m1", ReadingType::General, BookingStatus::Pending, None),
            booking("b2", "m1", ReadingType::InDepth, BookingStatus::Completed, Some(dec!(125))),
            booking("b3", "m2", ReadingType::Express, BookingStatus::Completed, Some(dec!(35))),
            booking("b4", "m2", ReadingType::Express, BookingStatus::Confirmed, Some(dec!(35))),
            booking("b5", "m2", ReadingType::Express, BookingStatus::Cancelled, Some(dec!(35))),
        ];
        let s = BookingSummary::from_bookings(&bookings);
        assert_eq!(s.completed, 2);
        assert_eq!(s.upcoming, 2);
        assert_eq!(s.revenue, dec!(160));
    }
}
