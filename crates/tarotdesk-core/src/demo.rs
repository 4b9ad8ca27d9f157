//! Sample data for running without a hosted backend.
//!
//! `seed` fills a fresh backend (normally a `MemoryBackend`) through the
//! regular services, so everything it writes passes the same validation as
//! admin edits.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use crate::api::MemoryBackend;
use crate::models::{
    BookingStatus, CardNumber, DeliveryMethod, MeditationCategory, MembershipTier, NewAnnouncement,
    NewBooking, NewCourseLesson, NewCourseModule, NewDigitalReading, NewMeditation, NewMember,
    NewReadingProduct, NewResource, NewWeeklyMessage, ProductCategory, ReadingCategory, ReadingType,
    ResourceCategory, TargetTier,
};
use crate::services::booking::READING_HISTORY_TABLE;
use crate::services::{ServiceResult, Services};

pub const DEMO_EMAIL: &str = "admin@tarotdesk.local";
pub const DEMO_PASSWORD: &str = "demo";

/// An in-memory backend with the production constraints and a demo admin.
pub fn backend() -> MemoryBackend {
    MemoryBackend::with_schema().with_user(DEMO_EMAIL, DEMO_PASSWORD)
}

const MODULES: [(&str, &str); 3] = [
    ("Foundations", "The deck, the suits and how a reading is built."),
    ("The Major Arcana", "The Fool's journey through all twenty-two cards."),
    ("Spreads in Practice", "Three-card, Celtic Cross and reading for others."),
];

const LESSONS: [(i32, &str, Option<&str>); 5] = [
    (1, "Meeting your deck", Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")),
    (1, "Cleansing and care", None),
    (2, "The Fool to the Chariot", Some("https://vimeo.com/76979871")),
    (2, "Strength to the World", Some("https://youtu.be/9bZkp7q19f0")),
    (3, "The three-card spread", None),
];

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn text(s: &str) -> Option<String> {
    Some(s.to_string())
}

/// Populate every table with a small, consistent data set.
pub async fn seed(services: &Services) -> ServiceResult<()> {
    // Course
    for (i, (title, description)) in MODULES.iter().enumerate() {
        let number = i as i32 + 1;
        let module = services
            .courses
            .create_module(&NewCourseModule {
                module_number: number,
                title: title.to_string(),
                description: text(description),
                order_position: number,
                is_published: number < 3,
            })
            .await?;

        for (n, (_, title, video)) in LESSONS.iter().filter(|l| l.0 == number).enumerate() {
            let lesson_number = n as i32 + 1;
            services
                .courses
                .create_lesson(&NewCourseLesson {
                    module_id: module.id.clone(),
                    lesson_number,
                    title: title.to_string(),
                    description: None,
                    content: text("Sit with the cards before reading the notes."),
                    video_url: video.map(str::to_string),
                    duration_minutes: Some(15 + 5 * lesson_number),
                    order_position: lesson_number,
                    is_published: true,
                    resource_url: None,
                    resource_title: None,
                })
                .await?;
        }
    }

    // Members
    let people = [
        ("Iris Vale", "iris@example.com", MembershipTier::Vip, true),
        ("Owen Marsh", "owen@example.com", MembershipTier::CircleMember, true),
        ("Nadia Reyes", "nadia@example.com", MembershipTier::CircleMember, false),
    ];
    let mut members = Vec::new();
    for (name, email, tier, active) in people {
        let member = services
            .members
            .create(&NewMember {
                full_name: name.to_string(),
                email: email.to_string(),
                membership_tier: tier,
                membership_start_date: date(2026, 1, 15),
                membership_end_date: if active { None } else { date(2026, 6, 30) },
                is_active: active,
            })
            .await?;
        members.push(member);
    }

    // Bookings and history
    let now = Utc::now();
    let bookings = [
        (0, ReadingType::InDepth, now - Duration::days(20), BookingStatus::Completed),
        (1, ReadingType::LoveRelationships, now - Duration::days(6), BookingStatus::Completed),
        (1, ReadingType::Express, now + Duration::days(3), BookingStatus::Confirmed),
        (0, ReadingType::LivePhone, now + Duration::days(9), BookingStatus::Pending),
        (2, ReadingType::General, now - Duration::days(40), BookingStatus::Cancelled),
    ];
    for (who, reading_type, when, status) in bookings {
        let member = &members[who];
        let booking = services
            .bookings
            .create(&NewBooking {
                member_id: member.id.clone(),
                reading_type,
                booking_date: when,
                status,
                customer_questions: text("What should I focus on this season?"),
                special_requests: None,
                payment_amount: Some(reading_type.list_price()),
            })
            .await?;
        if status == BookingStatus::Completed {
            services
                .backend()
                .insert(
                    READING_HISTORY_TABLE,
                    json!({
                        "member_id": member.id,
                        "booking_id": booking.id,
                        "reading_type": reading_type,
                        "reading_date": when,
                        "notes": "Recording sent by email.",
                    }),
                )
                .await?;
        }
    }

    // Announcements
    services
        .announcements
        .create(&NewAnnouncement {
            title: "New moon circle".to_string(),
            content: "Join us on the next new moon for a group reading.".to_string(),
            delivery_method: DeliveryMethod::Both,
            target_tier: TargetTier::All,
            is_published: true,
        })
        .await?;
    services
        .announcements
        .create(&NewAnnouncement {
            title: "VIP reading week".to_string(),
            content: "Priority slots open for VIP members.".to_string(),
            delivery_method: DeliveryMethod::Email,
            target_tier: TargetTier::Vip,
            is_published: false,
        })
        .await?;

    // Meditations and resources
    let meditations = [
        ("Grounding breath", MeditationCategory::Relaxation, 10, true),
        ("Opening intuition", MeditationCategory::Intuition, 18, false),
        ("Evening release", MeditationCategory::Sleep, 25, false),
    ];
    for (title, category, minutes, featured) in meditations {
        services
            .meditations
            .create(&NewMeditation {
                title: title.to_string(),
                description: None,
                audio_url: format!("https://cdn.tarotdesk.local/audio/{}.mp3", title.to_lowercase().replace(' ', "-")),
                duration_minutes: Some(minutes),
                category,
                is_featured: featured,
                is_published: true,
            })
            .await?;
    }
    let resources = [
        ("Daily draw journal", ResourceCategory::Journals, 1_250_000),
        ("Card meanings guide", ResourceCategory::Reference, 3_400_000),
    ];
    for (title, category, size) in resources {
        services
            .resources
            .create(&NewResource {
                title: title.to_string(),
                description: None,
                file_url: format!("https://cdn.tarotdesk.local/files/{}.pdf", title.to_lowercase().replace(' ', "-")),
                file_size: Some(size),
                category,
                is_featured: category == ResourceCategory::Journals,
                is_published: true,
            })
            .await?;
    }

    // Digital readings: a handful of cards, the rest show "coming soon"
    let cards = [
        (ReadingCategory::General, 0, "https://www.youtube.com/watch?v=aqz-KE-bpKQ"),
        (ReadingCategory::General, 17, "https://youtu.be/ScMzIvxBSi4"),
        (ReadingCategory::LoveRelationships, 6, "https://vimeo.com/148751763"),
    ];
    for (category, number, video) in cards {
        if let Some(card_number) = CardNumber::new(number) {
            services
                .readings
                .create(&NewDigitalReading {
                    category,
                    card_number,
                    card_name: card_number.arcana_name().to_string(),
                    card_meaning: None,
                    video_url: video.to_string(),
                })
                .await?;
        }
    }

    // Weekly messages
    let today = now.date_naive();
    services
        .messages
        .create(&NewWeeklyMessage {
            title: "Patience".to_string(),
            message_content: "The Hermit asks you to slow down this week.".to_string(),
            published_date: today - Duration::days(7),
            is_current: false,
        })
        .await?;
    services
        .messages
        .create(&NewWeeklyMessage {
            title: "Momentum".to_string(),
            message_content: "The Chariot brings forward motion. Steer it.".to_string(),
            published_date: today,
            is_current: true,
        })
        .await?;

    // Products
    let products = [
        ("Express Reading", ProductCategory::Express, 35, false),
        ("Love & Relationships", ProductCategory::Standard, 75, false),
        ("Full In-Depth Reading", ProductCategory::Premium, 125, false),
        ("Live Phone Reading", ProductCategory::Live, 150, true),
    ];
    for (i, (title, category, price, live)) in products.into_iter().enumerate() {
        services
            .products
            .create(&NewReadingProduct {
                title: title.to_string(),
                description: None,
                price: Decimal::from(price),
                image_url: None,
                category,
                delivery_time: if live { None } else { text("24-48 hours") },
                is_live_reading: live,
                calendly_link: if live { text("https://calendly.com/tarotdesk/live") } else { None },
                sort_order: i as i32 + 1,
                is_active: true,
            })
            .await?;
    }

    info!("Seeded demo data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readings::lookup;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_seed_is_consistent() {
        let services = Services::new(Arc::new(backend()));
        seed(&services).await.unwrap();

        let stats = services.dashboard.stats().await.unwrap();
        assert_eq!(stats.modules, 3);
        assert_eq!(stats.lessons, 5);
        assert_eq!(stats.members, 3);
        assert_eq!(stats.active_members, 2);

        let summary = services.bookings.summary().await.unwrap();
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.upcoming, 2);
        assert_eq!(summary.revenue, Decimal::from(125 + 75));

        assert!(services.messages.current().await.unwrap().is_some());

        let readings = services.readings.list().await.unwrap();
        let fool = CardNumber::new(0).unwrap();
        assert!(lookup(&readings, ReadingCategory::General, fool).is_found());
        assert!(!lookup(&readings, ReadingCategory::LoveRelationships, fool).is_found());
    }

    #[tokio::test]
    async fn test_seed_twice_hits_unique_module_number() {
        let services = Services::new(Arc::new(backend()));
        seed(&services).await.unwrap();
        assert!(seed(&services).await.is_err());
    }
}
