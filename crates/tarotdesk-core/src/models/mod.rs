//! Data models for the practice's backend tables.
//!
//! Every entity has three shapes:
//!
//! - the row as stored (`Member`, `Booking`, ...)
//! - an insert shape (`NewMember`, ...)
//! - a patch shape (`MemberUpdate`, ...) whose unset fields are left out of the payload
//!
//! Entity groups:
//!
//! - `course`: `CourseModule`, `CourseLesson`
//! - `member`: `Member`, tiers, stats and list filters
//! - `booking`: `Booking`, `ReadingHistory`, reading types and statuses
//! - `announcement`, `content` (meditations and resources), `reading` (digital
//!   readings), `message` (weekly messages), `product` (reading products)

pub mod announcement;
pub mod booking;
pub mod content;
pub mod course;
pub mod member;
pub mod message;
pub mod product;
pub mod reading;

pub use announcement::{Announcement, AnnouncementUpdate, DeliveryMethod, NewAnnouncement, TargetTier};
pub use booking::{
    Booking, BookingFilter, BookingStatus, BookingSummary, BookingUpdate, NewBooking, ReadingHistory,
    ReadingType,
};
pub use content::{
    Meditation, MeditationCategory, MeditationUpdate, NewMeditation, NewResource, Resource,
    ResourceCategory, ResourceUpdate,
};
pub use course::{
    CourseLesson, CourseLessonUpdate, CourseModule, CourseModuleUpdate, ModuleWithLessons,
    NewCourseLesson, NewCourseModule, MAX_MODULE_NUMBER, MIN_MODULE_NUMBER,
};
pub use member::{Member, MemberFilter, MemberStats, MemberUpdate, MembershipTier, NewMember, StatusFilter};
pub use message::{NewWeeklyMessage, WeeklyMessage, WeeklyMessageUpdate};
pub use product::{NewReadingProduct, ProductCategory, ReadingProduct, ReadingProductUpdate};
pub use reading::{CardNumber, DigitalReading, DigitalReadingUpdate, NewDigitalReading, ReadingCategory};
