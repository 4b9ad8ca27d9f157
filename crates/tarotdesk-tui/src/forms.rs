//! Edit forms for every admin entity.
//!
//! A `Form` is a flat list of labelled text fields. Flags and choices are
//! stored as text too (`yes`/`no`, or the choice's code) and are cycled with
//! the space key instead of typed. Converting a form into an insert or patch
//! shape parses every field and reports the first problem as a message.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use tarotdesk_core::models::{
    Announcement, AnnouncementUpdate, Booking, BookingStatus, BookingUpdate, CardNumber, CourseLesson,
    CourseLessonUpdate, CourseModule, CourseModuleUpdate, DeliveryMethod, DigitalReading,
    DigitalReadingUpdate, Meditation, MeditationCategory, MeditationUpdate, Member, MemberUpdate,
    MembershipTier, NewAnnouncement, NewBooking, NewCourseLesson, NewCourseModule, NewDigitalReading,
    NewMeditation, NewMember, NewReadingProduct, NewResource, NewWeeklyMessage, ProductCategory,
    ReadingCategory, ReadingProduct, ReadingProductUpdate, ReadingType, Resource, ResourceCategory,
    ResourceUpdate, TargetTier, WeeklyMessage, WeeklyMessageUpdate,
};
use tarotdesk_core::utils::non_blank;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length of a single field. Lesson bodies are the longest text.
const MAX_FIELD_LENGTH: usize = 4000;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

// ============================================================================
// Form model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Module,
    Lesson,
    Member,
    Booking,
    Announcement,
    Meditation,
    Resource,
    Reading,
    Message,
    Product,
}

impl FormKind {
    pub fn noun(&self) -> &'static str {
        match self {
            FormKind::Module => "Module",
            FormKind::Lesson => "Lesson",
            FormKind::Member => "Member",
            FormKind::Booking => "Booking",
            FormKind::Announcement => "Announcement",
            FormKind::Meditation => "Meditation",
            FormKind::Resource => "Resource",
            FormKind::Reading => "Digital Reading",
            FormKind::Message => "Weekly Message",
            FormKind::Product => "Reading Product",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    /// `yes` or `no`
    Flag,
    /// (code, label) pairs; the field value holds the code
    Choice(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
    pub kind: FieldKind,
    pub hint: Option<&'static str>,
}

impl FormField {
    fn text(key: &'static str, label: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            label,
            value: value.into(),
            kind: FieldKind::Text,
            hint: None,
        }
    }

    fn flag(key: &'static str, label: &'static str, value: bool) -> Self {
        Self {
            key,
            label,
            value: if value { "yes" } else { "no" }.to_string(),
            kind: FieldKind::Flag,
            hint: None,
        }
    }

    fn choice(key: &'static str, label: &'static str, value: &str, options: Vec<(String, String)>) -> Self {
        Self {
            key,
            label,
            value: value.to_string(),
            kind: FieldKind::Choice(options),
            hint: None,
        }
    }

    fn hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Value as shown in the form
    pub fn display(&self) -> String {
        match &self.kind {
            FieldKind::Choice(options) => options
                .iter()
                .find(|(code, _)| *code == self.value)
                .map(|(_, label)| label.clone())
                .unwrap_or_else(|| "(none)".to_string()),
            _ => self.value.clone(),
        }
    }

    pub fn is_editable_text(&self) -> bool {
        self.kind == FieldKind::Text
    }

    /// Flip a flag or move to the next choice. Text fields are unchanged.
    pub fn cycle(&mut self, forward: bool) {
        match &self.kind {
            FieldKind::Text => {}
            FieldKind::Flag => {
                self.value = if self.value == "yes" { "no" } else { "yes" }.to_string();
            }
            FieldKind::Choice(options) => {
                if options.is_empty() {
                    return;
                }
                let pos = options.iter().position(|(code, _)| *code == self.value);
                let next = match (pos, forward) {
                    (None, _) => 0,
                    (Some(i), true) => (i + 1) % options.len(),
                    (Some(i), false) => (i + options.len() - 1) % options.len(),
                };
                self.value = options[next].0.clone();
            }
        }
    }
}

fn options<T: Copy + std::fmt::Display>(all: &[T], code: impl Fn(&T) -> &'static str) -> Vec<(String, String)> {
    all.iter().map(|v| (code(v).to_string(), v.to_string())).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub kind: FormKind,
    /// Record being edited; `None` when creating.
    pub id: Option<String>,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Form {
    fn new(kind: FormKind, id: Option<String>, fields: Vec<FormField>) -> Self {
        Self {
            kind,
            id,
            fields,
            focus: 0,
            error: None,
        }
    }

    pub fn title(&self) -> String {
        match self.id {
            Some(_) => format!("Edit {}", self.kind.noun()),
            None => format!("New {}", self.kind.noun()),
        }
    }

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    pub fn focused_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.focus)
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.focused_mut() {
            if field.is_editable_text() && can_add_field_char(field.value.chars().count(), c) {
                field.value.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.focused_mut() {
            if field.is_editable_text() {
                field.value.pop();
            }
        }
    }

    pub fn cycle_focused(&mut self, forward: bool) {
        if let Some(field) = self.focused_mut() {
            field.cycle(forward);
        }
    }

    // ------------------------------------------------------------------------
    // Field parsing
    // ------------------------------------------------------------------------

    fn field(&self, key: &str) -> Result<&FormField, String> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .ok_or_else(|| format!("Form has no field '{}'", key))
    }

    fn raw(&self, key: &str) -> Result<&str, String> {
        Ok(self.field(key)?.value.trim())
    }

    fn text(&self, key: &str) -> Result<String, String> {
        Ok(self.raw(key)?.to_string())
    }

    fn optional(&self, key: &str) -> Result<Option<String>, String> {
        Ok(non_blank(self.raw(key)?))
    }

    fn flag(&self, key: &str) -> Result<bool, String> {
        Ok(self.raw(key)? == "yes")
    }

    fn int(&self, key: &str) -> Result<i32, String> {
        let field = self.field(key)?;
        field
            .value
            .trim()
            .parse()
            .map_err(|_| format!("{} must be a whole number", field.label))
    }

    fn optional_int<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, String> {
        let field = self.field(key)?;
        match non_blank(&field.value) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| format!("{} must be a whole number", field.label)),
        }
    }

    fn money(&self, key: &str) -> Result<Decimal, String> {
        let field = self.field(key)?;
        field
            .value
            .trim()
            .trim_start_matches('$')
            .parse()
            .map_err(|_| format!("{} must be an amount like 49.99", field.label))
    }

    fn optional_money(&self, key: &str) -> Result<Option<Decimal>, String> {
        if self.raw(key)?.is_empty() {
            return Ok(None);
        }
        self.money(key).map(Some)
    }

    fn date(&self, key: &str) -> Result<NaiveDate, String> {
        let field = self.field(key)?;
        NaiveDate::parse_from_str(field.value.trim(), DATE_FORMAT)
            .map_err(|_| format!("{} must be a date like 2026-03-21", field.label))
    }

    fn optional_date(&self, key: &str) -> Result<Option<NaiveDate>, String> {
        if self.raw(key)?.is_empty() {
            return Ok(None);
        }
        self.date(key).map(Some)
    }

    fn datetime(&self, key: &str) -> Result<DateTime<Utc>, String> {
        let field = self.field(key)?;
        NaiveDateTime::parse_from_str(field.value.trim(), DATETIME_FORMAT)
            .map(|dt| dt.and_utc())
            .map_err(|_| format!("{} must look like 2026-03-21 14:00", field.label))
    }

    fn choice<T>(&self, key: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T, String> {
        let field = self.field(key)?;
        parse(field.value.trim()).ok_or_else(|| format!("Please select a {}", field.label.to_lowercase()))
    }
}

fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_num<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_date(value: Option<NaiveDate>) -> String {
    value.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
}

// ============================================================================
// Course
// ============================================================================

pub fn module_form(existing: Option<&CourseModule>, next_number: i32) -> Form {
    let number = existing.map_or(next_number, |m| m.module_number);
    let fields = vec![
        FormField::text("module_number", "Module number", number.to_string()).hint("1-8"),
        FormField::text("title", "Title", existing.map(|m| m.title.clone()).unwrap_or_default()),
        FormField::text("description", "Description", existing.map(|m| opt(&m.description)).unwrap_or_default()),
        FormField::text(
            "order_position",
            "Order",
            existing.map_or(number, |m| m.order_position).to_string(),
        ),
        FormField::flag("is_published", "Published", existing.is_some_and(|m| m.is_published)),
    ];
    Form::new(FormKind::Module, existing.map(|m| m.id.clone()), fields)
}

pub fn new_module(form: &Form) -> Result<NewCourseModule, String> {
    Ok(NewCourseModule {
        module_number: form.int("module_number")?,
        title: form.text("title")?,
        description: form.optional("description")?,
        order_position: form.int("order_position")?,
        is_published: form.flag("is_published")?,
    })
}

pub fn module_update(form: &Form) -> Result<CourseModuleUpdate, String> {
    let new = new_module(form)?;
    Ok(CourseModuleUpdate {
        module_number: Some(new.module_number),
        title: Some(new.title),
        description: Some(new.description.unwrap_or_default()),
        order_position: Some(new.order_position),
        is_published: Some(new.is_published),
    })
}

/// `modules` populates the module choice; `module_id` preselects one.
pub fn lesson_form(existing: Option<&CourseLesson>, modules: &[CourseModule], module_id: Option<&str>, next_number: i32) -> Form {
    let module_options = modules.iter().map(|m| (m.id.clone(), m.label())).collect();
    let selected = existing
        .map(|l| l.module_id.as_str())
        .or(module_id)
        .unwrap_or_default();
    let number = existing.map_or(next_number, |l| l.lesson_number);
    let fields = vec![
        FormField::choice("module_id", "Module", selected, module_options),
        FormField::text("lesson_number", "Lesson number", number.to_string()),
        FormField::text("title", "Title", existing.map(|l| l.title.clone()).unwrap_or_default()),
        FormField::text("description", "Description", existing.map(|l| opt(&l.description)).unwrap_or_default()),
        FormField::text("content", "Content", existing.map(|l| opt(&l.content)).unwrap_or_default()),
        FormField::text("video_url", "Video URL", existing.map(|l| opt(&l.video_url)).unwrap_or_default())
            .hint("YouTube or Vimeo link"),
        FormField::text(
            "duration_minutes",
            "Duration (min)",
            existing.map(|l| opt_num(l.duration_minutes)).unwrap_or_default(),
        ),
        FormField::text(
            "order_position",
            "Order",
            existing.map_or(number, |l| l.order_position).to_string(),
        ),
        FormField::flag("is_published", "Published", existing.is_some_and(|l| l.is_published)),
        FormField::text("resource_url", "Resource URL", existing.map(|l| opt(&l.resource_url)).unwrap_or_default()),
        FormField::text(
            "resource_title",
            "Resource title",
            existing.map(|l| opt(&l.resource_title)).unwrap_or_default(),
        ),
    ];
    Form::new(FormKind::Lesson, existing.map(|l| l.id.clone()), fields)
}

pub fn new_lesson(form: &Form) -> Result<NewCourseLesson, String> {
    Ok(NewCourseLesson {
        module_id: form.text("module_id")?,
        lesson_number: form.int("lesson_number")?,
        title: form.text("title")?,
        description: form.optional("description")?,
        content: form.optional("content")?,
        video_url: form.optional("video_url")?,
        duration_minutes: form.optional_int("duration_minutes")?,
        order_position: form.int("order_position")?,
        is_published: form.flag("is_published")?,
        resource_url: form.optional("resource_url")?,
        resource_title: form.optional("resource_title")?,
    })
}

pub fn lesson_update(form: &Form) -> Result<CourseLessonUpdate, String> {
    let new = new_lesson(form)?;
    Ok(CourseLessonUpdate {
        module_id: Some(new.module_id),
        lesson_number: Some(new.lesson_number),
        title: Some(new.title),
        description: Some(new.description.unwrap_or_default()),
        content: Some(new.content.unwrap_or_default()),
        video_url: Some(new.video_url.unwrap_or_default()),
        duration_minutes: new.duration_minutes,
        order_position: Some(new.order_position),
        is_published: Some(new.is_published),
        resource_url: Some(new.resource_url.unwrap_or_default()),
        resource_title: Some(new.resource_title.unwrap_or_default()),
    })
}

// ============================================================================
// Members and bookings
// ============================================================================

fn tier_options() -> Vec<(String, String)> {
    MembershipTier::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), format!("{} ({})", t, t.price_label())))
        .collect()
}

pub fn member_form(existing: Option<&Member>) -> Form {
    let tier = existing.map_or(MembershipTier::CircleMember, |m| m.membership_tier);
    let fields = vec![
        FormField::text("full_name", "Full name", existing.map(|m| m.full_name.clone()).unwrap_or_default()),
        FormField::text("email", "Email", existing.map(|m| m.email.clone()).unwrap_or_default()),
        FormField::choice("membership_tier", "Tier", tier.as_str(), tier_options()),
        FormField::text(
            "membership_start_date",
            "Start date",
            existing.map(|m| opt_date(m.membership_start_date)).unwrap_or_default(),
        )
        .hint("YYYY-MM-DD"),
        FormField::text(
            "membership_end_date",
            "End date",
            existing.map(|m| opt_date(m.membership_end_date)).unwrap_or_default(),
        )
        .hint("YYYY-MM-DD"),
        FormField::flag("is_active", "Active", existing.map_or(true, |m| m.is_active)),
    ];
    Form::new(FormKind::Member, existing.map(|m| m.id.clone()), fields)
}

pub fn new_member(form: &Form) -> Result<NewMember, String> {
    Ok(NewMember {
        full_name: form.text("full_name")?,
        email: form.text("email")?,
        membership_tier: form.choice("membership_tier", MembershipTier::parse)?,
        membership_start_date: form.optional_date("membership_start_date")?,
        membership_end_date: form.optional_date("membership_end_date")?,
        is_active: form.flag("is_active")?,
    })
}

pub fn member_update(form: &Form) -> Result<MemberUpdate, String> {
    let new = new_member(form)?;
    Ok(MemberUpdate {
        full_name: Some(new.full_name),
        email: Some(new.email),
        membership_tier: Some(new.membership_tier),
        membership_start_date: new.membership_start_date,
        membership_end_date: new.membership_end_date,
        is_active: Some(new.is_active),
    })
}

pub fn booking_form(existing: Option<&Booking>, members: &[Member]) -> Form {
    let member_options = members.iter().map(|m| (m.id.clone(), m.full_name.clone())).collect();
    let reading_type = existing.map_or(ReadingType::General, |b| b.reading_type);
    let type_options = ReadingType::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), format!("{} (${})", t, t.list_price())))
        .collect();
    let status = existing.map_or(BookingStatus::Pending, |b| b.status);
    let fields = vec![
        FormField::choice(
            "member_id",
            "Member",
            existing.map(|b| b.member_id.as_str()).unwrap_or_default(),
            member_options,
        ),
        FormField::choice("reading_type", "Reading type", reading_type.as_str(), type_options),
        FormField::text(
            "booking_date",
            "Date (GMT)",
            existing
                .map(|b| b.booking_date.format(DATETIME_FORMAT).to_string())
                .unwrap_or_default(),
        )
        .hint("YYYY-MM-DD HH:MM"),
        FormField::choice(
            "status",
            "Status",
            status.as_str(),
            options(&BookingStatus::ALL, BookingStatus::as_str),
        ),
        FormField::text(
            "customer_questions",
            "Questions",
            existing.map(|b| opt(&b.customer_questions)).unwrap_or_default(),
        ),
        FormField::text(
            "special_requests",
            "Special requests",
            existing.map(|b| opt(&b.special_requests)).unwrap_or_default(),
        ),
        FormField::text(
            "payment_amount",
            "Payment",
            existing.map(|b| opt_num(b.payment_amount)).unwrap_or_default(),
        )
        .hint("blank uses the list price"),
    ];
    Form::new(FormKind::Booking, existing.map(|b| b.id.clone()), fields)
}

pub fn new_booking(form: &Form) -> Result<NewBooking, String> {
    let reading_type = form.choice("reading_type", ReadingType::parse)?;
    let payment = form.optional_money("payment_amount")?.unwrap_or_else(|| reading_type.list_price());
    Ok(NewBooking {
        member_id: form.text("member_id")?,
        reading_type,
        booking_date: form.datetime("booking_date")?,
        status: form.choice("status", BookingStatus::parse)?,
        customer_questions: form.optional("customer_questions")?,
        special_requests: form.optional("special_requests")?,
        payment_amount: Some(payment),
    })
}

pub fn booking_update(form: &Form) -> Result<BookingUpdate, String> {
    let new = new_booking(form)?;
    Ok(BookingUpdate {
        reading_type: Some(new.reading_type),
        booking_date: Some(new.booking_date),
        status: Some(new.status),
        customer_questions: Some(new.customer_questions.unwrap_or_default()),
        special_requests: Some(new.special_requests.unwrap_or_default()),
        payment_amount: new.payment_amount,
    })
}

// ============================================================================
// Announcements and weekly messages
// ============================================================================

pub fn announcement_form(existing: Option<&Announcement>) -> Form {
    let method = existing.map_or(DeliveryMethod::Dashboard, |a| a.delivery_method);
    let tier = existing.map_or(TargetTier::All, |a| a.audience());
    let fields = vec![
        FormField::text("title", "Title", existing.map(|a| a.title.clone()).unwrap_or_default()),
        FormField::text("content", "Content", existing.map(|a| a.content.clone()).unwrap_or_default()),
        FormField::choice(
            "delivery_method",
            "Delivery",
            method.as_str(),
            options(&DeliveryMethod::ALL, DeliveryMethod::as_str),
        ),
        FormField::choice("target_tier", "Audience", tier.as_str(), options(&TargetTier::ALL, TargetTier::as_str)),
        FormField::flag("is_published", "Published", existing.is_some_and(|a| a.is_published)),
    ];
    Form::new(FormKind::Announcement, existing.map(|a| a.id.clone()), fields)
}

pub fn new_announcement(form: &Form) -> Result<NewAnnouncement, String> {
    Ok(NewAnnouncement {
        title: form.text("title")?,
        content: form.text("content")?,
        delivery_method: form.choice("delivery_method", DeliveryMethod::parse)?,
        target_tier: form.choice("target_tier", TargetTier::parse)?,
        is_published: form.flag("is_published")?,
    })
}

pub fn announcement_update(form: &Form) -> Result<AnnouncementUpdate, String> {
    let new = new_announcement(form)?;
    Ok(AnnouncementUpdate {
        title: Some(new.title),
        content: Some(new.content),
        delivery_method: Some(new.delivery_method),
        target_tier: Some(new.target_tier),
        is_published: Some(new.is_published),
    })
}

pub fn message_form(existing: Option<&WeeklyMessage>, today: NaiveDate) -> Form {
    let fields = vec![
        FormField::text("title", "Title", existing.map(|m| m.title.clone()).unwrap_or_default()),
        FormField::text(
            "message_content",
            "Message",
            existing.map(|m| m.message_content.clone()).unwrap_or_default(),
        ),
        FormField::text(
            "published_date",
            "Publish date",
            existing.map_or(today, |m| m.published_date).format(DATE_FORMAT).to_string(),
        )
        .hint("YYYY-MM-DD"),
        FormField::flag("is_current", "Current", existing.is_some_and(|m| m.is_current)),
    ];
    Form::new(FormKind::Message, existing.map(|m| m.id.clone()), fields)
}

pub fn new_message(form: &Form) -> Result<NewWeeklyMessage, String> {
    Ok(NewWeeklyMessage {
        title: form.text("title")?,
        message_content: form.text("message_content")?,
        published_date: form.date("published_date")?,
        is_current: form.flag("is_current")?,
    })
}

pub fn message_update(form: &Form) -> Result<WeeklyMessageUpdate, String> {
    let new = new_message(form)?;
    Ok(WeeklyMessageUpdate {
        title: Some(new.title),
        message_content: Some(new.message_content),
        published_date: Some(new.published_date),
        is_current: Some(new.is_current),
    })
}

// ============================================================================
// Meditations and resources
// ============================================================================

pub fn meditation_form(existing: Option<&Meditation>) -> Form {
    let category = existing.map_or(MeditationCategory::Relaxation, |m| m.category);
    let fields = vec![
        FormField::text("title", "Title", existing.map(|m| m.title.clone()).unwrap_or_default()),
        FormField::text("description", "Description", existing.map(|m| opt(&m.description)).unwrap_or_default()),
        FormField::text("audio_url", "Audio URL", existing.map(|m| m.audio_url.clone()).unwrap_or_default()),
        FormField::text(
            "duration_minutes",
            "Duration (min)",
            existing.map(|m| opt_num(m.duration_minutes)).unwrap_or_default(),
        ),
        FormField::choice(
            "category",
            "Category",
            category.as_str(),
            options(&MeditationCategory::ALL, MeditationCategory::as_str),
        ),
        FormField::flag("is_featured", "Featured", existing.is_some_and(|m| m.is_featured)),
        FormField::flag("is_published", "Published", existing.map_or(true, |m| m.is_published)),
    ];
    Form::new(FormKind::Meditation, existing.map(|m| m.id.clone()), fields)
}

pub fn new_meditation(form: &Form) -> Result<NewMeditation, String> {
    Ok(NewMeditation {
        title: form.text("title")?,
        description: form.optional("description")?,
        audio_url: form.text("audio_url")?,
        duration_minutes: form.optional_int("duration_minutes")?,
        category: form.choice("category", MeditationCategory::parse)?,
        is_featured: form.flag("is_featured")?,
        is_published: form.flag("is_published")?,
    })
}

pub fn meditation_update(form: &Form) -> Result<MeditationUpdate, String> {
    let new = new_meditation(form)?;
    Ok(MeditationUpdate {
        title: Some(new.title),
        description: Some(new.description.unwrap_or_default()),
        audio_url: Some(new.audio_url),
        duration_minutes: new.duration_minutes,
        category: Some(new.category),
        is_featured: Some(new.is_featured),
        is_published: Some(new.is_published),
    })
}

pub fn resource_form(existing: Option<&Resource>) -> Form {
    let category = existing.map_or(ResourceCategory::Guides, |r| r.category);
    let fields = vec![
        FormField::text("title", "Title", existing.map(|r| r.title.clone()).unwrap_or_default()),
        FormField::text("description", "Description", existing.map(|r| opt(&r.description)).unwrap_or_default()),
        FormField::text("file_url", "File URL", existing.map(|r| r.file_url.clone()).unwrap_or_default()),
        FormField::text("file_size", "Size (bytes)", existing.map(|r| opt_num(r.file_size)).unwrap_or_default()),
        FormField::choice(
            "category",
            "Category",
            category.as_str(),
            options(&ResourceCategory::ALL, ResourceCategory::as_str),
        ),
        FormField::flag("is_featured", "Featured", existing.is_some_and(|r| r.is_featured)),
        FormField::flag("is_published", "Published", existing.map_or(true, |r| r.is_published)),
    ];
    Form::new(FormKind::Resource, existing.map(|r| r.id.clone()), fields)
}

pub fn new_resource(form: &Form) -> Result<NewResource, String> {
    Ok(NewResource {
        title: form.text("title")?,
        description: form.optional("description")?,
        file_url: form.text("file_url")?,
        file_size: form.optional_int("file_size")?,
        category: form.choice("category", ResourceCategory::parse)?,
        is_featured: form.flag("is_featured")?,
        is_published: form.flag("is_published")?,
    })
}

pub fn resource_update(form: &Form) -> Result<ResourceUpdate, String> {
    let new = new_resource(form)?;
    Ok(ResourceUpdate {
        title: Some(new.title),
        description: Some(new.description.unwrap_or_default()),
        file_url: Some(new.file_url),
        file_size: new.file_size,
        category: Some(new.category),
        is_featured: Some(new.is_featured),
        is_published: Some(new.is_published),
    })
}

// ============================================================================
// Digital readings and products
// ============================================================================

pub fn reading_form(existing: Option<&DigitalReading>) -> Form {
    let category = existing.map_or(ReadingCategory::General, |r| r.category);
    let fields = vec![
        FormField::choice(
            "category",
            "Category",
            category.as_str(),
            options(&ReadingCategory::ALL, ReadingCategory::as_str),
        ),
        FormField::text(
            "card_number",
            "Card number",
            existing.map(|r| r.card_number.to_string()).unwrap_or_default(),
        )
        .hint("0-21"),
        FormField::text("card_name", "Card name", existing.map(|r| r.card_name.clone()).unwrap_or_default())
            .hint("blank uses the Major Arcana name"),
        FormField::text("card_meaning", "Meaning", existing.map(|r| opt(&r.card_meaning)).unwrap_or_default()),
        FormField::text("video_url", "Video URL", existing.map(|r| r.video_url.clone()).unwrap_or_default()),
    ];
    Form::new(FormKind::Reading, existing.map(|r| r.id.clone()), fields)
}

pub fn new_reading(form: &Form) -> Result<NewDigitalReading, String> {
    let card_number = CardNumber::try_from(form.int("card_number")?)?;
    let card_name = form
        .optional("card_name")?
        .unwrap_or_else(|| card_number.arcana_name().to_string());
    Ok(NewDigitalReading {
        category: form.choice("category", ReadingCategory::parse)?,
        card_number,
        card_name,
        card_meaning: form.optional("card_meaning")?,
        video_url: form.text("video_url")?,
    })
}

pub fn reading_update(form: &Form) -> Result<DigitalReadingUpdate, String> {
    let new = new_reading(form)?;
    Ok(DigitalReadingUpdate {
        category: Some(new.category),
        card_number: Some(new.card_number),
        card_name: Some(new.card_name),
        card_meaning: Some(new.card_meaning.unwrap_or_default()),
        video_url: Some(new.video_url),
    })
}

pub fn product_form(existing: Option<&ReadingProduct>, next_sort_order: i32) -> Form {
    let category = existing.map_or(ProductCategory::Standard, |p| p.category);
    let fields = vec![
        FormField::text("title", "Title", existing.map(|p| p.title.clone()).unwrap_or_default()),
        FormField::text("description", "Description", existing.map(|p| opt(&p.description)).unwrap_or_default()),
        FormField::text("price", "Price", existing.map(|p| p.price.to_string()).unwrap_or_default()),
        FormField::text("image_url", "Image URL", existing.map(|p| opt(&p.image_url)).unwrap_or_default()),
        FormField::choice(
            "category",
            "Category",
            category.as_str(),
            options(&ProductCategory::ALL, ProductCategory::as_str),
        ),
        FormField::text(
            "delivery_time",
            "Delivery time",
            existing.map_or_else(|| "24-48 hours".to_string(), |p| opt(&p.delivery_time)),
        ),
        FormField::flag("is_live_reading", "Live reading", existing.is_some_and(|p| p.is_live_reading)),
        FormField::text("calendly_link", "Calendly link", existing.map(|p| opt(&p.calendly_link)).unwrap_or_default()),
        FormField::text(
            "sort_order",
            "Sort order",
            existing.map_or(next_sort_order, |p| p.sort_order).to_string(),
        ),
        FormField::flag("is_active", "Active", existing.map_or(true, |p| p.is_active)),
    ];
    Form::new(FormKind::Product, existing.map(|p| p.id.clone()), fields)
}

pub fn new_product(form: &Form) -> Result<NewReadingProduct, String> {
    Ok(NewReadingProduct {
        title: form.text("title")?,
        description: form.optional("description")?,
        price: form.money("price")?,
        image_url: form.optional("image_url")?,
        category: form.choice("category", ProductCategory::parse)?,
        delivery_time: form.optional("delivery_time")?,
        is_live_reading: form.flag("is_live_reading")?,
        calendly_link: form.optional("calendly_link")?,
        sort_order: form.int("sort_order")?,
        is_active: form.flag("is_active")?,
    })
}

pub fn product_update(form: &Form) -> Result<ReadingProductUpdate, String> {
    let new = new_product(form)?;
    Ok(ReadingProductUpdate {
        title: Some(new.title),
        description: Some(new.description.unwrap_or_default()),
        price: Some(new.price),
        image_url: Some(new.image_url.unwrap_or_default()),
        category: Some(new.category),
        delivery_time: Some(new.delivery_time.unwrap_or_default()),
        is_live_reading: Some(new.is_live_reading),
        calendly_link: Some(new.calendly_link.unwrap_or_default()),
        sort_order: Some(new.sort_order),
        is_active: Some(new.is_active),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn set(form: &mut Form, key: &str, value: &str) {
        let field = form.fields.iter_mut().find(|f| f.key == key).unwrap();
        field.value = value.to_string();
    }

    #[test]
    fn test_module_form_defaults_to_next_number() {
        let form = module_form(None, 4);
        assert_eq!(form.title(), "New Module");
        let new = new_module(&form).unwrap();
        assert_eq!(new.module_number, 4);
        assert_eq!(new.order_position, 4);
        assert!(!new.is_published);
    }

    #[test]
    fn test_bad_number_names_the_field() {
        let mut form = module_form(None, 1);
        set(&mut form, "module_number", "three");
        assert_eq!(new_module(&form).unwrap_err(), "Module number must be a whole number");
    }

    #[test]
    fn test_flag_and_choice_cycle() {
        let mut form = member_form(None);
        form.focus = 2;
        form.cycle_focused(true);
        assert_eq!(form.fields[2].value, "vip");
        assert_eq!(form.fields[2].display(), "VIP ($547/6 months)");
        form.cycle_focused(true);
        assert_eq!(form.fields[2].value, "circle_member");

        form.focus = 5;
        assert_eq!(form.fields[5].value, "yes");
        form.cycle_focused(true);
        assert_eq!(form.fields[5].value, "no");

        // Choices and flags ignore typing
        form.push_char('x');
        assert_eq!(form.fields[5].value, "no");
    }

    #[test]
    fn test_booking_defaults_payment_to_list_price() {
        let mut form = booking_form(None, &[]);
        set(&mut form, "member_id", "m1");
        set(&mut form, "reading_type", "in_depth");
        set(&mut form, "booking_date", "2026-11-03 14:00");

        let new = new_booking(&form).unwrap();
        assert_eq!(new.payment_amount, Some(dec!(125)));
        assert_eq!(new.status, BookingStatus::Pending);
        assert_eq!(new.booking_date.format("%H:%M").to_string(), "14:00");

        set(&mut form, "payment_amount", "$60");
        assert_eq!(new_booking(&form).unwrap().payment_amount, Some(dec!(60)));

        set(&mut form, "booking_date", "tomorrow");
        assert!(new_booking(&form).unwrap_err().starts_with("Date (GMT)"));
    }

    #[test]
    fn test_reading_card_name_defaults_to_arcana() {
        let mut form = reading_form(None);
        set(&mut form, "card_number", "13");
        set(&mut form, "video_url", "https://youtu.be/abc");
        let new = new_reading(&form).unwrap();
        assert_eq!(new.card_name, "Death");

        set(&mut form, "card_number", "22");
        assert_eq!(
            new_reading(&form).unwrap_err(),
            "Card number must be between 0 and 21, got 22"
        );
    }

    #[test]
    fn test_update_clears_optional_text() {
        let mut form = product_form(None, 3);
        set(&mut form, "title", "Express Reading");
        set(&mut form, "price", "35");
        let update = product_update(&form).unwrap();
        assert_eq!(update.description, Some(String::new()));
        assert_eq!(update.sort_order, Some(3));
        assert_eq!(update.delivery_time.as_deref(), Some("24-48 hours"));
    }

    #[test]
    fn test_can_add_field_char() {
        assert!(can_add_field_char(0, 'a'));
        assert!(!can_add_field_char(MAX_FIELD_LENGTH, 'a'));
        assert!(!can_add_field_char(0, '\n'));
    }
}
