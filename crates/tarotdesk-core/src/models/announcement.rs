use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::member::MembershipTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Email,
    Dashboard,
    Both,
}

impl DeliveryMethod {
    pub const ALL: [DeliveryMethod; 3] = [DeliveryMethod::Email, DeliveryMethod::Dashboard, DeliveryMethod::Both];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Email => "email",
            DeliveryMethod::Dashboard => "dashboard",
            DeliveryMethod::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|d| d.as_str().eq_ignore_ascii_case(s))
    }

    /// Email deliveries are sent by hand and then marked as sent.
    pub fn includes_email(&self) -> bool {
        matches!(self, DeliveryMethod::Email | DeliveryMethod::Both)
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMethod::Email => write!(f, "Email Only"),
            DeliveryMethod::Dashboard => write!(f, "Dashboard Only"),
            DeliveryMethod::Both => write!(f, "Email & Dashboard"),
        }
    }
}

/// Audience of an announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTier {
    All,
    CircleMember,
    Vip,
}

impl TargetTier {
    pub const ALL: [TargetTier; 3] = [TargetTier::All, TargetTier::CircleMember, TargetTier::Vip];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetTier::All => "all",
            TargetTier::CircleMember => "circle_member",
            TargetTier::Vip => "vip",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|t| t.as_str().eq_ignore_ascii_case(s))
    }

    pub fn includes(&self, tier: MembershipTier) -> bool {
        match self {
            TargetTier::All => true,
            TargetTier::CircleMember => tier == MembershipTier::CircleMember,
            TargetTier::Vip => tier == MembershipTier::Vip,
        }
    }
}

impl std::fmt::Display for TargetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetTier::All => write!(f, "All Members"),
            TargetTier::CircleMember => write!(f, "Circle Members Only"),
            TargetTier::Vip => write!(f, "VIP Members Only"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub delivery_method: DeliveryMethod,
    /// Missing in older rows; treated as everyone.
    #[serde(default)]
    pub target_tier: Option<TargetTier>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_sent: bool,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Announcement {
    pub fn audience(&self) -> TargetTier {
        self.target_tier.unwrap_or(TargetTier::All)
    }

    /// Only published, unsent announcements can be marked as sent.
    pub fn can_mark_sent(&self) -> bool {
        self.is_published && !self.is_sent
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub delivery_method: DeliveryMethod,
    pub target_tier: TargetTier,
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnnouncementUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_method: Option<DeliveryMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_tier: Option<TargetTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}
