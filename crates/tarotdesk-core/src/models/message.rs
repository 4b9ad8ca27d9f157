use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A weekly message for members. At most one is current at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyMessage {
    pub id: String,
    pub title: String,
    pub message_content: String,
    pub published_date: NaiveDate,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewWeeklyMessage {
    pub title: String,
    pub message_content: String,
    pub published_date: NaiveDate,
    pub is_current: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeeklyMessageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_current: Option<bool>,
}
