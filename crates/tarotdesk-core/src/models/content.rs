//! Member library content: guided meditations and downloadable resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeditationCategory {
    Relaxation,
    Intuition,
    Protection,
    Sleep,
}

impl MeditationCategory {
    pub const ALL: [MeditationCategory; 4] = [
        MeditationCategory::Relaxation,
        MeditationCategory::Intuition,
        MeditationCategory::Protection,
        MeditationCategory::Sleep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeditationCategory::Relaxation => "relaxation",
            MeditationCategory::Intuition => "intuition",
            MeditationCategory::Protection => "protection",
            MeditationCategory::Sleep => "sleep",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for MeditationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeditationCategory::Relaxation => write!(f, "Relaxation"),
            MeditationCategory::Intuition => write!(f, "Intuition"),
            MeditationCategory::Protection => write!(f, "Protection"),
            MeditationCategory::Sleep => write!(f, "Sleep"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meditation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub audio_url: String,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    pub category: MeditationCategory,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMeditation {
    pub title: String,
    pub description: Option<String>,
    pub audio_url: String,
    pub duration_minutes: Option<i32>,
    pub category: MeditationCategory,
    pub is_featured: bool,
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MeditationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<MeditationCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Journals,
    Guides,
    Workbooks,
    Reference,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 4] = [
        ResourceCategory::Journals,
        ResourceCategory::Guides,
        ResourceCategory::Workbooks,
        ResourceCategory::Reference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Journals => "journals",
            ResourceCategory::Guides => "guides",
            ResourceCategory::Workbooks => "workbooks",
            ResourceCategory::Reference => "reference",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceCategory::Journals => write!(f, "Journals"),
            ResourceCategory::Guides => write!(f, "Guides"),
            ResourceCategory::Workbooks => write!(f, "Workbooks"),
            ResourceCategory::Reference => write!(f, "Reference"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub file_url: String,
    /// Size in bytes.
    #[serde(default)]
    pub file_size: Option<i64>,
    pub category: ResourceCategory,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Resource {
    pub fn size_display(&self) -> String {
        match self.file_size {
            Some(bytes) if bytes > 0 => format_file_size(bytes),
            _ => "Unknown size".to_string(),
        }
    }
}

fn format_file_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewResource {
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_size: Option<i64>,
    pub category: ResourceCategory,
    pub is_featured: bool,
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ResourceCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_size_display() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(MeditationCategory::parse("Sleep"), Some(MeditationCategory::Sleep));
        assert_eq!(ResourceCategory::parse("workbooks"), Some(ResourceCategory::Workbooks));
        assert_eq!(ResourceCategory::parse("videos"), None);
    }
}
