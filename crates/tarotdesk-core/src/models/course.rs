use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest module number in the course.
pub const MIN_MODULE_NUMBER: i32 = 1;

/// Highest module number in the course. The course is published as eight modules.
pub const MAX_MODULE_NUMBER: i32 = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseModule {
    pub id: String,
    pub module_number: i32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order_position: i32,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CourseModule {
    pub fn label(&self) -> String {
        format!("Module {}: {}", self.module_number, self.title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCourseModule {
    pub module_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub order_position: i32,
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CourseModuleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseLesson {
    pub id: String,
    pub module_id: String,
    pub lesson_number: i32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Rich lesson body (HTML). Falls back to `description` when empty.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub order_position: i32,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub resource_url: Option<String>,
    #[serde(default)]
    pub resource_title: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CourseLesson {
    /// Text to show as the lesson body: content if present, else the description.
    pub fn body(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| self.description.as_deref().filter(|d| !d.trim().is_empty()))
    }

    pub fn resource_label(&self) -> &str {
        self.resource_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Download Lesson Resource")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCourseLesson {
    pub module_id: String,
    pub lesson_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub order_position: i32,
    pub is_published: bool,
    pub resource_url: Option<String>,
    pub resource_title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CourseLessonUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_title: Option<String>,
}

/// A module together with its lessons, ordered by `order_position`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleWithLessons {
    #[serde(flatten)]
    pub module: CourseModule,
    pub lessons: Vec<CourseLesson>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson() -> CourseLesson {
        serde_json::from_value(serde_json::json!({
            "id": "l1",
            "module_id": "m1",
            "lesson_number": 1,
            "title": "The Fool's Journey"
        }))
        .expect("lesson parses with defaults")
    }

    #[test]
    fn test_lesson_body_prefers_content() {
        let mut l = lesson();
        l.description = Some("Short description".to_string());
        assert_eq!(l.body(), Some("Short description"));

        l.content = Some("<p>Full lesson</p>".to_string());
        assert_eq!(l.body(), Some("<p>Full lesson</p>"));

        l.content = Some("   ".to_string());
        assert_eq!(l.body(), Some("Short description"));
    }

    #[test]
    fn test_resource_label_default() {
        let mut l = lesson();
        assert_eq!(l.resource_label(), "Download Lesson Resource");
        l.resource_title = Some("Workbook".to_string());
        assert_eq!(l.resource_label(), "Workbook");
    }

    #[test]
    fn test_update_omits_unset_fields() {
        let update = CourseModuleUpdate {
            is_published: Some(true),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, serde_json::json!({ "is_published": true }));
    }
}
