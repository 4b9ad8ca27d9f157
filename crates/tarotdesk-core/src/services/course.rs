//! Course content: modules and their lessons.

use std::sync::Arc;

use tracing::info;

use super::error::require;
use super::{ServiceError, ServiceResult, Table};
use crate::api::{Backend, Query};
use crate::models::{
    CourseLesson, CourseLessonUpdate, CourseModule, CourseModuleUpdate, ModuleWithLessons,
    NewCourseLesson, NewCourseModule, MAX_MODULE_NUMBER, MIN_MODULE_NUMBER,
};

pub const MODULES_TABLE: &str = "course_modules";
pub const LESSONS_TABLE: &str = "course_lessons";

fn duplicate_module_message(number: i32) -> String {
    format!(
        "Module {} already exists. Please edit the existing module or choose a different number.",
        number
    )
}

/// Shown when the backend's unique constraint catches a duplicate the
/// pre-check missed (e.g. another admin created it meanwhile).
fn stored_duplicate_message(number: i32) -> String {
    format!(
        "Module {} already exists in the database. Please refresh and choose a different module number.",
        number
    )
}

/// Unique violation on an update that did not change the module number
const STORED_CLASH_MESSAGE: &str =
    "This change clashes with a module already in the database. Please refresh and try again.";

fn check_module_range(number: i32) -> ServiceResult<()> {
    if (MIN_MODULE_NUMBER..=MAX_MODULE_NUMBER).contains(&number) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "Module number must be between {} and {}",
            MIN_MODULE_NUMBER, MAX_MODULE_NUMBER
        )))
    }
}

/// First unused number in 1..=8, else one past the highest in use.
pub fn next_available_module_number(modules: &[CourseModule]) -> i32 {
    let used: Vec<i32> = modules.iter().map(|m| m.module_number).collect();
    (MIN_MODULE_NUMBER..=MAX_MODULE_NUMBER)
        .find(|n| !used.contains(n))
        .unwrap_or_else(|| used.iter().max().map(|m| m + 1).unwrap_or(MIN_MODULE_NUMBER))
}

/// A `(module, lesson)` pair addressed by number, as in `?module=3&lesson=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonRef {
    pub module_number: i32,
    pub lesson_number: i32,
}

impl LessonRef {
    pub fn parse(query: &str) -> ServiceResult<Self> {
        let query = query.trim_start_matches('?');
        let mut module_number = None;
        let mut lesson_number = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "module" => module_number = value.trim().parse().ok(),
                "lesson" => lesson_number = value.trim().parse().ok(),
                _ => {}
            }
        }

        match (module_number, lesson_number) {
            (Some(module_number), Some(lesson_number)) => Ok(Self {
                module_number,
                lesson_number,
            }),
            _ => Err(ServiceError::Validation(
                "Missing module or lesson information".to_string(),
            )),
        }
    }

    pub fn to_query_string(&self) -> String {
        format!("?module={}&lesson={}", self.module_number, self.lesson_number)
    }
}

/// A located lesson with its neighbours for previous/next navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonLocation {
    pub module: CourseModule,
    pub lesson: CourseLesson,
    pub previous: Option<LessonRef>,
    pub next: Option<LessonRef>,
}

#[derive(Clone)]
pub struct CourseService {
    modules: Table,
    lessons: Table,
}

impl CourseService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            modules: Table::new(backend.clone(), MODULES_TABLE, "Module"),
            lessons: Table::new(backend, LESSONS_TABLE, "Lesson"),
        }
    }

    // ===== Modules =====

    pub async fn list_modules(&self) -> ServiceResult<Vec<CourseModule>> {
        self.modules.list(&Query::new().asc("order_position")).await
    }

    pub async fn get_module(&self, id: &str) -> ServiceResult<CourseModule> {
        self.modules.get(id).await
    }

    async fn module_by_number(&self, number: i32) -> ServiceResult<Option<CourseModule>> {
        self.modules.find(&Query::new().eq("module_number", number)).await
    }

    pub async fn create_module(&self, module: &NewCourseModule) -> ServiceResult<CourseModule> {
        check_module_range(module.module_number)?;
        require(&module.title, "Title")?;

        if self.module_by_number(module.module_number).await?.is_some() {
            return Err(ServiceError::Conflict(duplicate_module_message(module.module_number)));
        }

        match self.modules.insert(module).await {
            Err(ServiceError::Backend(e)) if e.is_unique_violation() => Err(ServiceError::Conflict(
                stored_duplicate_message(module.module_number),
            )),
            other => other,
        }
    }

    pub async fn update_module(&self, id: &str, update: &CourseModuleUpdate) -> ServiceResult<CourseModule> {
        if let Some(ref title) = update.title {
            require(title, "Title")?;
        }
        if let Some(number) = update.module_number {
            check_module_range(number)?;
            if let Some(existing) = self.module_by_number(number).await? {
                if existing.id != id {
                    return Err(ServiceError::Conflict(duplicate_module_message(number)));
                }
            }
        }

        match self.modules.update(id, update).await {
            Err(ServiceError::Backend(e)) if e.is_unique_violation() => {
                let message = match update.module_number {
                    Some(number) => stored_duplicate_message(number),
                    None => STORED_CLASH_MESSAGE.to_string(),
                };
                Err(ServiceError::Conflict(message))
            }
            other => other,
        }
    }

    /// Delete a module and every lesson in it.
    pub async fn delete_module(&self, id: &str) -> ServiceResult<()> {
        let removed = self
            .lessons
            .delete_where(&Query::new().eq("module_id", id))
            .await?;
        self.modules.delete(id).await?;
        info!(module_id = id, lessons = removed, "Deleted module");
        Ok(())
    }

    pub async fn set_module_published(&self, id: &str, published: bool) -> ServiceResult<CourseModule> {
        self.modules.set_flag(id, "is_published", published).await
    }

    pub async fn next_module_number(&self) -> ServiceResult<i32> {
        Ok(next_available_module_number(&self.list_modules().await?))
    }

    // ===== Lessons =====

    pub async fn list_lessons(&self, module_id: &str) -> ServiceResult<Vec<CourseLesson>> {
        self.lessons
            .list(&Query::new().eq("module_id", module_id).asc("order_position"))
            .await
    }

    pub async fn list_all_lessons(&self) -> ServiceResult<Vec<CourseLesson>> {
        self.lessons.list(&Query::new().asc("order_position")).await
    }

    pub async fn get_lesson(&self, id: &str) -> ServiceResult<CourseLesson> {
        self.lessons.get(id).await
    }

    pub async fn create_lesson(&self, lesson: &NewCourseLesson) -> ServiceResult<CourseLesson> {
        if lesson.module_id.trim().is_empty() {
            return Err(ServiceError::Validation("Please select a module".to_string()));
        }
        require(&lesson.title, "Title")?;
        // Surfaces a missing module as a not-found error instead of a backend FK failure
        self.get_module(&lesson.module_id).await?;
        self.lessons.insert(lesson).await
    }

    pub async fn update_lesson(&self, id: &str, update: &CourseLessonUpdate) -> ServiceResult<CourseLesson> {
        if let Some(ref title) = update.title {
            require(title, "Title")?;
        }
        if let Some(ref module_id) = update.module_id {
            self.get_module(module_id).await?;
        }
        self.lessons.update(id, update).await
    }

    pub async fn delete_lesson(&self, id: &str) -> ServiceResult<()> {
        self.lessons.delete(id).await
    }

    pub async fn set_lesson_published(&self, id: &str, published: bool) -> ServiceResult<CourseLesson> {
        self.lessons.set_flag(id, "is_published", published).await
    }

    // ===== Course views =====

    pub async fn modules_with_lessons(&self) -> ServiceResult<Vec<ModuleWithLessons>> {
        let (modules, lessons) = futures::try_join!(self.list_modules(), self.list_all_lessons())?;

        Ok(modules
            .into_iter()
            .map(|module| {
                let lessons = lessons
                    .iter()
                    .filter(|l| l.module_id == module.id)
                    .cloned()
                    .collect();
                ModuleWithLessons { module, lessons }
            })
            .collect())
    }

    /// Locate a lesson by module and lesson number.
    pub async fn find_lesson(&self, lesson_ref: LessonRef) -> ServiceResult<LessonLocation> {
        let module = self
            .module_by_number(lesson_ref.module_number)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Module".to_string()))?;
        let lessons = self.list_lessons(&module.id).await?;

        let lesson = lessons
            .iter()
            .find(|l| l.lesson_number == lesson_ref.lesson_number)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound("Lesson".to_string()))?;

        let neighbour = |number: i32| {
            lessons.iter().any(|l| l.lesson_number == number).then_some(LessonRef {
                module_number: module.module_number,
                lesson_number: number,
            })
        };
        let previous = neighbour(lesson.lesson_number - 1);
        let next = neighbour(lesson.lesson_number + 1);

        Ok(LessonLocation {
            module,
            lesson,
            previous,
            next,
        })
    }

    pub async fn find_lesson_by_query(&self, query: &str) -> ServiceResult<LessonLocation> {
        self.find_lesson(LessonRef::parse(query)?).await
    }
}
