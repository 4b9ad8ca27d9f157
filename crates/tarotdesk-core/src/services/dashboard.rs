use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::course::{LESSONS_TABLE, MODULES_TABLE};
use super::meditation::MEDITATIONS_TABLE;
use super::member::MEMBERS_TABLE;
use super::resource::RESOURCES_TABLE;
use super::{ServiceResult, Table};
use crate::api::{Backend, Query};

/// Headline counts for the admin overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub modules: usize,
    pub lessons: usize,
    pub members: usize,
    pub active_members: usize,
    pub meditations: usize,
    pub resources: usize,
}

#[derive(Clone)]
pub struct DashboardService {
    modules: Table,
    lessons: Table,
    members: Table,
    meditations: Table,
    resources: Table,
}

impl DashboardService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            modules: Table::new(backend.clone(), MODULES_TABLE, "Module"),
            lessons: Table::new(backend.clone(), LESSONS_TABLE, "Lesson"),
            members: Table::new(backend.clone(), MEMBERS_TABLE, "Member"),
            meditations: Table::new(backend.clone(), MEDITATIONS_TABLE, "Meditation"),
            resources: Table::new(backend, RESOURCES_TABLE, "Resource"),
        }
    }

    /// Load every count concurrently. Any failure fails the whole overview.
    pub async fn stats(&self) -> ServiceResult<DashboardStats> {
        let all = Query::new();
        let active = Query::new().eq("is_active", true);

        let (modules, lessons, members, active_members, meditations, resources) = futures::try_join!(
            self.modules.count(&all),
            self.lessons.count(&all),
            self.members.count(&all),
            self.members.count(&active),
            self.meditations.count(&all),
            self.resources.count(&all),
        )?;

        Ok(DashboardStats {
            modules,
            lessons,
            members,
            active_members,
            meditations,
            resources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use serde_json::json;

    #[tokio::test]
    async fn test_counts() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert(MODULES_TABLE, json!({"module_number": 1})).await.unwrap();
        backend.insert(LESSONS_TABLE, json!({"module_id": "m"})).await.unwrap();
        backend.insert(LESSONS_TABLE, json!({"module_id": "m"})).await.unwrap();
        backend.insert(MEMBERS_TABLE, json!({"is_active": true})).await.unwrap();
        backend.insert(MEMBERS_TABLE, json!({"is_active": false})).await.unwrap();
        backend.insert(RESOURCES_TABLE, json!({})).await.unwrap();

        let stats = DashboardService::new(backend).stats().await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                modules: 1,
                lessons: 2,
                members: 2,
                active_members: 1,
                meditations: 0,
                resources: 1,
            }
        );
    }
}
