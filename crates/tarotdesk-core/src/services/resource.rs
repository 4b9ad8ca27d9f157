use std::sync::Arc;

use super::error::require;
use super::{ServiceResult, Table};
use crate::api::{Backend, Query};
use crate::models::{NewResource, Resource, ResourceCategory, ResourceUpdate};

pub const RESOURCES_TABLE: &str = "resources";

#[derive(Clone)]
pub struct ResourceService {
    resources: Table,
}

impl ResourceService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            resources: Table::new(backend, RESOURCES_TABLE, "Resource"),
        }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Resource>> {
        self.resources.list(&Query::new().desc("created_at")).await
    }

    pub async fn list_by_category(&self, category: ResourceCategory) -> ServiceResult<Vec<Resource>> {
        self.resources
            .list(&Query::new().eq("category", category.as_str()).desc("created_at"))
            .await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Resource> {
        self.resources.get(id).await
    }

    pub async fn create(&self, resource: &NewResource) -> ServiceResult<Resource> {
        require(&resource.title, "Title")?;
        require(&resource.file_url, "File URL")?;
        self.resources.insert(resource).await
    }

    pub async fn update(&self, id: &str, update: &ResourceUpdate) -> ServiceResult<Resource> {
        if let Some(ref title) = update.title {
            require(title, "Title")?;
        }
        if let Some(ref url) = update.file_url {
            require(url, "File URL")?;
        }
        self.resources.update(id, update).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.resources.delete(id).await
    }

    pub async fn toggle_published(&self, resource: &Resource) -> ServiceResult<Resource> {
        self.resources
            .set_flag(&resource.id, "is_published", !resource.is_published)
            .await
    }

    pub async fn toggle_featured(&self, resource: &Resource) -> ServiceResult<Resource> {
        self.resources
            .set_flag(&resource.id, "is_featured", !resource.is_featured)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;

    fn new_resource(title: &str, category: ResourceCategory) -> NewResource {
        NewResource {
            title: title.to_string(),
            description: None,
            file_url: format!("https://cdn.example.com/{}.pdf", title.to_lowercase()),
            file_size: Some(2_400_000),
            category,
            is_featured: false,
            is_published: false,
        }
    }

    #[tokio::test]
    async fn test_filter_by_category() {
        let service = ResourceService::new(Arc::new(MemoryBackend::new()));
        service.create(&new_resource("Moon", ResourceCategory::Journals)).await.unwrap();
        service.create(&new_resource("Spreads", ResourceCategory::Guides)).await.unwrap();
        service.create(&new_resource("Shadow", ResourceCategory::Journals)).await.unwrap();

        let journals = service.list_by_category(ResourceCategory::Journals).await.unwrap();
        assert_eq!(journals.len(), 2);
        assert!(journals.iter().all(|r| r.category == ResourceCategory::Journals));
        assert!(service
            .list_by_category(ResourceCategory::Reference)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_toggle_published_leaves_featured() {
        let service = ResourceService::new(Arc::new(MemoryBackend::new()));
        let created = service.create(&new_resource("Moon", ResourceCategory::Workbooks)).await.unwrap();

        let published = service.toggle_published(&created).await.unwrap();
        assert!(published.is_published);
        assert!(!published.is_featured);
        assert_eq!(published.file_size, created.file_size);
        assert_eq!(published.file_url, created.file_url);
    }
}
