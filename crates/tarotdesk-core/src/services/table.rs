//! Typed access to one backend table.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::{ServiceError, ServiceResult};
use crate::api::{Backend, Query};

/// A backend table plus the display name used in not-found errors.
#[derive(Clone)]
pub struct Table {
    backend: Arc<dyn Backend>,
    name: &'static str,
    entity: &'static str,
}

impl Table {
    pub fn new(backend: Arc<dyn Backend>, name: &'static str, entity: &'static str) -> Self {
        Self {
            backend,
            name,
            entity,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn decode<T: DeserializeOwned>(&self, row: Value) -> ServiceResult<T> {
        serde_json::from_value(row).map_err(|source| ServiceError::Decode {
            table: self.name,
            source,
        })
    }

    fn encode<S: Serialize>(&self, value: &S) -> ServiceResult<Value> {
        serde_json::to_value(value).map_err(|source| ServiceError::Decode {
            table: self.name,
            source,
        })
    }

    pub async fn list<T: DeserializeOwned>(&self, query: &Query) -> ServiceResult<Vec<T>> {
        let rows = self.backend.select(self.name, query).await?;
        rows.into_iter().map(|row| self.decode(row)).collect()
    }

    pub async fn find<T: DeserializeOwned>(&self, query: &Query) -> ServiceResult<Option<T>> {
        let query = query.clone().limit(1);
        let rows = self.backend.select(self.name, &query).await?;
        rows.into_iter().next().map(|row| self.decode(row)).transpose()
    }

    pub async fn get<T: DeserializeOwned>(&self, id: &str) -> ServiceResult<T> {
        self.find(&Query::by_id(id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(self.entity.to_string()))
    }

    pub async fn count(&self, query: &Query) -> ServiceResult<usize> {
        Ok(self.backend.count(self.name, query).await?)
    }

    pub async fn insert<N: Serialize, T: DeserializeOwned>(&self, row: &N) -> ServiceResult<T> {
        let row = self.encode(row)?;
        let stored = self.backend.insert(self.name, row).await?;
        debug!(table = self.name, "Inserted row");
        self.decode(stored)
    }

    pub async fn update<U: Serialize, T: DeserializeOwned>(&self, id: &str, patch: &U) -> ServiceResult<T> {
        let patch = self.encode(patch)?;
        self.patch(id, patch).await
    }

    /// Send a patch holding only `column`, leaving every other field as stored.
    pub async fn set_flag<T: DeserializeOwned>(&self, id: &str, column: &str, value: bool) -> ServiceResult<T> {
        self.patch(id, json!({ column: value })).await
    }

    async fn patch<T: DeserializeOwned>(&self, id: &str, patch: Value) -> ServiceResult<T> {
        let rows = self.backend.update(self.name, &Query::by_id(id), patch).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(self.entity.to_string()))?;
        debug!(table = self.name, id = id, "Updated row");
        self.decode(row)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let removed = self.backend.delete(self.name, &Query::by_id(id)).await?;
        if removed == 0 {
            return Err(ServiceError::NotFound(self.entity.to_string()));
        }
        debug!(table = self.name, id = id, "Deleted row");
        Ok(())
    }

    pub async fn delete_where(&self, query: &Query) -> ServiceResult<u64> {
        Ok(self.backend.delete(self.name, query).await?)
    }

    /// Every row as raw JSON, for dumps
    pub async fn dump(&self) -> ServiceResult<Vec<Value>> {
        Ok(self.backend.select(self.name, &Query::new()).await?)
    }
}
