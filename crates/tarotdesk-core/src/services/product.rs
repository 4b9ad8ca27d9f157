use std::sync::Arc;

use rust_decimal::Decimal;

use super::error::require;
use super::{ServiceError, ServiceResult, Table};
use crate::api::{Backend, Query};
use crate::models::{NewReadingProduct, ReadingProduct, ReadingProductUpdate};

pub const READING_PRODUCTS_TABLE: &str = "reading_products";

fn check_price(price: Decimal) -> ServiceResult<()> {
    if price <= Decimal::ZERO {
        return Err(ServiceError::Validation("Price must be greater than zero".to_string()));
    }
    Ok(())
}

/// One past the highest sort order in use.
pub fn next_sort_order(products: &[ReadingProduct]) -> i32 {
    products.iter().map(|p| p.sort_order).max().map_or(1, |max| max + 1)
}

#[derive(Clone)]
pub struct ReadingProductService {
    products: Table,
}

impl ReadingProductService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            products: Table::new(backend, READING_PRODUCTS_TABLE, "Product"),
        }
    }

    pub async fn list(&self) -> ServiceResult<Vec<ReadingProduct>> {
        self.products.list(&Query::new().asc("sort_order")).await
    }

    /// Products shown on the public booking page
    pub async fn list_active(&self) -> ServiceResult<Vec<ReadingProduct>> {
        self.products
            .list(&Query::new().eq("is_active", true).asc("sort_order"))
            .await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<ReadingProduct> {
        self.products.get(id).await
    }

    pub async fn create(&self, product: &NewReadingProduct) -> ServiceResult<ReadingProduct> {
        require(&product.title, "Title")?;
        check_price(product.price)?;
        self.products.insert(product).await
    }

    pub async fn update(&self, id: &str, update: &ReadingProductUpdate) -> ServiceResult<ReadingProduct> {
        if let Some(ref title) = update.title {
            require(title, "Title")?;
        }
        if let Some(price) = update.price {
            check_price(price)?;
        }
        self.products.update(id, update).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.products.delete(id).await
    }

    pub async fn toggle_active(&self, product: &ReadingProduct) -> ServiceResult<ReadingProduct> {
        self.products
            .set_flag(&product.id, "is_active", !product.is_active)
            .await
    }

    pub async fn next_sort_order(&self) -> ServiceResult<i32> {
        Ok(next_sort_order(&self.list().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::models::ProductCategory;
    use rust_decimal_macros::dec;

    fn new_product(title: &str, price: Decimal, sort_order: i32) -> NewReadingProduct {
        NewReadingProduct {
            title: title.to_string(),
            description: None,
            price,
            image_url: None,
            category: ProductCategory::Standard,
            delivery_time: Some("24-48 hours".to_string()),
            is_live_reading: false,
            calendly_link: None,
            sort_order,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_price_and_title_required() {
        let service = ReadingProductService::new(Arc::new(MemoryBackend::new()));
        let err = service.create(&new_product("Celtic Cross", dec!(0), 1)).await.unwrap_err();
        assert_eq!(err.to_string(), "Price must be greater than zero");
        assert!(service.create(&new_product("", dec!(35), 1)).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_sorted_and_next_sort_order() {
        let service = ReadingProductService::new(Arc::new(MemoryBackend::new()));
        assert_eq!(service.next_sort_order().await.unwrap(), 1);

        service.create(&new_product("In-Depth", dec!(125), 3)).await.unwrap();
        service.create(&new_product("Express", dec!(35), 1)).await.unwrap();

        let titles: Vec<_> = service.list().await.unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Express", "In-Depth"]);
        assert_eq!(service.next_sort_order().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_toggle_active_leaves_price() {
        let service = ReadingProductService::new(Arc::new(MemoryBackend::new()));
        let created = service.create(&new_product("Love Reading", dec!(75), 1)).await.unwrap();

        let hidden = service.toggle_active(&created).await.unwrap();
        assert!(!hidden.is_active);
        assert_eq!(hidden.price, dec!(75));
        assert_eq!(hidden.sort_order, 1);
        assert!(service.list_active().await.unwrap().is_empty());
    }
}
