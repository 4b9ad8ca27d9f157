use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default turnaround shown on new products.
pub const DEFAULT_DELIVERY_TIME: &str = "24-48 hours";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    #[default]
    Standard,
    Express,
    Premium,
    Live,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 4] = [
        ProductCategory::Standard,
        ProductCategory::Express,
        ProductCategory::Premium,
        ProductCategory::Live,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Standard => "standard",
            ProductCategory::Express => "express",
            ProductCategory::Premium => "premium",
            ProductCategory::Live => "live",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductCategory::Standard => write!(f, "Standard"),
            ProductCategory::Express => write!(f, "Express"),
            ProductCategory::Premium => write!(f, "Premium"),
            ProductCategory::Live => write!(f, "Live"),
        }
    }
}

/// A reading offered for sale on the public site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: ProductCategory,
    #[serde(default)]
    pub delivery_time: Option<String>,
    #[serde(default)]
    pub is_live_reading: bool,
    /// Scheduling link for live readings.
    #[serde(default)]
    pub calendly_link: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl ReadingProduct {
    pub fn price_display(&self) -> String {
        format!("${:.2}", self.price)
    }

    pub fn delivery_display(&self) -> &str {
        self.delivery_time.as_deref().unwrap_or(DEFAULT_DELIVERY_TIME)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewReadingProduct {
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category: ProductCategory,
    pub delivery_time: Option<String>,
    pub is_live_reading: bool,
    pub calendly_link: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReadingProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option",
        default
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_live_reading: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendly_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_defaults() {
        let p: ReadingProduct = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "title": "Celtic Cross",
            "price": 75
        }))
        .unwrap();
        assert!(p.is_active);
        assert_eq!(p.category, ProductCategory::Standard);
        assert_eq!(p.price, dec!(75));
        assert_eq!(p.price_display(), "$75.00");
        assert_eq!(p.delivery_display(), "24-48 hours");
    }
}
