//! Inventory collaborator contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use optica_core::{Amount, ArticleId, GatewayError};

use crate::article::{Article, ArticleType, LensType};

/// Optional narrowing of an article listing. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleFilters {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub article_type: Option<ArticleType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens_type: Option<LensType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_sunglasses: Option<bool>,
}

/// One page request against the article catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleQuery {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<ArticleFilters>,
}

impl ArticleQuery {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size,
            query: None,
            filters: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = (!query.trim().is_empty()).then_some(query);
        self
    }

    pub fn with_filters(mut self, filters: ArticleFilters) -> Self {
        self.filters = Some(filters);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePage {
    pub data: Vec<Article>,
    pub total: u64,
}

/// Partial article update. Unset fields are omitted from the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ArticlePatch {
    pub fn stock(stock: u32) -> Self {
        Self {
            stock: Some(stock),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the set fields onto `article`.
    pub fn apply_to(&self, article: &mut Article) {
        if let Some(name) = &self.name {
            article.name = name.clone();
        }
        if let Some(price) = self.price {
            article.price = price;
        }
        if let Some(stock) = self.stock {
            article.stock = stock;
        }
        if let Some(brand) = &self.brand {
            article.brand = Some(brand.clone());
        }
        if let Some(model) = &self.model {
            article.model = Some(model.clone());
        }
    }
}

/// Backend inventory endpoints consumed by the order core.
#[async_trait]
pub trait InventoryGateway: Send + Sync {
    async fn get_articles(&self, query: &ArticleQuery) -> Result<ArticlePage, GatewayError>;

    async fn update_article(
        &self,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> Result<Article, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stock_patch_serializes_only_stock() {
        let json = serde_json::to_value(ArticlePatch::stock(3)).unwrap();
        assert_eq!(json, serde_json::json!({ "stock": 3 }));
    }

    #[test]
    fn patch_applies_set_fields_only() {
        let mut article = Article::new(ArticleId::new("a").unwrap(), "Estuche", dec!(100), 5);
        let patch = ArticlePatch {
            price: Some(dec!(120)),
            ..ArticlePatch::default()
        };

        patch.apply_to(&mut article);

        assert_eq!(article.price, dec!(120));
        assert_eq!(article.stock, 5);
        assert_eq!(article.name, "Estuche");
    }

    #[test]
    fn blank_search_is_dropped_from_query() {
        let query = ArticleQuery::page(0, 100).with_query("   ");
        assert_eq!(query.page, 1);
        assert_eq!(query.query, None);

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json, serde_json::json!({ "page": 1, "pageSize": 100 }));
    }
}
