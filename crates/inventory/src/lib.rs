//! Inventory domain module.
//!
//! Article snapshots as orders see them, the inventory collaborator contract,
//! and the stock bookkeeping applied after a sale. Pure domain logic; the
//! backend lives behind [`InventoryGateway`].

pub mod article;
pub mod gateway;
pub mod stock;

pub use article::{Article, ArticleType, LensPosition, LensType, ProductOrigin};
pub use gateway::{ArticleFilters, ArticlePage, ArticlePatch, ArticleQuery, InventoryGateway};
pub use stock::{StockDecrement, plan_stock_decrements};
