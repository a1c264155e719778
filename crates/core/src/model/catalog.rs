use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, CategoryProductId, ProductId, RoleId, StatusId};

/// Row of `/api/statuses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub id: StatusId,
    pub name: String,
}

/// Row of `/api/categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Row of `/api/categories-products`: puts one product in one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProduct {
    #[serde(default)]
    pub id: CategoryProductId,
    pub category_id: CategoryId,
    pub product_id: ProductId,
}

/// Row of `/api/roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    #[serde(default)]
    pub id: RoleId,
    pub name: String,
}

/// `{ id, name }` reference embedded in aggregated responses
/// (a client's role, an order's status, a store's accepted payments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}
