use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// A catalog product as returned by `/api/products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Backend id, `0` before creation.
    #[serde(default)]
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Units available. The backend may report negative stock after
    /// concurrent sales, so this is signed.
    pub stock: i32,
    pub url_image: String,
}

impl Product {
    /// Whether at least one unit can be sold.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Stock as an unsigned quantity, negative stock counting as zero.
    #[must_use]
    pub fn available(&self) -> u32 {
        u32::try_from(self.stock).unwrap_or(0)
    }
}
