//! In-memory shopping cart.
//!
//! Stock is only checked against the product snapshot held in each line;
//! the backend has the final word at checkout. After every successful
//! mutation each line satisfies `0 < quantity <= product.stock`.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tienda_core::{CreateOrderProductRequest, OrderId, OrderProductId, Product, ProductId};
use tracing::{debug, instrument, warn};

use crate::api::ApiError;
use crate::events::EventBus;
use crate::repository::ResourceRepository;
use crate::store::{LocalStore, StoreError};

/// Errors from cart mutations. The cart is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("No hay stock disponible para este producto")]
    OutOfStock,

    #[error("No hay suficiente stock disponible")]
    InsufficientStock,

    #[error("La cantidad no puede ser negativa")]
    NegativeQuantity,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// Where fresh product data comes from.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Current product state from the backend.
    async fn product(&self, id: ProductId) -> Result<Product, ApiError>;
}

#[async_trait]
impl ProductSource for ResourceRepository<Product> {
    async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.fetch_by_id(id).await
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
    /// `product_id -> order_product_id` for lines already sent to the backend.
    order_products: HashMap<ProductId, OrderProductId>,
    events: Option<EventBus>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cart that announces additions on `events`.
    #[must_use]
    pub fn with_events(events: EventBus) -> Self {
        Self {
            events: Some(events),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.items.iter().position(|i| i.product.id == product_id)
    }

    /// Add one unit of `product`.
    ///
    /// # Errors
    ///
    /// `OutOfStock` when the product has no stock, `InsufficientStock` when
    /// the line already holds every available unit.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_to_cart(&mut self, product: &Product) -> Result<(), CartError> {
        if !product.in_stock() {
            return Err(CartError::OutOfStock);
        }

        match self.position(product.id) {
            Some(index) => {
                let Some(line) = self.items.get_mut(index) else {
                    return Err(CartError::OutOfStock);
                };
                if line.quantity >= product.available() {
                    return Err(CartError::InsufficientStock);
                }
                line.product = product.clone();
                line.quantity += 1;
            }
            None => self.items.push(CartItem {
                product: product.clone(),
                quantity: 1,
            }),
        }

        if let Some(events) = &self.events {
            events.snackbar("Producto agregado al carrito");
        }
        Ok(())
    }

    /// Set a line's quantity; `0` removes the line.
    ///
    /// Unknown products are ignored.
    ///
    /// # Errors
    ///
    /// `NegativeQuantity` for `quantity < 0`, `InsufficientStock` when it
    /// exceeds the line's stock.
    #[instrument(skip(self))]
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i32) -> Result<(), CartError> {
        let quantity = u32::try_from(quantity).map_err(|_| CartError::NegativeQuantity)?;
        let Some(index) = self.position(product_id) else {
            return Ok(());
        };

        if quantity == 0 {
            self.remove_from_cart(product_id);
            return Ok(());
        }

        if let Some(line) = self.items.get_mut(index) {
            if quantity > line.product.available() {
                return Err(CartError::InsufficientStock);
            }
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Remove a product's line and its order line mapping.
    pub fn remove_from_cart(&mut self, product_id: ProductId) {
        self.items.retain(|i| i.product.id != product_id);
        self.order_products.remove(&product_id);
    }

    /// Empty the cart and forget every order line mapping.
    pub fn clear_cart(&mut self) {
        self.items.clear();
        self.order_products.clear();
    }

    /// Σ price × quantity.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Remember the backend order line created for a product.
    pub fn set_order_product_id(&mut self, product_id: ProductId, order_product_id: OrderProductId) {
        self.order_products.insert(product_id, order_product_id);
    }

    #[must_use]
    pub fn order_product_id(&self, product_id: ProductId) -> Option<OrderProductId> {
        self.order_products.get(&product_id).copied()
    }

    /// Order line request for `item` under `order_id`.
    #[must_use]
    pub fn to_order_product_request(item: &CartItem, order_id: OrderId) -> CreateOrderProductRequest {
        CreateOrderProductRequest {
            order_id,
            product_id: item.product.id,
            quantity: i32::try_from(item.quantity).unwrap_or(i32::MAX),
            price: item.product.price,
        }
    }

    // =========================================================================
    // Stock refresh
    // =========================================================================

    /// Replace one line's product snapshot with the backend's, clamping the
    /// quantity to the new stock. A line whose stock dropped to zero is
    /// removed along with its order-line mapping.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the line is left as it was.
    #[instrument(skip(self, source))]
    pub async fn refresh_product_stock(
        &mut self,
        source: &dyn ProductSource,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        let fresh = source.product(product_id).await?;
        let Some(index) = self.position(product_id) else {
            return Ok(());
        };
        let available = fresh.available();
        if available == 0 {
            debug!(%product_id, "Removed line without stock");
            self.items.remove(index);
            self.order_products.remove(&product_id);
        } else if let Some(line) = self.items.get_mut(index) {
            line.quantity = line.quantity.min(available);
            line.product = fresh;
        }
        Ok(())
    }

    /// Refresh every line, clamping quantities to the new stock.
    ///
    /// Lines whose stock dropped to zero are removed. Products that fail to
    /// refresh keep their previous line. Returns the ids that failed.
    #[instrument(skip_all, fields(lines = self.items.len()))]
    pub async fn refresh_all_products_stock(&mut self, source: &dyn ProductSource) -> Vec<ProductId> {
        let mut fresh: HashMap<ProductId, Product> = HashMap::new();
        let mut failed = Vec::new();
        for id in self.items.iter().map(|i| i.product.id).collect::<Vec<_>>() {
            match source.product(id).await {
                Ok(product) => {
                    fresh.insert(id, product);
                }
                Err(e) => {
                    warn!(product_id = %id, error = %e, "Stock refresh failed, keeping line");
                    failed.push(id);
                }
            }
        }

        let mut removed = Vec::new();
        self.items = std::mem::take(&mut self.items)
            .into_iter()
            .filter_map(|line| match fresh.remove(&line.product.id) {
                None => Some(line),
                Some(product) => {
                    let quantity = line.quantity.min(product.available());
                    if quantity == 0 {
                        removed.push(product.id);
                        None
                    } else {
                        Some(CartItem { product, quantity })
                    }
                }
            })
            .collect();
        for id in removed {
            debug!(product_id = %id, "Removed line without stock");
            self.order_products.remove(&id);
        }
        failed
    }

    // =========================================================================
    // Local store mirror
    // =========================================================================

    /// Save the lines to the local store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn save_to(&self, store: &LocalStore) -> Result<(), StoreError> {
        store.save_cart(serde_json::to_value(&self.items)?).await
    }

    /// Restore lines saved with [`Cart::save_to`]; an unreadable blob gives
    /// an empty cart.
    pub async fn load_from(&mut self, store: &LocalStore) {
        let Some(blob) = store.cart().await else {
            return;
        };
        match serde_json::from_value::<Vec<CartItem>>(blob) {
            Ok(items) => {
                self.items = items.into_iter().filter(|i| i.quantity > 0).collect();
                self.order_products.clear();
            }
            Err(e) => warn!(error = %e, "Stored cart is unreadable, ignoring"),
        }
    }
}
