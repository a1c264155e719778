//! Checkout: turn cart lines into a backend order.
//!
//! The order header is created first, then one order line per cart line,
//! sequentially. Creating a line reserves stock on the backend, so a failed
//! checkout either reports the lines that failed ([`Checkout::process_checkout`])
//! or undoes everything it created ([`Checkout::process_checkout_with_rollback`]).

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;
use tienda_core::{
    CreateOrderProductRequest, Order, OrderId, OrderProductDetail, OrderProductId,
    UpdateOrderProductRequest, UserId,
};
use tracing::{info, instrument, warn};

use crate::api::ApiError;
use crate::cart::{Cart, CartItem};
use crate::repository::Repositories;

/// Errors that abort a checkout operation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("El carrito está vacío")]
    EmptyCart,

    #[error("Error durante el checkout: {}", .0.user_message())]
    Order(#[source] ApiError),

    #[error("No hay suficiente stock para la cantidad solicitada")]
    InsufficientStock(#[source] ApiError),

    #[error("Error al actualizar cantidad: {}", .0.order_line_message())]
    UpdateLine(#[source] ApiError),

    #[error("Error al eliminar producto: {}", .0.order_line_message())]
    RemoveLine(#[source] ApiError),
}

/// Backend calls checkout needs.
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    async fn create_order(&self, order: &Order) -> Result<Order, ApiError>;
    async fn delete_order(&self, id: OrderId) -> Result<(), ApiError>;
    async fn create_order_product(
        &self,
        request: &CreateOrderProductRequest,
    ) -> Result<OrderProductDetail, ApiError>;
    async fn update_order_product(
        &self,
        id: OrderProductId,
        request: &UpdateOrderProductRequest,
    ) -> Result<OrderProductDetail, ApiError>;
    async fn delete_order_product(&self, id: OrderProductId) -> Result<(), ApiError>;
}

#[async_trait]
impl CheckoutBackend for Repositories {
    async fn create_order(&self, order: &Order) -> Result<Order, ApiError> {
        self.orders.create(order).await
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), ApiError> {
        self.orders.delete(id).await
    }

    async fn create_order_product(
        &self,
        request: &CreateOrderProductRequest,
    ) -> Result<OrderProductDetail, ApiError> {
        self.order_products.create(request).await
    }

    async fn update_order_product(
        &self,
        id: OrderProductId,
        request: &UpdateOrderProductRequest,
    ) -> Result<OrderProductDetail, ApiError> {
        self.order_products.update(id, request).await
    }

    async fn delete_order_product(&self, id: OrderProductId) -> Result<(), ApiError> {
        self.order_products.delete(id).await
    }
}

/// A cart line the backend refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub item: CartItem,
    pub message: String,
}

/// Outcome of a checkout attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutResult {
    pub success: bool,
    /// Order that was kept on the backend, if any.
    pub order_id: Option<OrderId>,
    pub created_order_products: Vec<OrderProductDetail>,
    pub failed_items: Vec<FailedItem>,
}

impl CheckoutResult {
    /// Shopper-facing summary of the failed lines, `None` on success.
    #[must_use]
    pub fn failure_summary(&self) -> Option<String> {
        if self.failed_items.is_empty() {
            return None;
        }
        let names: Vec<&str> = self
            .failed_items
            .iter()
            .map(|f| f.item.product.name.as_str())
            .collect();
        Some(format!(
            "Algunos productos no pudieron procesarse: {}",
            names.join(", ")
        ))
    }

    /// Map every created line back to its cart product.
    pub fn record_in(&self, cart: &mut Cart) {
        for line in &self.created_order_products {
            let product_id = line.product_id.unwrap_or(line.product.id);
            cart.set_order_product_id(product_id, line.id);
        }
    }
}

fn failure_message(item: &CartItem, err: &ApiError) -> String {
    if err.is_stock_conflict() {
        format!("Stock insuficiente para {}", item.product.name)
    } else {
        format!(
            "Error al procesar {}: {}",
            item.product.name,
            err.order_line_message()
        )
    }
}

/// Checkout service over a [`CheckoutBackend`].
#[derive(Debug, Clone)]
pub struct Checkout<B> {
    backend: B,
}

impl<B: CheckoutBackend> Checkout<B> {
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    fn new_order(items: &[CartItem], user_id: UserId, placed_at: NaiveDateTime) -> Order {
        let total: Decimal = items.iter().map(CartItem::subtotal).sum();
        let quantity: u32 = items.iter().map(|i| i.quantity).sum();
        Order::pending(
            user_id,
            total,
            i32::try_from(quantity).unwrap_or(i32::MAX),
            placed_at,
        )
    }

    async fn create_order(&self, items: &[CartItem], user_id: UserId) -> Result<Order, CheckoutError> {
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let order = Self::new_order(items, user_id, Local::now().naive_local());
        let created = self
            .backend
            .create_order(&order)
            .await
            .map_err(CheckoutError::Order)?;
        info!(order_id = %created.order_id, lines = items.len(), "Order created");
        Ok(created)
    }

    /// Create the order and every line, collecting failed lines.
    ///
    /// The order is kept even when some lines fail; `success` is true only
    /// when every line was created.
    ///
    /// # Errors
    ///
    /// `EmptyCart` for no items, `Order` if the order header cannot be created.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn process_checkout(
        &self,
        items: &[CartItem],
        user_id: UserId,
    ) -> Result<CheckoutResult, CheckoutError> {
        let order = self.create_order(items, user_id).await?;

        let mut created = Vec::new();
        let mut failed = Vec::new();
        for item in items {
            let request = Cart::to_order_product_request(item, order.order_id);
            match self.backend.create_order_product(&request).await {
                Ok(line) => created.push(line),
                Err(e) => {
                    warn!(product_id = %item.product.id, error = %e, "Order line failed");
                    failed.push(FailedItem {
                        item: item.clone(),
                        message: failure_message(item, &e),
                    });
                }
            }
        }

        Ok(CheckoutResult {
            success: failed.is_empty(),
            order_id: Some(order.order_id),
            created_order_products: created,
            failed_items: failed,
        })
    }

    /// Create the order and every line; on the first failure delete the
    /// lines created so far and then the order.
    ///
    /// Cleanup is best effort: a failed delete is logged and skipped.
    ///
    /// # Errors
    ///
    /// `EmptyCart` for no items, `Order` if the order header cannot be created.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn process_checkout_with_rollback(
        &self,
        items: &[CartItem],
        user_id: UserId,
    ) -> Result<CheckoutResult, CheckoutError> {
        let order = self.create_order(items, user_id).await?;

        let mut created: Vec<OrderProductDetail> = Vec::new();
        for item in items {
            let request = Cart::to_order_product_request(item, order.order_id);
            match self.backend.create_order_product(&request).await {
                Ok(line) => created.push(line),
                Err(e) => {
                    warn!(product_id = %item.product.id, error = %e, "Order line failed, rolling back");
                    let failure = FailedItem {
                        item: item.clone(),
                        message: failure_message(item, &e),
                    };
                    self.rollback(order.order_id, &created).await;
                    return Ok(CheckoutResult {
                        success: false,
                        order_id: None,
                        created_order_products: Vec::new(),
                        failed_items: vec![failure],
                    });
                }
            }
        }

        Ok(CheckoutResult {
            success: true,
            order_id: Some(order.order_id),
            created_order_products: created,
            failed_items: Vec::new(),
        })
    }

    async fn rollback(&self, order_id: OrderId, lines: &[OrderProductDetail]) {
        for line in lines {
            if let Err(e) = self.backend.delete_order_product(line.id).await {
                warn!(order_product_id = %line.id, error = %e, "Rollback: failed to delete order line");
            }
        }
        if let Err(e) = self.backend.delete_order(order_id).await {
            warn!(%order_id, error = %e, "Rollback: failed to delete order");
        } else {
            info!(%order_id, "Checkout rolled back");
        }
    }

    /// Change the quantity of an existing order line.
    ///
    /// # Errors
    ///
    /// `InsufficientStock` on a stock conflict, `UpdateLine` otherwise.
    #[instrument(skip(self))]
    pub async fn update_order_product_quantity(
        &self,
        id: OrderProductId,
        quantity: i32,
    ) -> Result<OrderProductDetail, CheckoutError> {
        self.backend
            .update_order_product(id, &UpdateOrderProductRequest::quantity(quantity))
            .await
            .map_err(|e| {
                if e.is_stock_conflict() {
                    CheckoutError::InsufficientStock(e)
                } else {
                    CheckoutError::UpdateLine(e)
                }
            })
    }

    /// Delete an order line; the backend restores its stock.
    ///
    /// # Errors
    ///
    /// `RemoveLine` if the backend call fails.
    #[instrument(skip(self))]
    pub async fn remove_order_product(&self, id: OrderProductId) -> Result<(), CheckoutError> {
        self.backend
            .delete_order_product(id)
            .await
            .map_err(CheckoutError::RemoveLine)
    }
}
