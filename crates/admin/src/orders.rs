//! Admin order list: selection, bulk status changes with one level of undo,
//! optimistic single-order status changes, tracking numbers and refunds.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tienda_core::{Order, OrderId, OrderProductDetail, OrderProductId, OrderStatus, StatusId};
use tienda_storefront::api::ApiError;
use tienda_storefront::paging::{OrderQuery, page_orders};
use tienda_storefront::repository::Repositories;
use tracing::{info, instrument, warn};

use crate::error::AdminError;

// =============================================================================
// Gateway
// =============================================================================

/// Backend calls the admin order list needs.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn all_orders(&self) -> Result<Vec<Order>, ApiError>;
    async fn update_status(&self, id: OrderId, status_id: StatusId) -> Result<Order, ApiError>;
    async fn assign_tracking(&self, id: OrderId, tracking_number: &str) -> Result<Order, ApiError>;
    async fn order_lines(&self, id: OrderId) -> Result<Vec<OrderProductDetail>, ApiError>;
    async fn delete_order_line(&self, id: OrderProductId) -> Result<(), ApiError>;
}

#[async_trait]
impl OrderGateway for Repositories {
    async fn all_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.orders.get_all(true).await
    }

    async fn update_status(&self, id: OrderId, status_id: StatusId) -> Result<Order, ApiError> {
        self.orders.update_status(id, status_id).await
    }

    async fn assign_tracking(&self, id: OrderId, tracking_number: &str) -> Result<Order, ApiError> {
        self.orders.assign_tracking(id, tracking_number).await
    }

    async fn order_lines(&self, id: OrderId) -> Result<Vec<OrderProductDetail>, ApiError> {
        self.order_products.for_order(id).await
    }

    async fn delete_order_line(&self, id: OrderProductId) -> Result<(), ApiError> {
        self.order_products.delete(id).await
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a bulk status change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub updated: Vec<OrderId>,
    pub failed: Vec<OrderId>,
    /// Selected ids missing from the loaded list; never sent.
    pub skipped: Vec<OrderId>,
}

/// Result of a refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundOutcome {
    pub order: Order,
    /// Order lines deleted so the backend puts their stock back.
    pub restocked_lines: usize,
}

// =============================================================================
// AdminOrders
// =============================================================================

/// Order list state for the admin screen.
#[derive(Debug)]
pub struct AdminOrders<G> {
    gateway: G,
    orders: Vec<Order>,
    selected: BTreeSet<OrderId>,
    /// Orders changed by the last bulk action with their previous status.
    last_bulk: Vec<(OrderId, StatusId)>,
    filter: OrderQuery,
}

impl<G: OrderGateway> AdminOrders<G> {
    /// Empty list; call [`refresh`](Self::refresh) to load.
    #[must_use]
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            orders: Vec::new(),
            selected: BTreeSet::new(),
            last_bulk: Vec::new(),
            filter: OrderQuery::default(),
        }
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.order_id == id)
    }

    /// Reload every order from the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the list is left empty.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<(), AdminError> {
        match self.gateway.all_orders().await {
            Ok(orders) => {
                self.orders = orders;
                Ok(())
            }
            Err(e) => {
                self.orders.clear();
                Err(e.into())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn select(&mut self, id: OrderId) {
        self.selected.insert(id);
    }

    pub fn deselect(&mut self, id: OrderId) {
        self.selected.remove(&id);
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    #[must_use]
    pub const fn selected(&self) -> &BTreeSet<OrderId> {
        &self.selected
    }

    // -------------------------------------------------------------------------
    // Bulk actions
    // -------------------------------------------------------------------------

    /// Set every selected order to `status`, remembering each order's
    /// previous status for [`undo_last_bulk_action`](Self::undo_last_bulk_action).
    ///
    /// The local list changes first; orders whose update fails get their
    /// old status back, are reported and left out of the undo record.
    /// Selected ids that are not loaded are skipped. The selection is
    /// cleared and the list reloaded afterwards; a failed reload is logged.
    ///
    /// # Errors
    ///
    /// `NothingSelected` for an empty selection.
    #[instrument(skip(self), fields(selected = self.selected.len()))]
    pub async fn mark_selected_as(&mut self, status: OrderStatus) -> Result<BulkOutcome, AdminError> {
        if self.selected.is_empty() {
            return Err(AdminError::NothingSelected);
        }

        let ids: Vec<OrderId> = self.selected.iter().copied().collect();
        let mut outcome = BulkOutcome::default();
        let mut previous = Vec::with_capacity(ids.len());
        for id in ids {
            match self.set_local_status(id, status.id()) {
                Some(before) => previous.push((id, before)),
                None => {
                    warn!(order_id = %id, "Selected order is not loaded, skipping");
                    outcome.skipped.push(id);
                }
            }
        }

        let mut undo = Vec::new();
        for (id, before) in previous {
            match self.gateway.update_status(id, status.id()).await {
                Ok(_) => {
                    outcome.updated.push(id);
                    undo.push((id, before));
                }
                Err(e) => {
                    warn!(order_id = %id, error = %e, "Bulk status change failed");
                    self.set_local_status(id, before);
                    outcome.failed.push(id);
                }
            }
        }
        self.last_bulk = undo;
        info!(
            status = status.label(),
            updated = outcome.updated.len(),
            failed = outcome.failed.len(),
            skipped = outcome.skipped.len(),
            "Bulk status change"
        );

        self.clear_selection();
        self.reload_after_bulk().await;
        Ok(outcome)
    }

    async fn reload_after_bulk(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Reload after bulk action failed");
        }
    }

    /// Mark the selected orders as shipped.
    ///
    /// # Errors
    ///
    /// See [`mark_selected_as`](Self::mark_selected_as).
    pub async fn mark_selected_as_shipped(&mut self) -> Result<BulkOutcome, AdminError> {
        self.mark_selected_as(OrderStatus::Shipped).await
    }

    /// Put every order of the last bulk action back to its previous status.
    ///
    /// Only one level of undo is kept; the record is consumed either way.
    /// A failed reload afterwards is logged.
    ///
    /// # Errors
    ///
    /// `NothingToUndo` when no bulk action is recorded.
    #[instrument(skip(self))]
    pub async fn undo_last_bulk_action(&mut self) -> Result<BulkOutcome, AdminError> {
        if self.last_bulk.is_empty() {
            return Err(AdminError::NothingToUndo);
        }

        let mut outcome = BulkOutcome::default();
        for (id, previous) in std::mem::take(&mut self.last_bulk) {
            match self.gateway.update_status(id, previous).await {
                Ok(_) => outcome.updated.push(id),
                Err(e) => {
                    warn!(order_id = %id, error = %e, "Undo failed for order");
                    outcome.failed.push(id);
                }
            }
        }
        info!(restored = outcome.updated.len(), "Bulk action undone");

        self.reload_after_bulk().await;
        Ok(outcome)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.last_bulk.is_empty()
    }

    // -------------------------------------------------------------------------
    // Single order
    // -------------------------------------------------------------------------

    /// Change a loaded order's status, returning the old one.
    fn set_local_status(&mut self, id: OrderId, status_id: StatusId) -> Option<StatusId> {
        self.orders
            .iter_mut()
            .find(|o| o.order_id == id)
            .map(|o| std::mem::replace(&mut o.status_id, status_id))
    }

    fn replace_local(&mut self, order: Order) {
        if let Some(slot) = self.orders.iter_mut().find(|o| o.order_id == order.order_id) {
            *slot = order;
        }
    }

    /// Change one order's status locally first, then on the backend.
    /// The local change is reverted if the backend refuses.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` for an order not in the list, or the backend error.
    #[instrument(skip(self))]
    pub async fn update_order_status_optimistic(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), AdminError> {
        let slot = self
            .orders
            .iter_mut()
            .find(|o| o.order_id == id)
            .ok_or(AdminError::OrderNotFound(id))?;
        let previous = std::mem::replace(&mut slot.status_id, status.id());

        match self.gateway.update_status(id, status.id()).await {
            Ok(order) => {
                self.replace_local(order);
                Ok(())
            }
            Err(e) => {
                warn!(order_id = %id, error = %e, "Status change failed, reverting");
                if let Some(slot) = self.orders.iter_mut().find(|o| o.order_id == id) {
                    slot.status_id = previous;
                }
                Err(e.into())
            }
        }
    }

    /// Attach a tracking number to an order.
    ///
    /// # Errors
    ///
    /// `EmptyTracking` for a blank number, or the backend error.
    #[instrument(skip(self))]
    pub async fn assign_tracking(&mut self, id: OrderId, tracking_number: &str) -> Result<Order, AdminError> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(AdminError::EmptyTracking);
        }
        let order = self.gateway.assign_tracking(id, tracking_number).await?;
        self.replace_local(order.clone());
        Ok(order)
    }

    /// Refund an order: delete its lines so the backend restocks them, then
    /// set it to Refunded.
    ///
    /// Stops at the first failed line deletion; the order keeps its status
    /// and the refund can be retried.
    ///
    /// # Errors
    ///
    /// `AlreadyRefunded` when the loaded order is already refunded, or the
    /// backend error.
    #[instrument(skip(self))]
    pub async fn refund_order(&mut self, id: OrderId) -> Result<RefundOutcome, AdminError> {
        if self
            .order(id)
            .is_some_and(|o| o.status() == Some(OrderStatus::Refunded))
        {
            return Err(AdminError::AlreadyRefunded(id));
        }

        let lines = self.gateway.order_lines(id).await?;
        for line in &lines {
            self.gateway.delete_order_line(line.id).await?;
        }
        let order = self
            .gateway
            .update_status(id, OrderStatus::Refunded.id())
            .await?;
        info!(order_id = %id, lines = lines.len(), "Order refunded");

        self.replace_local(order.clone());
        Ok(RefundOutcome {
            order,
            restocked_lines: lines.len(),
        })
    }

    // -------------------------------------------------------------------------
    // Filtering
    // -------------------------------------------------------------------------

    /// Set the filter used by [`page`](Self::page).
    pub fn set_filter(&mut self, status: Option<OrderStatus>, search: Option<String>) {
        self.filter = OrderQuery {
            status: status.map(OrderStatus::id),
            search,
        };
    }

    #[must_use]
    pub const fn filter(&self) -> &OrderQuery {
        &self.filter
    }

    /// One filtered page (1-based), newest first.
    #[must_use]
    pub fn page(&self, page: usize, size: usize) -> Vec<Order> {
        page_orders(&self.orders, &self.filter, page, size)
    }

    /// Number of loaded orders per status id.
    #[must_use]
    pub fn status_counts(&self) -> BTreeMap<StatusId, usize> {
        let mut counts = BTreeMap::new();
        for order in &self.orders {
            *counts.entry(order.status_id).or_insert(0) += 1;
        }
        counts
    }
}
