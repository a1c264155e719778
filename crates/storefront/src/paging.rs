//! Client-side paging over the cached order list.
//!
//! The backend has no paged order endpoint, so pages are cut from the full
//! list held by [`OrderRepository`]'s cache.

use tienda_core::{Order, OrderStatus, StatusId};
use tracing::{debug, instrument};

use crate::api::ApiError;
use crate::repository::OrderRepository;

/// Filter applied before paging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Keep only orders with this status id.
    pub status: Option<StatusId>,
    /// Case-insensitive match against order id, user id and date.
    pub search: Option<String>,
}

impl OrderQuery {
    /// Whether `order` passes the filter.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status
            && order.status_id != status
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                order.order_id.to_string().contains(&term)
                    || order.user_id.to_string().contains(&term)
                    || order.date_order.to_lowercase().contains(&term)
            }
        }
    }
}

/// Filter, sort newest first and slice 1-based `page` of `size`.
///
/// Page 0 is treated as page 1; a page past the end is empty.
#[must_use]
pub fn page_orders(orders: &[Order], query: &OrderQuery, page: usize, size: usize) -> Vec<Order> {
    let mut matching: Vec<&Order> = orders.iter().filter(|o| query.matches(o)).collect();
    matching.sort_by(|a, b| b.order_id.as_i64().cmp(&a.order_id.as_i64()));

    let start = page.max(1).saturating_sub(1).saturating_mul(size);
    matching
        .into_iter()
        .skip(start)
        .take(size)
        .cloned()
        .collect()
}

/// One loaded page and the keys of its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// `None` on the first page.
    pub prev_key: Option<usize>,
    /// `None` once a short page came back.
    pub next_key: Option<usize>,
}

impl<T> Page<T> {
    /// Key to reload from when this page is the closest to the anchor.
    #[must_use]
    pub fn refresh_key(&self) -> Option<usize> {
        self.prev_key
            .map(|k| k + 1)
            .or_else(|| self.next_key.and_then(|k| k.checked_sub(1)))
    }
}

/// Incremental loader of order pages.
#[derive(Debug, Clone)]
pub struct OrderPager {
    orders: OrderRepository,
    status: Option<OrderStatus>,
    search: Option<String>,
}

impl OrderPager {
    #[must_use]
    pub const fn new(orders: OrderRepository, status: Option<OrderStatus>, search: Option<String>) -> Self {
        Self {
            orders,
            status,
            search,
        }
    }

    /// Load the page at `key` (first page when `None`). A `size` of 0
    /// gives an empty last page without touching the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the order list cannot be loaded.
    #[instrument(skip(self))]
    pub async fn load(&self, key: Option<usize>, size: usize) -> Result<Page<Order>, ApiError> {
        let page = key.unwrap_or(1).max(1);
        let prev_key = (page > 1).then(|| page - 1);
        if size == 0 {
            return Ok(Page {
                data: Vec::new(),
                prev_key,
                next_key: None,
            });
        }

        let data = self
            .orders
            .get_paged(page, size, self.status, self.search.as_deref())
            .await?;
        debug!(page, count = data.len(), "Loaded order page");

        let next_key = if data.len() < size { None } else { Some(page + 1) };
        Ok(Page {
            data,
            prev_key,
            next_key,
        })
    }

    /// Key to restart from after invalidation, given the page closest to
    /// the last visible position.
    #[must_use]
    pub fn refresh_key<T>(anchor_page: Option<&Page<T>>) -> Option<usize> {
        anchor_page.and_then(Page::refresh_key)
    }
}
