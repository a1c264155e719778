//! Repositories over the backend REST resources.
//!
//! [`ResourceRepository`] covers the plain list/get/create/update/delete
//! resources and caches their full list in a [`ListCache`]. Resources with
//! extra endpoints get a dedicated repository that wraps it.

mod email_verification;
mod order_products;
mod orders;
mod payment_details;
mod settings;
mod users;

pub use email_verification::EmailVerificationRepository;
pub use order_products::OrderProductRepository;
pub use orders::OrderRepository;
pub use payment_details::PaymentDetailRepository;
pub use settings::SettingsRepository;
pub use users::UserRepository;

use std::collections::HashSet;
use std::fmt::Display;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tienda_core::{
    Category, CategoryId, CategoryProduct, CategoryProductId, Order, OrderDetail, OrderDetailId, OrderId, Payment, PaymentId, Product,
    ProductId, RoleId, RoleRecord, Setting, SettingId, Status, StatusId, User, UserId,
};
use tracing::instrument;

use crate::api::{ApiClient, ApiError};
use crate::cache::ListCache;
use crate::config::ClientConfig;

// =============================================================================
// Resource Trait
// =============================================================================

/// A backend resource served under `api/<name>` with numeric ids.
pub trait Resource: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Id newtype.
    type Id: Copy + Display + PartialEq + Send + Sync + std::fmt::Debug;

    /// Collection path relative to the base URL.
    const PATH: &'static str;

    /// Id of this item.
    fn id(&self) -> Self::Id;
}

macro_rules! impl_resource {
    ($ty:ty, $id:ty, $path:literal, $field:ident) => {
        impl Resource for $ty {
            type Id = $id;
            const PATH: &'static str = $path;

            fn id(&self) -> Self::Id {
                self.$field
            }
        }
    };
}

impl_resource!(Product, ProductId, "api/products", id);
impl_resource!(Order, OrderId, "api/orders", order_id);
impl_resource!(OrderDetail, OrderDetailId, "api/order-details", detail_order_id);
impl_resource!(Payment, PaymentId, "api/payments", id);
impl_resource!(Setting, SettingId, "api/settings", id);
impl_resource!(User, UserId, "api/users", id);
impl_resource!(Status, StatusId, "api/statuses", id);
impl_resource!(Category, CategoryId, "api/categories", id);
impl_resource!(CategoryProduct, CategoryProductId, "api/categories-products", id);
impl_resource!(RoleRecord, RoleId, "api/roles", id);

// =============================================================================
// ResourceRepository
// =============================================================================

/// Cached CRUD access to one [`Resource`].
#[derive(Debug, Clone)]
pub struct ResourceRepository<R: Resource> {
    client: ApiClient,
    cache: ListCache<R>,
}

impl<R: Resource> ResourceRepository<R> {
    /// Create a repository whose list snapshot lives for `cache_ttl`.
    #[must_use]
    pub fn new(client: ApiClient, cache_ttl: Duration) -> Self {
        Self {
            client,
            cache: ListCache::new(R::PATH, cache_ttl),
        }
    }

    /// Underlying API client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    fn item_path(id: R::Id) -> String {
        format!("{}/{id}", R::PATH)
    }

    /// List every item, from the cache unless `force`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails and no valid snapshot exists.
    #[instrument(skip(self), fields(resource = R::PATH))]
    pub async fn get_all(&self, force: bool) -> Result<Vec<R>, ApiError> {
        self.cache
            .get_or_fetch(force, || self.client.get::<Vec<R>>(R::PATH))
            .await
    }

    /// Get one item, answered from the snapshot when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is not cached and the backend call fails.
    #[instrument(skip(self), fields(resource = R::PATH))]
    pub async fn get_by_id(&self, id: R::Id) -> Result<R, ApiError> {
        if let Some(item) = self.cache.find(|item| item.id() == id).await {
            return Ok(item);
        }
        self.fetch_by_id(id).await
    }

    /// Get one item straight from the backend, ignoring the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self), fields(resource = R::PATH))]
    pub async fn fetch_by_id(&self, id: R::Id) -> Result<R, ApiError> {
        self.client.get(&Self::item_path(id)).await
    }

    /// Create an item and invalidate the list snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, item), fields(resource = R::PATH))]
    pub async fn create(&self, item: &R) -> Result<R, ApiError> {
        let created = self.client.post(R::PATH, item).await?;
        self.cache.invalidate().await;
        Ok(created)
    }

    /// Replace an item and invalidate the list snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, item), fields(resource = R::PATH))]
    pub async fn update(&self, id: R::Id, item: &R) -> Result<R, ApiError> {
        let updated = self.client.put(&Self::item_path(id), item).await?;
        self.cache.invalidate().await;
        Ok(updated)
    }

    /// Delete an item and invalidate the list snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self), fields(resource = R::PATH))]
    pub async fn delete(&self, id: R::Id) -> Result<(), ApiError> {
        self.client.delete(&Self::item_path(id)).await?;
        self.cache.invalidate().await;
        Ok(())
    }

    /// Drop the cached list.
    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}

// =============================================================================
// Repositories
// =============================================================================

/// Every repository the client uses, sharing one [`ApiClient`].
#[derive(Debug, Clone)]
pub struct Repositories {
    pub products: ResourceRepository<Product>,
    pub orders: OrderRepository,
    pub order_products: OrderProductRepository,
    pub order_details: ResourceRepository<OrderDetail>,
    pub payments: ResourceRepository<Payment>,
    pub payment_details: PaymentDetailRepository,
    pub settings: SettingsRepository,
    pub users: UserRepository,
    pub statuses: ResourceRepository<Status>,
    pub categories: ResourceRepository<Category>,
    pub category_products: ResourceRepository<CategoryProduct>,
    pub roles: ResourceRepository<RoleRecord>,
    pub email_verification: EmailVerificationRepository,
}

impl Repositories {
    /// Build every repository from one client and cache TTL.
    #[must_use]
    pub fn new(client: &ApiClient, cache_ttl: Duration) -> Self {
        Self {
            products: ResourceRepository::new(client.clone(), cache_ttl),
            orders: OrderRepository::new(client.clone(), cache_ttl),
            order_products: OrderProductRepository::new(client.clone()),
            order_details: ResourceRepository::new(client.clone(), cache_ttl),
            payments: ResourceRepository::new(client.clone(), cache_ttl),
            payment_details: PaymentDetailRepository::new(client.clone()),
            settings: SettingsRepository::new(client.clone(), cache_ttl),
            users: UserRepository::new(client.clone(), cache_ttl),
            statuses: ResourceRepository::new(client.clone(), cache_ttl),
            categories: ResourceRepository::new(client.clone(), cache_ttl),
            category_products: ResourceRepository::new(client.clone(), cache_ttl),
            roles: ResourceRepository::new(client.clone(), cache_ttl),
            email_verification: EmailVerificationRepository::new(client.clone()),
        }
    }

    /// Build the client and every repository from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = ApiClient::new(&config.api, config.retry)?;
        Ok(Self::new(&client, config.cache_ttl))
    }

    /// Products linked to `category`, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns an error if either list cannot be loaded.
    #[instrument(skip(self))]
    pub async fn products_in_category(
        &self,
        category: CategoryId,
        force: bool,
    ) -> Result<Vec<Product>, ApiError> {
        let linked: HashSet<ProductId> = self
            .category_products
            .get_all(force)
            .await?
            .into_iter()
            .filter(|link| link.category_id == category)
            .map(|link| link.product_id)
            .collect();
        if linked.is_empty() {
            return Ok(Vec::new());
        }
        let mut products = self.products.get_all(force).await?;
        products.retain(|p| linked.contains(&p.id));
        Ok(products)
    }

    /// Category of a product, if it has been put in one.
    ///
    /// # Errors
    ///
    /// Returns an error if either list cannot be loaded.
    pub async fn category_of(&self, product: ProductId) -> Result<Option<Category>, ApiError> {
        let Some(link) = self
            .category_products
            .get_all(false)
            .await?
            .into_iter()
            .find(|link| link.product_id == product)
        else {
            return Ok(None);
        };
        self.categories.get_by_id(link.category_id).await.map(Some)
    }
}
