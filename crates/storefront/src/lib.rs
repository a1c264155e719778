//! Tienda Suplementos storefront client.
//!
//! REST repositories with retry and list caching, plus the shopper-side
//! services built on them: cart, checkout, order paging, payment methods
//! and the login session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cache;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod events;
pub mod paging;
pub mod payments;
pub mod repository;
pub mod store;
