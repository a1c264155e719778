//! Tienda Core - Shared types library.
//!
//! This crate provides common types used across all Tienda components:
//! - `storefront` - REST client, cart and checkout for shoppers
//! - `admin` - Order management, refunds and client list for administrators
//! - `cli` - Command-line front end over both
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and statuses
//! - [`model`] - DTOs mirroring the backend REST resources
//! - [`validation`] - Payment form field validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod model;
pub mod types;
pub mod validation;

pub use model::*;
pub use types::*;
