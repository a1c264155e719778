//! Tienda Suplementos admin library.
//!
//! Order management for administrators (bulk status changes with undo,
//! tracking numbers, refunds), CSV export and the client list.
//!
//! # Security
//!
//! Everything here changes other shoppers' orders. Front ends must only
//! expose it to sessions whose user has the admin role.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod clients;
pub mod error;
pub mod export;
pub mod orders;

pub use error::AdminError;
