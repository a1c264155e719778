//! DTOs for the store backend REST resources.
//!
//! Field names follow the backend JSON exactly. Most resources use
//! `snake_case`; a few fields (`isActive`, `orderId`, `unitPrice`, ...) keep
//! the camelCase names the backend sends and are renamed explicitly.

mod catalog;
mod email_verification;
mod order;
mod order_product;
mod payment;
mod product;
mod setting;
mod user;

pub use catalog::{Category, CategoryProduct, NamedRef, RoleRecord, Status};
pub use email_verification::{
    CallbackConfig, EmailVerificationInfo, EmailVerificationRequest, EmailVerificationResponse,
    VerificationStatusResponse,
};
pub use order::{ORDER_DATE_FORMAT, Order, OrderDetail};
pub use order_product::{CreateOrderProductRequest, OrderProductDetail, UpdateOrderProductRequest};
pub use payment::{Payment, PaymentDetail, payment_method};
pub use product::Product;
pub use setting::{AddPaymentToSetting, Setting, SettingDetail};
pub use user::{ClientOrder, ClientSettings, LoginRequest, LoginResponse, User, UserDetail};
