//! Domain layer for the marketplace workflow.
//!
//! This crate provides:
//! - the entities each component owns (`Product`, `Cart`, `PurchaseRequest`,
//!   `Order`, `Payment`) with their status machines
//! - the `Entity` trait and the versioned `Repository` that persists them
//! - `DomainError`, the error vocabulary shared by every component

pub mod cart;
pub mod entity;
pub mod error;
pub mod order;
pub mod payment;
pub mod product;
pub mod purchase_request;
pub mod repository;

pub use cart::{Cart, CartItem};
pub use entity::Entity;
pub use error::{DomainError, ErrorKind};
pub use order::{Order, OrderItem, OrderStatus};
pub use payment::{GATEWAY_AMOUNT_CEILING, Payment, PaymentItem, PaymentStatus};
pub use product::{ItemSnapshot, NewProduct, Product, ProductStatus};
pub use purchase_request::{PurchaseRequest, RequestStatus};
pub use repository::{Repository, RetryPolicy};
