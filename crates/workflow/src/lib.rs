//! Inventory-consistency workflows.
//!
//! Five components, each owning one kind of entity:
//! - `LedgerService` owns products and their stock
//! - `CartService` owns buyer carts
//! - `PurchaseRequestService` owns purchase requests
//! - `OrderService` owns orders
//! - `PaymentService` owns payments
//!
//! Components only reach each other through the collaborator traits
//! (`InventoryLedger`, `CartClient`, `PaymentGateway`), so any of them can be
//! swapped for a remote client.
//!
//! Stock moves as a request travels through the system:
//! 1. Approving a request only checks availability, nothing is reserved
//! 2. Checkout decrements stock line by line
//! 3. Cancelling an order restores stock for every line
//! 4. Capturing a payment decrements stock again (settlement), unless
//!    `PaymentSettings::settle_stock_on_capture` is off

pub mod cart;
pub mod gateway;
pub mod inventory;
pub mod order;
pub mod payment;
pub mod purchase_request;

pub use cart::{CartClient, CartService};
pub use gateway::{GatewayOrder, GatewayPayment, InMemoryGateway, PaymentGateway};
pub use inventory::{InventoryLedger, LedgerService};
pub use order::OrderService;
pub use payment::{NewPayment, PaymentService, PaymentSettings};
pub use purchase_request::PurchaseRequestService;
