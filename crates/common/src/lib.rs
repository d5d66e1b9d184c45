//! Shared types for the marketplace workflow components.
//!
//! Every component owns its own entities, but they all speak in the same
//! identifiers, money representation and caller-identity vocabulary.

mod ids;
pub mod identity;
mod money;

pub use identity::Role;
pub use ids::{BuyerId, CartId, OrderId, PaymentId, ProductId, RequestId, SellerId};
pub use money::{Currency, Money};
