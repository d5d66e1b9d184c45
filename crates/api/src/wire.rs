//! Request and response bodies shared by the routes and the HTTP clients.

use common::{ProductId, RequestId};
use domain::ItemSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityBody {
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub product_id: ProductId,
    pub quantity: u32,
    pub available: bool,
}

/// Body of the approval push into a buyer's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovedItemBody {
    pub request_id: RequestId,
    pub item: ItemSnapshot,
    pub quantity: u32,
}

/// Order registration sent to the payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrderBody {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}
