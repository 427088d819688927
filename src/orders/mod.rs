//! Order records and the upstream order service.
//!
//! The gateway decodes upstream payloads into [`Order`]; the `order-service`
//! binary serves [`fixture_orders`] through [`router`].

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// An order as exchanged on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub name: String,
    pub amount: i64,
}

/// The fixed catalogue served by the order service.
pub fn fixture_orders() -> Vec<Order> {
    (1..=5)
        .map(|i| Order {
            id: i.to_string(),
            name: format!("Order{}", i),
            amount: 200,
        })
        .collect()
}

/// Routes of the order service.
pub fn router() -> Router {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/health", get(|| async { "ok" }))
}

async fn list_orders() -> Json<Vec<Order>> {
    tracing::debug!("Serving order list");
    Json(fixture_orders())
}
