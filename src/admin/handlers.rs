use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::resilience::{BreakerSnapshot, Phase};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub upstream: String,
    pub breaker_phase: Phase,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        upstream: state.breaker.name().to_string(),
        breaker_phase: state.breaker.phase(),
    })
}

pub async fn get_breaker(State(state): State<AdminState>) -> Json<BreakerSnapshot> {
    Json(state.breaker.snapshot())
}
