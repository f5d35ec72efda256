use axum::{extract::State, response::IntoResponse};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

/// GET /
pub async fn root() -> impl IntoResponse {
    ApiResponse::success(
        "auditor.api",
        json!({
            "name": "Auditor API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant audit and inspection backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "activity": "/activity/* (member)",
                "area": "/area/* (member)",
                "audit": "/audit/* (member)",
                "category": "/category/* (member)",
                "checklist": "/checklist/* (member)",
                "location": "/location/* (member)",
                "question": "/question/* (member)",
                "task": "/task/* (member)",
                "user": "/user/* (member, list and reports admin)",
                "report": "/report/* (member)",
            }
        }),
    )
}

/// GET /health. Pings storage; 503 when it does not answer.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store().ping().await {
        Ok(()) => ApiResponse::success(
            "health.ok",
            json!({ "status": "ok", "timestamp": now, "database": "ok" }),
        )
        .into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            ApiError::service_unavailable("database unavailable").into_response()
        }
    }
}
