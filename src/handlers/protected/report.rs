use axum::{extract::State, Extension};

use crate::auth::Caller;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::reports::{self, Counter};
use crate::state::AppState;

/// GET /report/list/counter
pub async fn report_counter(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Counter> {
    let counts = reports::counter(state.store(), &caller).await?;
    Ok(ApiResponse::success("report.counter.success", counts))
}
