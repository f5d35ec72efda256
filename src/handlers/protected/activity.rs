use axum::{
    extract::{Query, State},
    Extension,
};

use super::common::page_window;
use crate::auth::Caller;
use crate::database::Document;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::lists::ACTIVITY;
use crate::query::params::present;
use crate::query::{resolve_sort, FilterBuilder, ListParams, Page};
use crate::services::{list_all, list_page};
use crate::state::AppState;

/// GET /activity/list/all
pub async fn activity_list_all(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Document>> {
    let filter = FilterBuilder::for_list(&ACTIVITY, &params, &caller)
        .eq("type", present(&params.kind))
        .build();
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let activities = list_all(state.store(), ACTIVITY.collection, &filter, sort, &[]).await?;
    Ok(ApiResponse::success("activity.list.success", activities))
}

/// GET /activity/list/filter
pub async fn activity_list_filter(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<Document>> {
    let window = page_window(&state, &params)?;
    let filter = FilterBuilder::for_list(&ACTIVITY, &params, &caller)
        .eq("type", present(&params.kind))
        .build();
    let sort = resolve_sort(present(&params.sort), present(&params.order));
    let page = list_page(state.store(), ACTIVITY.collection, &filter, sort, window, &[]).await?;
    Ok(ApiResponse::success("activity.list.success", page))
}
