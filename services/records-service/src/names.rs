use axum::{Json, extract::State};
use od_api_types::{CheckNamesRequest, CheckNamesResponse, SubnamesResponse};
use od_records::availability::{check_labels, subdomain_names};
use std::sync::Arc;

use crate::{ApiResult, AppState, bad_request, record_error, require};

const MAX_LABELS: usize = 100;

pub(crate) async fn check_names(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckNamesRequest>,
) -> ApiResult<CheckNamesResponse> {
    if request.labels.len() > MAX_LABELS {
        return Err(bad_request(&format!("at most {MAX_LABELS} labels per request")));
    }
    let parent = require(state.config.parent_domain, "OD_PARENT_DOMAIN_ADDRESS")?;

    let results = check_labels(state.l2(), parent, &request.labels)
        .await
        .map_err(record_error)?;

    Ok(Json(CheckNamesResponse { results }))
}

pub(crate) async fn subnames(State(state): State<Arc<AppState>>) -> ApiResult<SubnamesResponse> {
    let parent = require(state.config.parent_domain, "OD_PARENT_DOMAIN_ADDRESS")?;

    let names = subdomain_names(state.l2(), parent)
        .await
        .map_err(record_error)?;

    Ok(Json(SubnamesResponse { names }))
}
