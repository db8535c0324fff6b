use alloy_primitives::{B256, hex};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use od_api_types::{
    ReadRecordsResponse, RecordEntry, SubmitRecordsResponse, TxStatusResponse, WriteBatchResponse,
    WriteRecordsRequest,
};
use od_chain_client::TxSubmitter;
use od_name_codec::DomainName;
use od_records::{RecordSchema, RecordSet, build_write_batch, encode_multicall};
use serde::Deserialize;
use std::sync::Arc;

use crate::{ApiError, ApiResult, AppState, bad_gateway, bad_request, parse_name, record_error, require};

#[derive(Debug, Deserialize)]
pub(crate) struct RecordsQuery {
    schema: Option<String>,
}

pub(crate) fn schema_preset(name: &str) -> Result<RecordSchema, ApiError> {
    RecordSchema::preset(name).ok_or_else(|| {
        bad_request(&format!(
            "unknown schema {name:?}, expected one of {}",
            RecordSchema::PRESETS.join(", ")
        ))
    })
}

/// Lists a record set in schema order, unset records included as empty.
pub(crate) fn entries(schema: &RecordSchema, records: &RecordSet) -> Vec<RecordEntry> {
    schema
        .iter()
        .map(|kind| RecordEntry {
            kind: kind.clone(),
            value: records
                .get(kind)
                .map(|value| value.text_form())
                .unwrap_or_default(),
        })
        .collect()
}

pub(crate) async fn get_records(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<RecordsQuery>,
) -> ApiResult<ReadRecordsResponse> {
    let name = parse_name(&name)?;
    let schema = schema_preset(query.schema.as_deref().unwrap_or("profile"))?;
    let resolver = require(state.config.resolver, "OD_RESOLVER_ADDRESS")?;

    let records = state
        .records
        .read_records(resolver, &name, &schema)
        .await
        .map_err(record_error)?;

    Ok(Json(ReadRecordsResponse {
        name: name.to_string(),
        resolver: resolver.to_checksum(None),
        records: entries(&schema, &records),
    }))
}

/// Current records for the requested schema, used to skip unchanged edits.
async fn baseline(
    state: &AppState,
    name: &DomainName,
    schema: Option<&str>,
) -> Result<Option<RecordSet>, ApiError> {
    let Some(schema) = schema else {
        return Ok(None);
    };
    let schema = schema_preset(schema)?;
    let resolver = require(state.config.resolver, "OD_RESOLVER_ADDRESS")?;
    let records = state
        .records
        .read_records(resolver, name, &schema)
        .await
        .map_err(record_error)?;
    Ok(Some(records))
}

pub(crate) async fn build_calls(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<WriteRecordsRequest>,
) -> ApiResult<WriteBatchResponse> {
    let name = parse_name(&name)?;
    let resolver = require(state.config.resolver, "OD_RESOLVER_ADDRESS")?;
    let baseline = baseline(&state, &name, request.schema.as_deref()).await?;

    let batch = build_write_batch(&name, &request.edits, baseline.as_ref()).map_err(record_error)?;
    let data = (!batch.is_empty()).then(|| hex::encode_prefixed(encode_multicall(&batch)));

    Ok(Json(WriteBatchResponse {
        to: resolver.to_checksum(None),
        chain_id: state.config.l2_chain_id,
        call_count: batch.len(),
        data,
    }))
}

pub(crate) async fn submit_records(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<WriteRecordsRequest>,
) -> ApiResult<SubmitRecordsResponse> {
    let name = parse_name(&name)?;
    let resolver = require(state.config.resolver, "OD_RESOLVER_ADDRESS")?;
    let baseline = baseline(&state, &name, request.schema.as_deref()).await?;

    let pending = state
        .records
        .write_records(
            state.config.l2_chain_id,
            resolver,
            &name,
            &request.edits,
            baseline.as_ref(),
        )
        .await
        .map_err(record_error)?;

    Ok(Json(SubmitRecordsResponse {
        submitted: pending.is_some(),
        tx_hash: pending.map(|pending| pending.tx_hash.to_string()),
    }))
}

pub(crate) async fn tx_status(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> ApiResult<TxStatusResponse> {
    let tx_hash: B256 = hash
        .parse()
        .map_err(|_| bad_request("tx hash must be 32 bytes of 0x-prefixed hex"))?;

    let status = state
        .records
        .submitter()
        .get_transaction_status(tx_hash)
        .await
        .map_err(bad_gateway)?;

    Ok(Json(TxStatusResponse {
        tx_hash: tx_hash.to_string(),
        status: status.as_str().to_owned(),
    }))
}
