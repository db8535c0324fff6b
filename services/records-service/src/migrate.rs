use alloy_primitives::hex;
use axum::{
    Json,
    extract::{Path, State},
};
use od_api_types::{CallPayload, MigrationResponse, WriteBatchResponse};
use od_records::migrate::{L1Contracts, ResolverCheck, build_migration_batch, l2_resolver, read_l1_records};
use od_records::{RecordSchema, RecordSet, encode_multicall};
use std::sync::Arc;
use tracing::info;

use crate::records::entries;
use crate::{ApiResult, AppState, parse_name, record_error, require};

/// Everything a client needs to move a name from L1 onto the L2 record
/// store: the `setResolver` call when L1 still points elsewhere, and the L2
/// multicall recreating the name's current L1 records. The multicall targets
/// the parent domain's resolver when a parent is configured.
pub(crate) async fn migrate_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<MigrationResponse> {
    let name = parse_name(&name)?;
    let contracts = L1Contracts {
        registry: state.config.registry,
        name_wrapper: state.config.name_wrapper,
        resolver: require(state.config.l1_resolver, "OD_L1_RESOLVER_ADDRESS")?,
    };
    let l1 = state.l1()?;
    let target = match state.config.parent_domain {
        Some(parent) => l2_resolver(state.l2(), parent).await.map_err(record_error)?,
        None => require(state.config.resolver, "OD_RESOLVER_ADDRESS")?,
    };

    let check = ResolverCheck::fetch(&l1, &contracts, &name)
        .await
        .map_err(record_error)?;

    let schema = RecordSchema::migration();
    let records = if check.current_resolver.is_zero() {
        RecordSet::new()
    } else {
        read_l1_records(&l1, check.current_resolver, &name, &schema)
            .await
            .map_err(record_error)?
    };

    let batch = build_migration_batch(&name, &schema, &records).map_err(record_error)?;
    info!(%name, records = batch.len(), wrapped = check.is_name_wrapped, "prepared migration");

    let set_resolver = (!check.is_resolver_correct).then(|| {
        let (to, data) = check.set_resolver_call(contracts.resolver);
        CallPayload {
            to: to.to_checksum(None),
            data: hex::encode_prefixed(data),
        }
    });

    Ok(Json(MigrationResponse {
        name: name.to_string(),
        l1_resolver: check.current_resolver.to_checksum(None),
        is_resolver_correct: check.is_resolver_correct,
        is_name_wrapped: check.is_name_wrapped,
        set_resolver,
        records: entries(&schema, &records),
        batch: WriteBatchResponse {
            to: target.to_checksum(None),
            chain_id: state.config.l2_chain_id,
            call_count: batch.len(),
            data: (!batch.is_empty()).then(|| hex::encode_prefixed(encode_multicall(&batch))),
        },
    }))
}
