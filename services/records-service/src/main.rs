use alloy_primitives::Address;
use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use anyhow::Context;
use od_chain_client::{ChainAdapter, ChainRegistry};
use od_chain_rpc::JsonRpcAdapter;
use od_name_codec::DomainName;
use od_records::{RecordBatchClient, RecordError};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

mod config;
mod migrate;
mod names;
mod records;

use config::ServiceConfig;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);
pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

pub(crate) type SharedAdapter = Arc<dyn ChainAdapter>;

pub(crate) struct AppState {
    pub(crate) config: ServiceConfig,
    pub(crate) records: RecordBatchClient<SharedAdapter, SharedAdapter>,
    chains: ChainRegistry,
}

impl AppState {
    /// Fails when no adapter is registered for the configured L2 chain.
    pub(crate) fn new(config: ServiceConfig, chains: ChainRegistry) -> anyhow::Result<Self> {
        let l2 = chains
            .adapter(config.l2_chain_id)
            .with_context(|| format!("no adapter for L2 chain {}", config.l2_chain_id))?;
        Ok(Self {
            config,
            records: RecordBatchClient::new(l2.clone(), l2),
            chains,
        })
    }

    pub(crate) fn l2(&self) -> &SharedAdapter {
        self.records.reader()
    }

    pub(crate) fn l1(&self) -> Result<SharedAdapter, ApiError> {
        self.chains.adapter(self.config.l1_chain_id).ok_or_else(|| {
            unavailable(&format!("no adapter for L1 chain {}", self.config.l1_chain_id))
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::from_env()?;

    let mut l2 = JsonRpcAdapter::new(Some(config.l2_rpc_url.clone()), config.l2_chain_id);
    if let Some(sender) = config.sender {
        l2 = l2.with_sender(sender);
    }
    match l2.remote_chain_id().await {
        Ok(remote) if remote != config.l2_chain_id => {
            warn!(configured = config.l2_chain_id, remote, "L2 node reports a different chain id");
        }
        Ok(_) => {}
        Err(err) => warn!("L2 node unreachable at startup: {err:#}"),
    }
    let l1 = JsonRpcAdapter::new(config.l1_rpc_url.clone(), config.l1_chain_id);
    info!(l2 = l2.endpoint(), l1 = l1.endpoint(), "chain adapters configured");

    // L2 goes in last so a single-chain devnet keeps its sender.
    let mut chains = ChainRegistry::default();
    chains.register(Arc::new(l1));
    chains.register(Arc::new(l2));

    let bind_addr = config.bind_addr;
    let state = AppState::new(config, chains)?;
    let app = router(Arc::new(state));

    info!("records-service listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/records/{name}", get(records::get_records))
        .route("/records/{name}/calls", post(records::build_calls))
        .route("/records/{name}/submit", post(records::submit_records))
        .route("/tx/{hash}", get(records::tx_status))
        .route("/names/check", post(names::check_names))
        .route("/names/subnames", get(names::subnames))
        .route("/migrate/{name}", get(migrate::migrate_name))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "records-service",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "records-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(crate) fn parse_name(name: &str) -> Result<DomainName, ApiError> {
    DomainName::parse(name).map_err(|err| bad_request(&err.to_string()))
}

pub(crate) fn require(address: Option<Address>, var: &str) -> Result<Address, ApiError> {
    address.ok_or_else(|| unavailable(&format!("{var} is not configured")))
}

pub(crate) fn record_error(err: RecordError) -> ApiError {
    match err {
        RecordError::InvalidName(_)
        | RecordError::InvalidAddress(_)
        | RecordError::InvalidContentHash(_)
        | RecordError::InvalidLabel(_) => bad_request(&err.to_string()),
        RecordError::BatchTransport(_) => {
            warn!("{err}");
            bad_gateway(err)
        }
        RecordError::DecodeMismatch { .. } | RecordError::AbiDecode { .. } => {
            warn!("{err}");
            internal_error(err)
        }
    }
}

pub(crate) fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}

fn unavailable(message: &str) -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}

pub(crate) fn bad_gateway(err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

pub(crate) fn internal_error(err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
