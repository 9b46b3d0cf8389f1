use anyhow::{anyhow, Result};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    bigquery::schema::TableDefinition,
    config::Config,
    error::ApiError,
    ethereum::{
        explorer::{EtherscanClient, ExplorerClient},
        utils, Chain, ContractRef,
    },
    pipeline::{self, ArtifactMap},
};

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub explorer: Arc<dyn ExplorerClient>,
}

#[derive(Clone)]
pub struct Abi2BqServer {
    state: AppState,
}

impl Abi2BqServer {
    pub fn new(config: Config) -> Result<Self> {
        let explorer = EtherscanClient::new(&config)?;
        Ok(Self::with_explorer(config, Arc::new(explorer)))
    }

    pub fn with_explorer(config: Config, explorer: Arc<dyn ExplorerClient>) -> Self {
        Self {
            state: AppState {
                config: Arc::new(config),
                explorer,
            },
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/api", get(index))
            .route("/api/", get(index))
            .route("/api/test", get(test_status))
            .route("/api/queries/:contract/:chain", get(queries))
            .route("/api/tables/:contract/:chain", get(tables))
            .route("/api/contract/:contract/:chain", get(contract))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    pub async fn run(&self) -> Result<()> {
        let server = &self.state.config.server;
        let addr = format!("{}:{}", server.host, server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| anyhow!("Failed to bind {}: {}", addr, e))?;

        info!("abi2bq listening on http://{}", addr);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

async fn index() -> Json<Value> {
    Json(json!({"status": "alive"}))
}

async fn test_status() -> Json<Value> {
    Json(json!({"status": "test"}))
}

async fn queries(
    State(state): State<AppState>,
    Path((contract, chain)): Path<(String, String)>,
) -> Result<Json<ArtifactMap<String>>, ApiError> {
    let contract = ContractRef::parse(&contract)?;
    let resolved = pipeline::resolve_abi(contract, &chain, state.explorer.as_ref()).await?;
    let sqls = pipeline::contract_to_sqls(&resolved)?;
    info!(
        "Rendered {} queries for {}",
        sqls.len(),
        resolved.contract_address
    );
    Ok(Json(sqls))
}

async fn tables(
    State(state): State<AppState>,
    Path((contract, chain)): Path<(String, String)>,
) -> Result<Json<ArtifactMap<TableDefinition>>, ApiError> {
    let contract = ContractRef::parse(&contract)?;
    let resolved = pipeline::resolve_abi(contract, &chain, state.explorer.as_ref()).await?;
    let definitions = pipeline::contract_to_table_definitions(&resolved, &state.config.tables)?;
    info!(
        "Built {} table definitions for {}",
        definitions.len(),
        resolved.contract_address
    );
    Ok(Json(definitions))
}

async fn contract(
    State(state): State<AppState>,
    Path((contract, chain)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    if !utils::is_address_like(&contract) {
        return Ok(Json(json!({"ContractName": "unknown"})));
    }

    let chain: Chain = chain.parse()?;
    let address = utils::normalize_address(&contract);
    let metadata = state
        .explorer
        .fetch_source_metadata(chain, &address)
        .await?;
    Ok(Json(metadata))
}
