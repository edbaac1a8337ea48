use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{error, info};

use crate::agent::state::AgentState;
use crate::error::ConnsError;

pub const CONNS_ENDPOINT: &str = "/conns";

#[derive(Debug, Deserialize)]
pub struct ConnsParams {
    port: Option<String>,
}

fn parse_port(port: Option<&str>) -> Result<u32, ConnsError> {
    let port = port.ok_or(ConnsError::MissingPort)?;
    port.trim()
        .parse::<u32>()
        .map_err(|_| ConnsError::InvalidPort(port.to_string()))
}

pub async fn conns(
    State(state): State<AgentState>,
    Query(params): Query<ConnsParams>,
) -> Result<Response, ConnsError> {
    let port = parse_port(params.port.as_deref()).inspect_err(|e| error!("{}", e))?;
    info!("Looking for process of port: {}", port);

    let resolver = state.resolver();
    let found = tokio::task::spawn_blocking(move || resolver.resolve(port))
        .await
        .map_err(|e| ConnsError::Lookup(e.into()))?
        .inspect_err(|e| error!("Error while resolving port {}: {:#}", port, e))?;

    match found {
        Some(process) => Ok(Json(process).into_response()),
        None => Ok((StatusCode::NOT_FOUND, "process not found!").into_response()),
    }
}
