use axum::extract::State;
use axum::Json;

use crate::context::RequestContext;
use crate::error::CorrelationError;
use crate::server::response::ProcessesResponse;
use crate::server::state::ServerState;

pub const PROCS_ENDPOINT: &str = "/procs";

pub async fn procs(
    State(state): State<ServerState>,
) -> Result<Json<ProcessesResponse>, CorrelationError> {
    let ctx = RequestContext::with_timeout(state.request_timeout());
    // axum drops this future when the client goes away
    let _cancel_on_exit = ctx.cancel_on_drop();

    let response = state.correlator().correlate(&ctx).await?;
    Ok(Json(response))
}
