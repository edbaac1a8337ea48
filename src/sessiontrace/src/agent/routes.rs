use crate::agent::handlers::conns::{conns, CONNS_ENDPOINT};
use crate::agent::state::AgentState;
use axum::routing::{get, MethodRouter};
use std::sync::LazyLock;

pub(super) static ROUTES: LazyLock<Vec<(&'static str, MethodRouter<AgentState>)>> =
    LazyLock::new(|| vec![(CONNS_ENDPOINT, get(conns))]);
