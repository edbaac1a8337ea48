use crate::server::handlers::procs::{procs, PROCS_ENDPOINT};
use crate::server::state::ServerState;
use axum::routing::{get, MethodRouter};
use std::sync::LazyLock;

pub(super) static ROUTES: LazyLock<Vec<(&'static str, MethodRouter<ServerState>)>> =
    LazyLock::new(|| vec![(PROCS_ENDPOINT, get(procs))]);
