use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use resize_core::MutationKind;
use serde::Deserialize;

use websocket::{upgrade_workflow, WorkflowSession};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WorkflowQuery {
    /// State the caller believes the instance is in
    pub state: String,
}

pub async fn resize_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WorkflowQuery>,
) -> Response {
    open_workflow(ws, state, id, query, MutationKind::Resize)
}

pub async fn address_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WorkflowQuery>,
) -> Response {
    open_workflow(ws, state, id, query, MutationKind::Address)
}

fn open_workflow(
    ws: WebSocketUpgrade,
    state: AppState,
    instance_id: String,
    query: WorkflowQuery,
    kind: MutationKind,
) -> Response {
    tracing::debug!(
        instance_id = %instance_id,
        declared_state = %query.state,
        kind = kind.as_str(),
        "Upgrading workflow socket"
    );
    upgrade_workflow(
        ws,
        state.engine,
        WorkflowSession {
            instance_id,
            declared_state: query.state,
            kind,
        },
    )
}
