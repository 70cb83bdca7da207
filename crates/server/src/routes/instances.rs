use axum::extract::{Path, State};
use axum::Json;
use resize_core::{InstanceState, InstanceStatus, InstanceSummary};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InstanceStatusResponse {
    pub instance_id: String,
    /// Raw provider status code
    pub code: i32,
    /// Provider's name for the status
    pub name: String,
    pub state: InstanceState,
}

impl From<InstanceStatus> for InstanceStatusResponse {
    fn from(status: InstanceStatus) -> Self {
        let state = status.state();
        Self {
            instance_id: status.instance_id,
            code: status.code,
            name: status.name,
            state,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/instances/{id}/status",
    params(("id" = String, Path, description = "Instance identifier")),
    responses(
        (status = 200, description = "Current instance status", body = InstanceStatusResponse),
        (status = 404, description = "Instance not found"),
        (status = 502, description = "Provider unreachable")
    ),
    tag = "instances"
)]
pub async fn get_instance_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InstanceStatusResponse>, AppError> {
    let status = state.provider.get_status(&id).await?;
    Ok(Json(status.into()))
}

/// Every instance in the account, with its type and last known state.
#[utoipa::path(
    get,
    path = "/api/instances",
    responses(
        (status = 200, description = "Instances in the account", body = Vec<InstanceSummary>),
        (status = 502, description = "Provider unreachable")
    ),
    tag = "instances"
)]
pub async fn list_instances(
    State(state): State<AppState>,
) -> Result<Json<Vec<InstanceSummary>>, AppError> {
    let instances = state.provider.list_instances().await?;
    Ok(Json(instances))
}
