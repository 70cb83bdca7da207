use axum::extract::State;
use axum::Json;
use resize_core::InstanceType;

use crate::error::AppError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/instance-types",
    responses(
        (status = 200, description = "Instance types available as resize targets", body = Vec<InstanceType>),
        (status = 502, description = "Provider unreachable")
    ),
    tag = "instances"
)]
pub async fn list_instance_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<InstanceType>>, AppError> {
    let types = state.provider.list_instance_types().await?;
    Ok(Json(types))
}
