use axum::extract::State;
use axum::Json;
use resize_core::{open_addresses, Address};

use crate::error::AppError;
use crate::state::AppState;

/// Addresses that can be associated with an instance.
#[utoipa::path(
    get,
    path = "/api/addresses",
    responses(
        (status = 200, description = "Unassociated elastic addresses", body = Vec<Address>),
        (status = 502, description = "Provider unreachable")
    ),
    tag = "addresses"
)]
pub async fn list_open_addresses(
    State(state): State<AppState>,
) -> Result<Json<Vec<Address>>, AppError> {
    let addresses = state.provider.list_addresses().await?;
    Ok(Json(open_addresses(addresses)))
}
