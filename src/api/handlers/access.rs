use crate::AppState;
use crate::api::error::AppError;
use crate::api::response::ApiResponse;
use crate::services::network::access_url;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/api/access-info",
    responses(
        (status = 200, description = "Envelope whose data is the base URL other devices can open", body = String)
    ),
    tag = "files"
)]
pub async fn access_info(State(state): State<AppState>) -> Result<ApiResponse<String>, AppError> {
    let url = access_url(state.config.public_base_url.as_deref(), state.config.port);
    Ok(ApiResponse::ok("Success", url))
}
