use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    models::OrderWithItems,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(get_order))
}

/// Fetch a submitted order with its items.
#[utoipa::path(
    get,
    path = "/admin/order/{order_id}",
    tags = ["Admin"],
    params(
        ("order_id" = i32, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<OrderWithItems, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order(
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.orders.find(order_id).await?.ok_or(AppError::NotFound)?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Get order successfully"),
    })
}
