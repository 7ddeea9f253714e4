use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    models::ProductWithImages,
};

/// Public catalog browsing.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_products))
        .routes(utoipa_axum::routes!(get_product))
}

/// List every product with its images.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Catalog"],
    responses(
        (status = 200, description = "List all products", body = StdResponse<Vec<ProductWithImages>, String>)
    )
)]
async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let products = state.products.list().await?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get products successfully"),
    })
}

/// Fetch a single product.
#[utoipa::path(
    get,
    path = "/product/{id}",
    tags = ["Catalog"],
    params(
        ("id" = i32, Path, description = "Product ID to fetch")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = StdResponse<ProductWithImages, String>),
        (status = 404, description = "Product not found")
    )
)]
async fn get_product(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.products.find(id).await?.ok_or(AppError::NotFound)?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Get product successfully"),
    })
}
