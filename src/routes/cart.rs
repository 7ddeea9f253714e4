use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    cart::CartLineItem,
    checkout,
    session::Session,
};

/// Session cart, checkout and the post-checkout hand-off.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(view_cart))
        .routes(utoipa_axum::routes!(add_to_cart))
        .routes(utoipa_axum::routes!(remove_from_cart))
        .routes(utoipa_axum::routes!(checkout_cart))
        .routes(utoipa_axum::routes!(submit_order))
}

#[derive(Serialize, ToSchema)]
struct ViewCartRes {
    pub cart: Vec<CartLineItem>,
    pub total_cost: f64,
}

/// Show the cart of the current session.
#[utoipa::path(
    get,
    path = "/cart",
    tags = ["Cart"],
    responses(
        (status = 200, description = "Get cart successfully", body = StdResponse<ViewCartRes, String>)
    )
)]
async fn view_cart(session: Session) -> Result<impl IntoResponse, AppError> {
    let cart = &session.data.cart;

    Ok(StdResponse {
        data: Some(ViewCartRes {
            cart: cart.items().to_vec(),
            total_cost: cart.total(),
        }),
        message: Some("Get cart successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct AddToCartReq {
    size: Option<String>,
    /// Used when `size` is empty.
    size_kids: Option<String>,
    quantity: i32,
    color: String,
}

impl AddToCartReq {
    fn resolved_size(&self) -> Option<&str> {
        [&self.size, &self.size_kids]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|size| !size.is_empty())
    }
}

/// Add a product in a given size and color to the cart.
#[utoipa::path(
    post,
    path = "/cart/add/{product_id}",
    tags = ["Cart"],
    params(
        ("product_id" = i32, Path, description = "Product ID to add")
    ),
    request_body(content = AddToCartReq, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirects to /cart"),
        (status = 400, description = "Missing size, bad quantity or no image for the color"),
        (status = 404, description = "Product not found")
    )
)]
async fn add_to_cart(
    Path(product_id): Path<i32>,
    State(state): State<AppState>,
    mut session: Session,
    Form(body): Form<AddToCartReq>,
) -> Result<impl IntoResponse, AppError> {
    let size = body
        .resolved_size()
        .ok_or_else(|| AppError::BadRequest("Size is required".into()))?;

    let product = state
        .products
        .find(product_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let item = CartLineItem::for_product(&product, size, &body.color, body.quantity)?;
    info!(
        "Adding {} x product #{} ({}, {}) to cart",
        item.quantity, item.product_id, item.size, item.color
    );
    session.data.cart.add(item)?;

    let jar = session.save().await?;
    Ok((jar, Redirect::to("/cart")))
}

/// Remove the line matching product, size and color.
#[utoipa::path(
    post,
    path = "/cart/remove/{product_id}/{size}/{color}",
    tags = ["Cart"],
    params(
        ("product_id" = i32, Path, description = "Product ID of the line"),
        ("size" = String, Path, description = "Size of the line"),
        ("color" = String, Path, description = "Color of the line")
    ),
    responses(
        (status = 303, description = "Redirects to /cart")
    )
)]
async fn remove_from_cart(
    Path((product_id, size, color)): Path<(i32, String, String)>,
    mut session: Session,
) -> Result<impl IntoResponse, AppError> {
    let removed = session.data.cart.remove(product_id, &size, &color);
    info!(
        "Removed {} line(s) of product #{} ({}, {}) from cart",
        removed, product_id, size, color
    );

    let jar = session.save().await?;
    Ok((jar, Redirect::to("/cart")))
}

/// Turn the cart into a persisted order.
#[utoipa::path(
    post,
    path = "/checkout",
    tags = ["Cart"],
    responses(
        (status = 303, description = "Order created, redirects to /submit"),
        (status = 400, description = "Cart is empty")
    )
)]
async fn checkout_cart(
    State(state): State<AppState>,
    mut session: Session,
) -> Result<impl IntoResponse, AppError> {
    let order = checkout::checkout(state.orders.as_ref(), &mut session.data.cart).await?;
    session.data.last_order_id = Some(order.order.id);

    let jar = session.save().await?;
    Ok((jar, Redirect::to("/submit")))
}

/// Send the customer to the messaging link for their last order.
#[utoipa::path(
    get,
    path = "/submit",
    tags = ["Cart"],
    responses(
        (status = 303, description = "Redirects to the messaging link"),
        (status = 404, description = "No order submitted in this session")
    )
)]
async fn submit_order(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let order_id = session.data.last_order_id.ok_or(AppError::NotFound)?;
    let link = checkout::confirmation_link(&state.messaging, order_id)?;

    Ok(Redirect::to(link.as_str()))
}
