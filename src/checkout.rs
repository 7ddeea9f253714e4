use anyhow::Context;
use tracing::info;
use url::Url;

use crate::{
    app_error::AppError,
    cart::Cart,
    config::MessagingConfig,
    models::{CreateOrderEntity, OrderItemSnapshot, OrderWithItems},
    repositories::OrderRepository,
};

/// Persists the cart as one order and empties it.
///
/// The order and its items are written in a single repository call, so either
/// everything is stored or nothing is. The cart is only cleared once that call
/// succeeds.
pub async fn checkout(
    orders: &dyn OrderRepository,
    cart: &mut Cart,
) -> Result<OrderWithItems, AppError> {
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let total = cart.total();
    let items: Vec<OrderItemSnapshot> = cart.items().iter().map(|item| item.snapshot()).collect();

    let order = orders.create(CreateOrderEntity { total }, items).await?;
    cart.clear();

    info!(
        "Order #{} has been created with {} item(s), total {:.2}",
        order.order.id,
        order.order_items.len(),
        order.order.total
    );

    Ok(order)
}

/// Messaging link sent to the customer after checkout. The prefilled text
/// points at the admin page of `order_id`.
pub fn confirmation_link(messaging: &MessagingConfig, order_id: i32) -> anyhow::Result<Url> {
    let order_url = format!(
        "{}/admin/order/{}",
        messaging.public_base_url.trim_end_matches('/'),
        order_id
    );

    Url::parse_with_params(
        &messaging.link_base,
        &[("text", format!("Here is my order {}", order_url))],
    )
    .with_context(|| format!("Invalid messaging link base {}", messaging.link_base))
}
