use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_error::AppError;

// Column widths of the `VARCHAR` columns, in characters.
pub const USERNAME_MAX_LEN: usize = 30;
pub const PRODUCT_NAME_MAX_LEN: usize = 30;
pub const PRODUCT_DESCRIPTION_MAX_LEN: usize = 100;
pub const IMAGE_FILENAME_MAX_LEN: usize = 200;
pub const SIZE_MAX_LEN: usize = 10;
pub const COLOR_MAX_LEN: usize = 10;

/// Rejects `value` with `BadRequest` when it is longer than `max` characters.
pub fn ensure_fits(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

// Users

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserEntity {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct CreateUserEntity {
    pub username: String,
    pub password_hash: String,
}

// Products

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// Scalar fields of a product; used for inserts and for edits.
#[derive(Insertable, AsChangeset, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::products)]
pub struct CreateProductEntity {
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl CreateProductEntity {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_fits("Name", &self.name, PRODUCT_NAME_MAX_LEN)?;
        ensure_fits("Description", &self.description, PRODUCT_DESCRIPTION_MAX_LEN)
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::product_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductImageEntity {
    pub id: i32,
    pub product_id: i32,
    pub image_filename: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::product_images)]
pub struct CreateProductImageEntity {
    pub product_id: i32,
    pub image_filename: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ProductWithImages {
    pub product: ProductEntity,
    pub images: Vec<ProductImageEntity>,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::orders)]
pub struct CreateOrderEntity {
    pub total: f64,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub id: i32,
    pub order_id: i32,
    pub product_name: String,
    pub rate: f64,
    pub quantity: i32,
    pub size: String,
    pub color: String,
    pub image_filename: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::order_items)]
pub struct CreateOrderItemEntity {
    pub order_id: i32,
    pub product_name: String,
    pub rate: f64,
    pub quantity: i32,
    pub size: String,
    pub color: String,
    pub image_filename: String,
}

/// Line of an order before it has been assigned an order id.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemSnapshot {
    pub product_name: String,
    pub rate: f64,
    pub quantity: i32,
    pub size: String,
    pub color: String,
    pub image_filename: String,
}

impl OrderItemSnapshot {
    pub fn into_entity(self, order_id: i32) -> CreateOrderItemEntity {
        CreateOrderItemEntity {
            order_id,
            product_name: self.product_name,
            rate: self.rate,
            quantity: self.quantity,
            size: self.size,
            color: self.color,
            image_filename: self.image_filename,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct OrderWithItems {
    pub order: OrderEntity,
    pub order_items: Vec<OrderItemEntity>,
}
