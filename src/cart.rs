//! Session cart: an ordered list of line items keyed by (product, size, color).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    app_error::AppError,
    models::{
        COLOR_MAX_LEN, OrderItemSnapshot, ProductImageEntity, ProductWithImages, SIZE_MAX_LEN,
        ensure_fits,
    },
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct CartLineItem {
    pub product_id: i32,
    pub image: String,
    pub name: String,
    pub price: f64,
    pub size: String,
    pub quantity: i32,
    pub color: String,
    pub total_price: f64,
}

impl CartLineItem {
    /// Builds a line item for `product`, picking the image that matches `color`.
    pub fn for_product(
        product: &ProductWithImages,
        size: &str,
        color: &str,
        quantity: i32,
    ) -> Result<Self, AppError> {
        if quantity < 1 {
            return Err(AppError::BadRequest("Quantity must be at least 1".into()));
        }
        ensure_fits("Size", size, SIZE_MAX_LEN)?;
        ensure_fits("Color", color, COLOR_MAX_LEN)?;

        let image = image_for_color(&product.images, color).ok_or_else(|| {
            AppError::BadRequest(format!(
                "{} has no image for color {}",
                product.product.name, color
            ))
        })?;

        Ok(Self {
            product_id: product.product.id,
            image: image.image_filename.clone(),
            name: product.product.name.clone(),
            price: product.product.price,
            size: size.to_string(),
            quantity,
            color: color.to_string(),
            total_price: product.product.price * quantity as f64,
        })
    }

    fn matches(&self, product_id: i32, size: &str, color: &str) -> bool {
        self.product_id == product_id && self.size == size && self.color == color
    }

    pub fn snapshot(&self) -> OrderItemSnapshot {
        OrderItemSnapshot {
            product_name: self.name.clone(),
            rate: self.price,
            quantity: self.quantity,
            size: self.size.clone(),
            color: self.color.clone(),
            image_filename: self.image.clone(),
        }
    }
}

/// First image whose filename contains the lowercased color.
pub fn image_for_color<'a>(
    images: &'a [ProductImageEntity],
    color: &str,
) -> Option<&'a ProductImageEntity> {
    let needle = color.to_lowercase();
    images
        .iter()
        .find(|image| image.image_filename.contains(&needle))
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, ToSchema)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Merges `item` into the cart. A line with the same key absorbs the quantity.
    ///
    /// The cart is left untouched when the merged quantity would not fit.
    pub fn add(&mut self, item: CartLineItem) -> Result<(), AppError> {
        match self
            .items
            .iter_mut()
            .find(|existing| existing.matches(item.product_id, &item.size, &item.color))
        {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| AppError::BadRequest("Quantity is too large".into()))?;
                existing.total_price = existing.price * existing.quantity as f64;
            }
            None => self.items.push(item),
        }
        Ok(())
    }

    /// Returns the number of removed lines.
    pub fn remove(&mut self, product_id: i32, size: &str, color: &str) -> usize {
        let before = self.items.len();
        self.items
            .retain(|item| !item.matches(product_id, size, color));
        before - self.items.len()
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.total_price).sum()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
