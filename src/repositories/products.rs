use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::{
    aliases::DbPool,
    models::{
        CreateProductEntity, CreateProductImageEntity, ProductEntity, ProductImageEntity,
        ProductWithImages,
    },
    repositories::ProductRepository,
    schema::{product_images, products},
};

#[derive(Clone)]
pub struct PgProductRepository {
    pool: DbPool,
}

impl PgProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(&self) -> Result<Vec<ProductWithImages>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let products: Vec<ProductEntity> = products::table
            .order_by(products::id.asc())
            .get_results(conn)
            .await
            .context("Failed to get products")?;

        let product_ids: Vec<i32> = products.iter().map(|product| product.id).collect();

        let images: Vec<ProductImageEntity> = product_images::table
            .filter(product_images::product_id.eq_any(&product_ids))
            .order_by(product_images::id.asc())
            .get_results(conn)
            .await
            .context("Failed to get product images")?;

        let mut group: HashMap<i32, Vec<ProductImageEntity>> = HashMap::new();
        for image in images {
            group.entry(image.product_id).or_default().push(image);
        }

        let products_with_images = products
            .into_iter()
            .map(|product| {
                let images = group.remove(&product.id).unwrap_or_default();
                ProductWithImages { product, images }
            })
            .collect();

        Ok(products_with_images)
    }

    async fn find(&self, id: i32) -> Result<Option<ProductWithImages>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let product: Option<ProductEntity> = products::table
            .find(id)
            .get_result(conn)
            .await
            .optional()
            .context("Failed to get product")?;

        let Some(product) = product else {
            return Ok(None);
        };

        let images: Vec<ProductImageEntity> = product_images::table
            .filter(product_images::product_id.eq(product.id))
            .order_by(product_images::id.asc())
            .get_results(conn)
            .await
            .context("Failed to get product images")?;

        Ok(Some(ProductWithImages { product, images }))
    }

    async fn create(
        &self,
        product: CreateProductEntity,
        image_filenames: Vec<String>,
    ) -> Result<ProductWithImages> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let created = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    let product: ProductEntity = diesel::insert_into(products::table)
                        .values(product)
                        .returning(ProductEntity::as_returning())
                        .get_result(conn)
                        .await
                        .context("Failed to create product")?;

                    let new_images: Vec<CreateProductImageEntity> = image_filenames
                        .into_iter()
                        .map(|image_filename| CreateProductImageEntity {
                            product_id: product.id,
                            image_filename,
                        })
                        .collect();

                    let images = if new_images.is_empty() {
                        Vec::new()
                    } else {
                        diesel::insert_into(product_images::table)
                            .values(new_images)
                            .returning(ProductImageEntity::as_returning())
                            .get_results(conn)
                            .await
                            .context("Failed to create product images")?
                    };

                    Ok::<ProductWithImages, anyhow::Error>(ProductWithImages { product, images })
                })
            })
            .await
            .context("Transaction failed")?;

        Ok(created)
    }

    async fn update(&self, id: i32, changes: CreateProductEntity) -> Result<Option<ProductEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let product: Option<ProductEntity> = diesel::update(products::table.find(id))
            .set(&changes)
            .returning(ProductEntity::as_returning())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to update product")?;

        Ok(product)
    }

    async fn delete(&self, id: i32) -> Result<Option<ProductWithImages>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let deleted = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    let images: Vec<ProductImageEntity> = diesel::delete(
                        product_images::table.filter(product_images::product_id.eq(id)),
                    )
                    .returning(ProductImageEntity::as_returning())
                    .get_results(conn)
                    .await
                    .context("Failed to delete product images")?;

                    let product: Option<ProductEntity> =
                        diesel::delete(products::table.find(id))
                            .returning(ProductEntity::as_returning())
                            .get_result(conn)
                            .await
                            .optional()
                            .context("Failed to delete product")?;

                    Ok::<Option<ProductWithImages>, anyhow::Error>(
                        product.map(|product| ProductWithImages { product, images }),
                    )
                })
            })
            .await
            .context("Transaction failed")?;

        Ok(deleted)
    }
}
