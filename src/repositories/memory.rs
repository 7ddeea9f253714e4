//! In-memory repositories. Same contracts as the Postgres ones, no database.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    models::{
        CreateOrderEntity, CreateProductEntity, CreateUserEntity, OrderEntity, OrderItemEntity,
        OrderItemSnapshot, OrderWithItems, ProductEntity, ProductImageEntity, ProductWithImages,
        UserEntity,
    },
    repositories::{OrderRepository, ProductRepository, UserRepository},
};

#[derive(Default)]
struct Catalog {
    next_product_id: i32,
    next_image_id: i32,
    products: BTreeMap<i32, ProductEntity>,
    images: Vec<ProductImageEntity>,
}

impl Catalog {
    fn with_images(&self, product: &ProductEntity) -> ProductWithImages {
        ProductWithImages {
            product: product.clone(),
            images: self
                .images
                .iter()
                .filter(|image| image.product_id == product.id)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Default)]
pub struct MemoryProductRepository {
    catalog: RwLock<Catalog>,
}

impl MemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn list(&self) -> Result<Vec<ProductWithImages>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .products
            .values()
            .map(|product| catalog.with_images(product))
            .collect())
    }

    async fn find(&self, id: i32) -> Result<Option<ProductWithImages>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .products
            .get(&id)
            .map(|product| catalog.with_images(product)))
    }

    async fn create(
        &self,
        product: CreateProductEntity,
        image_filenames: Vec<String>,
    ) -> Result<ProductWithImages> {
        let mut catalog = self.catalog.write().await;

        catalog.next_product_id += 1;
        let product = ProductEntity {
            id: catalog.next_product_id,
            name: product.name,
            description: product.description,
            price: product.price,
        };

        for image_filename in image_filenames {
            catalog.next_image_id += 1;
            let image = ProductImageEntity {
                id: catalog.next_image_id,
                product_id: product.id,
                image_filename,
            };
            catalog.images.push(image);
        }

        catalog.products.insert(product.id, product.clone());
        Ok(catalog.with_images(&product))
    }

    async fn update(&self, id: i32, changes: CreateProductEntity) -> Result<Option<ProductEntity>> {
        let mut catalog = self.catalog.write().await;
        Ok(catalog.products.get_mut(&id).map(|product| {
            product.name = changes.name;
            product.description = changes.description;
            product.price = changes.price;
            product.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<Option<ProductWithImages>> {
        let mut catalog = self.catalog.write().await;
        let Some(product) = catalog.products.remove(&id) else {
            return Ok(None);
        };

        let (images, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut catalog.images)
            .into_iter()
            .partition(|image| image.product_id == id);
        catalog.images = kept;

        Ok(Some(ProductWithImages { product, images }))
    }
}

#[derive(Default)]
struct OrderBook {
    next_order_id: i32,
    next_item_id: i32,
    orders: BTreeMap<i32, OrderWithItems>,
}

#[derive(Default)]
pub struct MemoryOrderRepository {
    book: RwLock<OrderBook>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.book.read().await.orders.len()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn create(
        &self,
        order: CreateOrderEntity,
        items: Vec<OrderItemSnapshot>,
    ) -> Result<OrderWithItems> {
        let mut book = self.book.write().await;

        book.next_order_id += 1;
        let order = OrderEntity {
            id: book.next_order_id,
            total: order.total,
            created_at: Utc::now(),
        };

        let mut order_items = Vec::with_capacity(items.len());
        for item in items {
            book.next_item_id += 1;
            let item = item.into_entity(order.id);
            order_items.push(OrderItemEntity {
                id: book.next_item_id,
                order_id: item.order_id,
                product_name: item.product_name,
                rate: item.rate,
                quantity: item.quantity,
                size: item.size,
                color: item.color,
                image_filename: item.image_filename,
            });
        }

        let created = OrderWithItems { order, order_items };
        book.orders.insert(created.order.id, created.clone());
        Ok(created)
    }

    async fn find(&self, id: i32) -> Result<Option<OrderWithItems>> {
        Ok(self.book.read().await.orders.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<UserEntity>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find(&self, id: i32) -> Result<Option<UserEntity>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserEntity>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.username == username).cloned())
    }

    async fn create(&self, user: CreateUserEntity) -> Result<UserEntity> {
        let mut users = self.users.write().await;
        if users.iter().any(|existing| existing.username == user.username) {
            bail!("Username {} is already taken", user.username);
        }

        let user = UserEntity {
            id: users.len() as i32 + 1,
            username: user.username,
            password_hash: user.password_hash,
        };
        users.push(user.clone());
        Ok(user)
    }
}
