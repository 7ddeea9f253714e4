//! Persistence boundaries. Handlers only ever see these traits; the Postgres
//! implementations live next to them and the in-memory ones back the tests.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    CreateOrderEntity, CreateProductEntity, CreateUserEntity, OrderItemSnapshot, OrderWithItems,
    ProductEntity, ProductWithImages, UserEntity,
};

pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

pub use memory::{MemoryOrderRepository, MemoryProductRepository, MemoryUserRepository};
pub use orders::PgOrderRepository;
pub use products::PgProductRepository;
pub use users::PgUserRepository;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<ProductWithImages>>;

    async fn find(&self, id: i32) -> Result<Option<ProductWithImages>>;

    /// Inserts the product and one image row per filename, all or nothing.
    async fn create(
        &self,
        product: CreateProductEntity,
        image_filenames: Vec<String>,
    ) -> Result<ProductWithImages>;

    async fn update(&self, id: i32, changes: CreateProductEntity) -> Result<Option<ProductEntity>>;

    /// Deletes the image rows, then the product. Returns what was removed.
    async fn delete(&self, id: i32) -> Result<Option<ProductWithImages>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts the order and all of its items in a single transaction.
    async fn create(
        &self,
        order: CreateOrderEntity,
        items: Vec<OrderItemSnapshot>,
    ) -> Result<OrderWithItems>;

    async fn find(&self, id: i32) -> Result<Option<OrderWithItems>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, id: i32) -> Result<Option<UserEntity>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserEntity>>;

    async fn create(&self, user: CreateUserEntity) -> Result<UserEntity>;
}
