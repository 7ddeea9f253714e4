use anyhow::{Context, Result};
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

use crate::{
    aliases::DbPool,
    models::{CreateUserEntity, UserEntity},
    repositories::UserRepository,
    schema::users,
};

#[derive(Clone)]
pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find(&self, id: i32) -> Result<Option<UserEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let user: Option<UserEntity> = users::table
            .find(id)
            .get_result(conn)
            .await
            .optional()
            .context("Failed to get user")?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserEntity>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let user: Option<UserEntity> = users::table
            .filter(users::username.eq(username))
            .first(conn)
            .await
            .optional()
            .context("Failed to get user by username")?;

        Ok(user)
    }

    async fn create(&self, user: CreateUserEntity) -> Result<UserEntity> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let user: UserEntity = diesel::insert_into(users::table)
            .values(user)
            .returning(UserEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to create user")?;

        Ok(user)
    }
}
