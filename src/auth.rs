use anyhow::{Result, anyhow, ensure};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::info;

use crate::{
    models::{CreateUserEntity, USERNAME_MAX_LEN, UserEntity},
    repositories::UserRepository,
};

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("Failed to hash password: {}", err))?;

    Ok(hash.to_string())
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Returns the user only when the username exists and the password matches.
pub async fn authenticate(
    users: &dyn UserRepository,
    username: &str,
    password: &str,
) -> Result<Option<UserEntity>> {
    let user = users.find_by_username(username).await?;
    Ok(user.filter(|user| verify_password(password, &user.password_hash)))
}

/// Creates the admin account unless a user with that name already exists.
pub async fn ensure_admin(
    users: &dyn UserRepository,
    username: &str,
    password: &str,
) -> Result<UserEntity> {
    if let Some(user) = users.find_by_username(username).await? {
        return Ok(user);
    }

    ensure!(
        username.chars().count() <= USERNAME_MAX_LEN,
        "Admin username must be at most {} characters",
        USERNAME_MAX_LEN
    );

    let user = users
        .create(CreateUserEntity {
            username: username.to_string(),
            password_hash: hash_password(password)?,
        })
        .await?;

    info!("Created admin user {}", user.username);
    Ok(user)
}
