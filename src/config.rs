use std::{collections::HashMap, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadConfig,
    pub messaging: MessagingConfig,
    pub sessions: SessionConfig,
    pub admin: Option<AdminSeed>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub folder: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MessagingConfig {
    /// Link the customer is sent to after checkout, e.g. a chat deep link.
    pub link_base: String,
    /// Base URL the admin order page is reachable at, embedded in the message.
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sessions untouched for this long are dropped.
    pub idle_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            link_base: "https://wa.me/254768297762".into(),
            public_base_url: "http://127.0.0.1:5000".into(),
        }
    }
}

/// Reads the configuration from the process environment.
pub fn load() -> Result<AppConfig> {
    from_vars(std::env::vars().collect())
}

pub fn from_vars(vars: HashMap<String, String>) -> Result<AppConfig> {
    let get = |key: &str| vars.get(key).filter(|value| !value.is_empty()).cloned();
    let defaults = MessagingConfig::default();

    let port = match get("PORT") {
        Some(port) => port.parse().context("PORT must be a valid port number")?,
        None => 5000,
    };

    let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
        Some(max) => max
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
        None => 10,
    };

    let idle_timeout_secs = match get("SESSION_IDLE_TIMEOUT_SECS") {
        Some(secs) => secs
            .parse()
            .context("SESSION_IDLE_TIMEOUT_SECS must be a number of seconds")?,
        None => 24 * 60 * 60,
    };

    let admin = match (get("ADMIN_USERNAME"), get("ADMIN_PASSWORD")) {
        (Some(username), Some(password)) => Some(AdminSeed { username, password }),
        _ => None,
    };

    Ok(AppConfig {
        server: ServerConfig {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        },
        database: DatabaseConfig {
            url: get("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections,
        },
        uploads: UploadConfig {
            folder: get("UPLOAD_FOLDER")
                .unwrap_or_else(|| "static/uploads".into())
                .into(),
        },
        messaging: MessagingConfig {
            link_base: get("MESSAGING_LINK_BASE").unwrap_or(defaults.link_base),
            public_base_url: get("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
        },
        sessions: SessionConfig {
            idle_timeout: Duration::from_secs(idle_timeout_secs),
        },
        admin,
    })
}
