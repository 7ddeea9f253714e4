use std::{sync::Arc, time::Duration};

use anyhow::Result;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use storefront::{
    app,
    app_state::AppState,
    auth,
    bootstrap::{self, serve},
    config, db,
    repositories::{PgOrderRepository, PgProductRepository, PgUserRepository},
    session::{self, MemorySessionStore},
    uploads::LocalImageStore,
};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let pool = db::create_pool(&config.database).await?;
    let sessions = Arc::new(MemorySessionStore::with_idle_timeout(
        config.sessions.idle_timeout,
    ));
    tokio::spawn(session::sweep_idle_sessions(
        sessions.clone(),
        SESSION_SWEEP_INTERVAL,
    ));

    let state = AppState {
        products: Arc::new(PgProductRepository::new(pool.clone())),
        orders: Arc::new(PgOrderRepository::new(pool.clone())),
        users: Arc::new(PgUserRepository::new(pool)),
        sessions,
        images: Arc::new(LocalImageStore::new(&config.uploads.folder)),
        messaging: Arc::new(config.messaging.clone()),
    };

    if let Some(admin) = &config.admin {
        auth::ensure_admin(state.users.as_ref(), &admin.username, &admin.password).await?;
    }

    tracing::info!("Bootstrapping...");
    let app = app(state, &config.uploads.folder);
    serve("Storefront", app, &config.server).await
}
