//! Server-side sessions keyed by a cookie-held id.
//!
//! Handlers extract a [`Session`], mutate its [`SessionData`] and hand the jar
//! returned by [`Session::save`] back in their response so new visitors get
//! their cookie.

use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};
use tokio::{sync::RwLock, time::Instant};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{app_error::AppError, app_state::AppState, cart::Cart};

pub const SESSION_COOKIE: &str = "storefront_session";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SessionData {
    pub cart: Cart,
    pub user_id: Option<i32>,
    pub flashes: Vec<Flash>,
    pub last_order_id: Option<i32>,
}

impl SessionData {
    pub fn flash(&mut self, category: &str, message: &str) {
        self.flashes.push(Flash {
            category: category.to_string(),
            message: message.to_string(),
        });
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<SessionData>>;

    async fn store(&self, id: &str, data: SessionData) -> Result<()>;

    async fn remove(&self, id: &str) -> Result<()>;
}

/// Default idle timeout of [`MemorySessionStore::new`].
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

struct StoredSession {
    data: SessionData,
    last_seen: Instant,
}

/// Process-local sessions. Entries idle for longer than the timeout are
/// treated as gone and dropped by [`MemorySessionStore::evict_idle`].
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
    idle_timeout: Duration,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Drops every idle session and returns how many were removed.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen.elapsed() < self.idle_timeout);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionData>> {
        let mut sessions = self.sessions.write().await;
        let expired = match sessions.get_mut(id) {
            Some(session) if session.last_seen.elapsed() < self.idle_timeout => {
                session.last_seen = Instant::now();
                return Ok(Some(session.data.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            sessions.remove(id);
        }
        Ok(None)
    }

    async fn store(&self, id: &str, data: SessionData) -> Result<()> {
        self.sessions.write().await.insert(
            id.to_string(),
            StoredSession {
                data,
                last_seen: Instant::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}

/// Evicts idle sessions from `store` every `every` until the task is dropped.
pub async fn sweep_idle_sessions(store: Arc<MemorySessionStore>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let evicted = store.evict_idle().await;
        if evicted > 0 {
            debug!("Evicted {} idle session(s)", evicted);
        }
    }
}

/// The current visitor's session, loaded from the store at extraction time.
pub struct Session {
    id: String,
    /// Id this session was known by before [`Session::renew`].
    replaced: Option<String>,
    jar: CookieJar,
    store: Arc<dyn SessionStore>,
    pub data: SessionData,
}

impl Session {
    fn new(id: String, jar: CookieJar, store: Arc<dyn SessionStore>, data: SessionData) -> Self {
        Self {
            id,
            replaced: None,
            jar,
            store,
            data,
        }
    }

    /// Moves the data to a fresh id. The old id stops working on [`Session::save`].
    pub fn renew(&mut self) {
        let previous = std::mem::replace(&mut self.id, Uuid::new_v4().to_string());
        if self.replaced.is_none() {
            self.replaced = Some(previous);
        }
    }

    /// Writes the data back and returns the jar carrying the session cookie.
    ///
    /// A session holding nothing is not kept, and no cookie is issued for it.
    pub async fn save(self) -> Result<CookieJar, AppError> {
        if let Some(previous) = &self.replaced {
            self.store.remove(previous).await?;
        }

        if self.data == SessionData::default() {
            self.store.remove(&self.id).await?;
            return Ok(self.jar);
        }

        self.store.store(&self.id, self.data).await?;

        let cookie = Cookie::build((SESSION_COOKIE, self.id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);

        Ok(self.jar.add(cookie))
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let store = state.sessions.clone();

        let existing = match jar.get(SESSION_COOKIE) {
            Some(cookie) => {
                let id = cookie.value().to_string();
                store.load(&id).await?.map(|data| (id, data))
            }
            None => None,
        };

        let (id, data) =
            existing.unwrap_or_else(|| (Uuid::new_v4().to_string(), SessionData::default()));

        Ok(Session::new(id, jar, store, data))
    }
}
