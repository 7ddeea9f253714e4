use std::sync::Arc;

use crate::{
    config::MessagingConfig,
    repositories::{OrderRepository, ProductRepository, UserRepository},
    session::SessionStore,
    uploads::ImageStore,
};

/// Everything a handler can reach. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub images: Arc<dyn ImageStore>,
    pub messaging: Arc<MessagingConfig>,
}
