//! HTTP API for the order assistant
//!
//! JSON endpoints plus a Server-Sent Events stream per session. Rendering is
//! left to the client.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::ProductionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<ProductionManager>,
}

impl AppState {
    pub fn new(sessions: ProductionManager) -> Self {
        Self {
            sessions: Arc::new(sessions),
        }
    }
}
