//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use streaming_catalog_core::CatalogService;

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub config: Arc<Config>,
}
