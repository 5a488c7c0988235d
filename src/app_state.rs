use std::sync::Arc;

use crate::{aliases::DbPool, settlement::Settlement};

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub settlement: Arc<dyn Settlement>,
}
