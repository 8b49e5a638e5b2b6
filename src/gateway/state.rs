use std::sync::Arc;

use crate::auth::JwtAuth;
use crate::db::Database;
use crate::placement::PlacementService;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    /// Placement pipeline entry point
    pub placement: Arc<PlacementService>,
    /// Caller token verification
    pub auth: Arc<JwtAuth>,
    /// PostgreSQL pool, absent when running on the in-memory store
    pub pg_db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        placement: Arc<PlacementService>,
        auth: Arc<JwtAuth>,
        pg_db: Option<Arc<Database>>,
    ) -> Self {
        Self {
            placement,
            auth,
            pg_db,
        }
    }
}
