use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    storage::ObjectStore,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub storage: Arc<ObjectStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, storage: ObjectStore, config: AppConfig) -> Self {
        let orm = crate::db::orm_from_pool(pool.clone());
        Self {
            pool,
            orm,
            storage: Arc::new(storage),
            config: Arc::new(config),
        }
    }
}
