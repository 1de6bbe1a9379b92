use sqlx::PgPool;

pub mod storage;
pub mod subscription;
pub mod user;

/// Postgres-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PostgresPersistence {
    pub(crate) pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
