use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::Row;
use thiserror::Error;
use uuid::Uuid;

use crate::DbPool;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

pub type StoreConnection = PooledConnection<SqliteConnectionManager>;

/// The transactional relational store the repositories run against.
pub trait EntityStore {
    fn connection(&self) -> Result<StoreConnection, DbError>;
}

impl EntityStore for DbPool {
    fn connection(&self) -> Result<StoreConnection, DbError> {
        Ok(self.get()?)
    }
}

/// Reads a UUID stored as TEXT.
pub(crate) fn uuid_column(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub mod categories_db_operations;
pub mod images_db_operations;
pub mod posts_db_operations;
pub mod users_db_operations;
