use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, Result as RusqliteResult, Transaction};
use std::path::Path;
use thiserror::Error;

use crate::models::Role;
use crate::DbPool;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

fn enable_foreign_keys(conn: &mut Connection) -> RusqliteResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Opens a pooled connection manager for the database file and provisions it.
pub fn create_pool(db_path: &Path) -> Result<DbPool, SetupError> {
    let manager = SqliteConnectionManager::file(db_path).with_init(enable_foreign_keys);
    let pool = Pool::builder().build(manager)?;
    let mut conn = pool.get()?;
    setup_database(&mut conn)?;
    Ok(pool)
}

/// A provisioned in-memory store. Every pooled connection to `:memory:` is its own
/// database, so the pool is capped at a single connection.
pub fn create_memory_pool() -> Result<DbPool, SetupError> {
    let manager = SqliteConnectionManager::memory().with_init(enable_foreign_keys);
    let pool = Pool::builder().max_size(1).build(manager)?;
    let mut conn = pool.get()?;
    setup_database(&mut conn)?;
    Ok(pool)
}

/// Creates every table if missing and seeds the fixed roles. Safe to run repeatedly.
pub fn setup_database(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;

    log::debug!("Ensuring 'categories' table exists");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            url_handle TEXT NOT NULL
        )",
        [],
    )?;

    log::debug!("Ensuring 'blog_posts' table exists");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS blog_posts (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            short_description TEXT NOT NULL,
            content TEXT NOT NULL,
            featured_image_url TEXT NOT NULL,
            url_handle TEXT NOT NULL,
            published_date TEXT NOT NULL,
            author TEXT NOT NULL,
            is_visible INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_blog_posts_url_handle ON blog_posts (url_handle)", [])?;

    log::debug!("Ensuring 'blog_post_categories' table exists");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS blog_post_categories (
            blog_post_id TEXT NOT NULL,
            category_id TEXT NOT NULL,
            PRIMARY KEY (blog_post_id, category_id),
            FOREIGN KEY (blog_post_id) REFERENCES blog_posts(id) ON DELETE CASCADE,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
        )",
        [],
    )?;

    log::debug!("Ensuring 'blog_images' table exists");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS blog_images (
            id TEXT PRIMARY KEY,
            file_name TEXT NOT NULL,
            file_extension TEXT NOT NULL,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            date_created TEXT NOT NULL
        )",
        [],
    )?;

    log::debug!("Ensuring 'users', 'roles' and 'user_roles' tables exist");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE TABLE IF NOT EXISTS roles (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;
    tx.execute(
        "CREATE TABLE IF NOT EXISTS user_roles (
            user_id TEXT NOT NULL,
            role_id TEXT NOT NULL,
            PRIMARY KEY (user_id, role_id),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE
        )",
        [],
    )?;

    seed_roles(&tx)?;

    tx.commit()?;
    Ok(())
}

fn seed_roles(tx: &Transaction) -> RusqliteResult<()> {
    for role in Role::ALL {
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO roles (id, name) VALUES (?1, ?2)",
            params![role.id().to_string(), role.name()],
        )?;
        if inserted > 0 {
            log::info!("Seeded role '{}' ({})", role.name(), role.id());
        }
    }
    Ok(())
}
