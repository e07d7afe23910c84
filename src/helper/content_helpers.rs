use uuid::Uuid;

use crate::models::db_operations::categories_db_operations::{self, CategoryQuery};
use crate::models::db_operations::{posts_db_operations, DbError, EntityStore};
use crate::models::{BlogPost, BlogPostDraft, Category, CategoryDraft};

// Each call checks out a single connection and releases it before returning.

pub fn create_category<S: EntityStore + ?Sized>(store: &S, draft: &CategoryDraft) -> Result<Category, DbError> {
    let conn = store.connection()?;
    Ok(categories_db_operations::create_category(&conn, draft)?)
}

pub fn fetch_category<S: EntityStore + ?Sized>(store: &S, id: Uuid) -> Result<Option<Category>, DbError> {
    let conn = store.connection()?;
    Ok(categories_db_operations::read_category_by_id(&conn, id)?)
}

pub fn update_category<S: EntityStore + ?Sized>(store: &S, category: &Category) -> Result<Option<Category>, DbError> {
    let conn = store.connection()?;
    Ok(categories_db_operations::update_category(&conn, category)?)
}

pub fn delete_category<S: EntityStore + ?Sized>(store: &S, id: Uuid) -> Result<Option<Category>, DbError> {
    let mut conn = store.connection()?;
    Ok(categories_db_operations::delete_category(&mut conn, id)?)
}

pub fn list_categories<S: EntityStore + ?Sized>(store: &S, query: &CategoryQuery) -> Result<Vec<Category>, DbError> {
    let conn = store.connection()?;
    Ok(categories_db_operations::read_categories(&conn, query)?)
}

pub fn count_categories<S: EntityStore + ?Sized>(store: &S, filter: Option<&str>) -> Result<i64, DbError> {
    let conn = store.connection()?;
    Ok(categories_db_operations::count_categories(&conn, filter)?)
}

pub fn create_post<S: EntityStore + ?Sized>(store: &S, draft: &BlogPostDraft) -> Result<BlogPost, DbError> {
    let mut conn = store.connection()?;
    let post = posts_db_operations::create_post(&mut conn, draft)?;
    if post.categories.len() < draft.category_ids.len() {
        log::debug!(
            "Post {} kept {} of {} requested categories",
            post.id,
            post.categories.len(),
            draft.category_ids.len()
        );
    }
    Ok(post)
}

pub fn fetch_all_posts<S: EntityStore + ?Sized>(store: &S) -> Result<Vec<BlogPost>, DbError> {
    let conn = store.connection()?;
    Ok(posts_db_operations::read_all_posts(&conn)?)
}

pub fn fetch_post_by_id<S: EntityStore + ?Sized>(store: &S, id: Uuid) -> Result<Option<BlogPost>, DbError> {
    let conn = store.connection()?;
    Ok(posts_db_operations::read_post_by_id(&conn, id)?)
}

pub fn fetch_post_by_url_handle<S: EntityStore + ?Sized>(store: &S, url_handle: &str) -> Result<Option<BlogPost>, DbError> {
    let conn = store.connection()?;
    Ok(posts_db_operations::read_post_by_url_handle(&conn, url_handle)?)
}

/// A key that parses as a UUID is an id; anything else is a URL handle.
pub fn fetch_post_by_key<S: EntityStore + ?Sized>(store: &S, key: &str) -> Result<Option<BlogPost>, DbError> {
    match Uuid::parse_str(key) {
        Ok(id) => fetch_post_by_id(store, id),
        Err(_) => fetch_post_by_url_handle(store, key),
    }
}

pub fn update_post<S: EntityStore + ?Sized>(store: &S, id: Uuid, draft: &BlogPostDraft) -> Result<Option<BlogPost>, DbError> {
    let mut conn = store.connection()?;
    Ok(posts_db_operations::update_post(&mut conn, id, draft)?)
}

pub fn delete_post<S: EntityStore + ?Sized>(store: &S, id: Uuid) -> Result<Option<BlogPost>, DbError> {
    let mut conn = store.connection()?;
    Ok(posts_db_operations::delete_post(&mut conn, id)?)
}
