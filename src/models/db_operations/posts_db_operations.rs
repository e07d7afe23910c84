use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::db_operations::categories_db_operations;
use crate::models::db_operations::uuid_column;
use crate::models::{BlogPost, BlogPostDraft, Category};

const POST_COLUMNS: &str = "id, title, short_description, content, featured_image_url, url_handle, published_date, author, is_visible";

/// Maps a `blog_posts` row; categories are attached by the caller.
fn map_post(row: &Row) -> rusqlite::Result<BlogPost> {
    Ok(BlogPost {
        id: uuid_column(row, 0)?,
        title: row.get(1)?,
        short_description: row.get(2)?,
        content: row.get(3)?,
        featured_image_url: row.get(4)?,
        url_handle: row.get(5)?,
        published_date: row.get(6)?,
        author: row.get(7)?,
        is_visible: row.get(8)?,
        categories: Vec::new(),
    })
}

/// Looks up each requested id. Ids with no matching category are dropped and
/// repeated ids collapse to their first occurrence.
fn resolve_categories(conn: &Connection, ids: &[Uuid]) -> Result<Vec<Category>, rusqlite::Error> {
    let mut resolved: Vec<Category> = Vec::with_capacity(ids.len());
    for id in ids {
        if resolved.iter().any(|c| c.id == *id) {
            continue;
        }
        match categories_db_operations::read_category_by_id(conn, *id)? {
            Some(category) => resolved.push(category),
            None => log::debug!("Dropping unknown category id {} from post associations", id),
        }
    }
    Ok(resolved)
}

fn read_categories_for_post(conn: &Connection, post_id: Uuid) -> Result<Vec<Category>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.url_handle FROM blog_post_categories bpc
         JOIN categories c ON c.id = bpc.category_id
         WHERE bpc.blog_post_id = ?1
         ORDER BY bpc.rowid",
    )?;
    let rows = stmt.query_map([post_id.to_string()], |row| {
        Ok(Category { id: uuid_column(row, 0)?, name: row.get(1)?, url_handle: row.get(2)? })
    })?;
    rows.collect()
}

/// Rebuilds the association rows for a post from scratch.
fn replace_associations(tx: &Transaction, post_id: Uuid, categories: &[Category]) -> Result<(), rusqlite::Error> {
    let post_id = post_id.to_string();
    tx.execute("DELETE FROM blog_post_categories WHERE blog_post_id = ?1", [&post_id])?;
    let mut stmt = tx.prepare("INSERT INTO blog_post_categories (blog_post_id, category_id) VALUES (?1, ?2)")?;
    for category in categories {
        stmt.execute(params![post_id, category.id.to_string()])?;
    }
    Ok(())
}

fn read_post_where(conn: &Connection, clause: &str, value: &str) -> Result<Option<BlogPost>, rusqlite::Error> {
    let sql = format!("SELECT {} FROM blog_posts WHERE {} = ?1", POST_COLUMNS, clause);
    let post = conn.query_row(&sql, [value], map_post).optional()?;
    match post {
        Some(mut post) => {
            post.categories = read_categories_for_post(conn, post.id)?;
            Ok(Some(post))
        }
        None => Ok(None),
    }
}

pub fn create_post(conn: &mut Connection, draft: &BlogPostDraft) -> Result<BlogPost, rusqlite::Error> {
    let tx = conn.transaction()?;
    let categories = resolve_categories(&tx, &draft.category_ids)?;

    let post = BlogPost {
        id: Uuid::new_v4(),
        title: draft.title.clone(),
        short_description: draft.short_description.clone(),
        content: draft.content.clone(),
        featured_image_url: draft.featured_image_url.clone(),
        url_handle: draft.url_handle.clone(),
        published_date: draft.published_date,
        author: draft.author.clone(),
        is_visible: draft.is_visible,
        categories,
    };

    tx.execute(
        &format!("INSERT INTO blog_posts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)", POST_COLUMNS),
        params![
            post.id.to_string(),
            post.title,
            post.short_description,
            post.content,
            post.featured_image_url,
            post.url_handle,
            post.published_date,
            post.author,
            post.is_visible,
        ],
    )?;
    replace_associations(&tx, post.id, &post.categories)?;
    tx.commit()?;

    Ok(post)
}

/// Every post with its categories attached. Associations are fetched in one pass.
pub fn read_all_posts(conn: &Connection) -> Result<Vec<BlogPost>, rusqlite::Error> {
    let mut posts: Vec<BlogPost> = {
        let mut stmt = conn.prepare(&format!("SELECT {} FROM blog_posts ORDER BY rowid", POST_COLUMNS))?;
        let rows = stmt.query_map([], map_post)?;
        rows.collect::<Result<_, _>>()?
    };

    let mut by_post: HashMap<Uuid, Vec<Category>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT bpc.blog_post_id, c.id, c.name, c.url_handle FROM blog_post_categories bpc
             JOIN categories c ON c.id = bpc.category_id
             ORDER BY bpc.rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                uuid_column(row, 0)?,
                Category { id: uuid_column(row, 1)?, name: row.get(2)?, url_handle: row.get(3)? },
            ))
        })?;
        for row in rows {
            let (post_id, category) = row?;
            by_post.entry(post_id).or_default().push(category);
        }
    }

    for post in &mut posts {
        post.categories = by_post.remove(&post.id).unwrap_or_default();
    }
    Ok(posts)
}

pub fn read_post_by_id(conn: &Connection, id: Uuid) -> Result<Option<BlogPost>, rusqlite::Error> {
    read_post_where(conn, "id", &id.to_string())
}

pub fn read_post_by_url_handle(conn: &Connection, url_handle: &str) -> Result<Option<BlogPost>, rusqlite::Error> {
    read_post_where(conn, "url_handle", url_handle)
}

/// Overwrites every scalar field and replaces the association set wholesale:
/// categories missing from the draft are detached.
pub fn update_post(conn: &mut Connection, id: Uuid, draft: &BlogPostDraft) -> Result<Option<BlogPost>, rusqlite::Error> {
    let tx = conn.transaction()?;

    let changed = tx.execute(
        "UPDATE blog_posts SET title = ?1, short_description = ?2, content = ?3, featured_image_url = ?4,
            url_handle = ?5, published_date = ?6, author = ?7, is_visible = ?8
         WHERE id = ?9",
        params![
            draft.title,
            draft.short_description,
            draft.content,
            draft.featured_image_url,
            draft.url_handle,
            draft.published_date,
            draft.author,
            draft.is_visible,
            id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Ok(None);
    }

    let categories = resolve_categories(&tx, &draft.category_ids)?;
    replace_associations(&tx, id, &categories)?;
    tx.commit()?;

    Ok(Some(BlogPost {
        id,
        title: draft.title.clone(),
        short_description: draft.short_description.clone(),
        content: draft.content.clone(),
        featured_image_url: draft.featured_image_url.clone(),
        url_handle: draft.url_handle.clone(),
        published_date: draft.published_date,
        author: draft.author.clone(),
        is_visible: draft.is_visible,
        categories,
    }))
}

/// Removes the post and its association rows, returning the pre-deletion snapshot.
pub fn delete_post(conn: &mut Connection, id: Uuid) -> Result<Option<BlogPost>, rusqlite::Error> {
    let tx = conn.transaction()?;
    let existing = read_post_by_id(&tx, id)?;
    if existing.is_some() {
        let id = id.to_string();
        tx.execute("DELETE FROM blog_post_categories WHERE blog_post_id = ?1", [&id])?;
        tx.execute("DELETE FROM blog_posts WHERE id = ?1", [&id])?;
    }
    tx.commit()?;
    Ok(existing)
}
