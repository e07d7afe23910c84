use rusqlite::{params, Connection};

use crate::models::db_operations::uuid_column;
use crate::models::BlogImage;

pub fn add_image(conn: &Connection, image: &BlogImage) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO blog_images (id, file_name, file_extension, title, url, date_created) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            image.id.to_string(),
            image.file_name,
            image.file_extension,
            image.title,
            image.url,
            image.date_created,
        ],
    )?;
    Ok(())
}

/// Newest first.
pub fn read_all_images(conn: &Connection) -> Result<Vec<BlogImage>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, file_name, file_extension, title, url, date_created FROM blog_images ORDER BY date_created DESC, rowid DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(BlogImage {
            id: uuid_column(row, 0)?,
            file_name: row.get(1)?,
            file_extension: row.get(2)?,
            title: row.get(3)?,
            url: row.get(4)?,
            date_created: row.get(5)?,
        })
    })?;
    rows.collect()
}
