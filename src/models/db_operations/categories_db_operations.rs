use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use uuid::Uuid;

use crate::models::db_operations::uuid_column;
use crate::models::{Category, CategoryDraft};

pub const DEFAULT_PAGE_NUMBER: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    UrlHandle,
}

impl SortField {
    /// Only `name` and `url` are recognized, ignoring case.
    pub fn parse(raw: &str) -> Option<SortField> {
        if raw.eq_ignore_ascii_case("name") {
            Some(SortField::Name)
        } else if raw.eq_ignore_ascii_case("url") {
            Some(SortField::UrlHandle)
        } else {
            None
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::UrlHandle => "url_handle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `asc` in any case ascends; everything else, absent included, descends.
    pub fn parse(raw: Option<&str>) -> SortDirection {
        match raw {
            Some(value) if value.eq_ignore_ascii_case("asc") => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Raw listing parameters as they arrive from a caller.
#[derive(Debug, Clone, Default)]
pub struct CategoryQuery {
    pub filter: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl CategoryQuery {
    fn name_filter(&self) -> Option<&str> {
        self.filter.as_deref().filter(|f| !f.trim().is_empty())
    }

    fn ordering(&self) -> Option<(SortField, SortDirection)> {
        let field = self.sort_by.as_deref().and_then(SortField::parse)?;
        Some((field, SortDirection::parse(self.sort_direction.as_deref())))
    }

    /// Returns `(skip, take)`. A page number below 1 clamps to a zero skip and a
    /// negative page size takes nothing.
    pub fn window(&self) -> (i64, i64) {
        let page_number = self.page_number.unwrap_or(DEFAULT_PAGE_NUMBER);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(0);
        let skip = page_number.saturating_sub(1).saturating_mul(page_size).max(0);
        (skip, page_size)
    }
}

fn map_category(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: uuid_column(row, 0)?,
        name: row.get(1)?,
        url_handle: row.get(2)?,
    })
}

pub fn create_category(conn: &Connection, draft: &CategoryDraft) -> Result<Category, rusqlite::Error> {
    let category = Category {
        id: draft.id.unwrap_or_else(Uuid::new_v4),
        name: draft.name.clone(),
        url_handle: draft.url_handle.clone(),
    };
    conn.execute(
        "INSERT INTO categories (id, name, url_handle) VALUES (?1, ?2, ?3)",
        params![category.id.to_string(), category.name, category.url_handle],
    )?;
    Ok(category)
}

pub fn read_category_by_id(conn: &Connection, id: Uuid) -> Result<Option<Category>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, name, url_handle FROM categories WHERE id = ?1",
        [id.to_string()],
        map_category,
    )
    .optional()
}

/// Overwrites every scalar field of an existing category.
pub fn update_category(conn: &Connection, category: &Category) -> Result<Option<Category>, rusqlite::Error> {
    let changed = conn.execute(
        "UPDATE categories SET name = ?1, url_handle = ?2 WHERE id = ?3",
        params![category.name, category.url_handle, category.id.to_string()],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    Ok(Some(category.clone()))
}

pub fn delete_category(conn: &mut Connection, id: Uuid) -> Result<Option<Category>, rusqlite::Error> {
    let tx = conn.transaction()?;
    let existing = read_category_by_id(&tx, id)?;
    if existing.is_some() {
        tx.execute("DELETE FROM categories WHERE id = ?1", [id.to_string()])?;
    }
    tx.commit()?;
    Ok(existing)
}

/// Filter, then sort, then page.
pub fn read_categories(conn: &Connection, query: &CategoryQuery) -> Result<Vec<Category>, rusqlite::Error> {
    let (skip, take) = query.window();
    let mut sql = String::from("SELECT id, name, url_handle FROM categories");
    let mut values: Vec<&dyn ToSql> = Vec::new();

    let filter = query.name_filter();
    if let Some(filter) = &filter {
        // instr() treats no character as a wildcard; lower() folds ASCII case.
        sql.push_str(" WHERE instr(lower(name), lower(?)) > 0");
        values.push(filter);
    }

    // rowid breaks ties so equal sort keys cannot straddle pages differently.
    match query.ordering() {
        Some((field, direction)) => {
            sql.push_str(&format!(" ORDER BY {} {}, rowid", field.column(), direction.keyword()))
        }
        None => sql.push_str(" ORDER BY rowid"),
    }

    sql.push_str(" LIMIT ? OFFSET ?");
    values.push(&take);
    values.push(&skip);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(values.as_slice(), map_category)?;
    rows.collect()
}

pub fn count_categories(conn: &Connection, filter: Option<&str>) -> Result<i64, rusqlite::Error> {
    match filter.filter(|f| !f.trim().is_empty()) {
        Some(filter) => conn.query_row(
            "SELECT COUNT(*) FROM categories WHERE instr(lower(name), lower(?1)) > 0",
            [filter],
            |row| row.get(0),
        ),
        None => conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0)),
    }
}
