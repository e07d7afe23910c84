use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;

use crate::helper::content_helpers;
use crate::middleware::WriterAccess;
use crate::models::db_operations::categories_db_operations::CategoryQuery;
use crate::models::{Category, CategoryDraft};
use crate::routes::{internal_error, require_non_empty, validation_problem};
use crate::DbPool;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url_handle: String,
}

impl CategoryRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        require_non_empty(&mut errors, "Name", &self.name);
        require_non_empty(&mut errors, "UrlHandle", &self.url_handle);
        errors
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    query: Option<String>,
    sort_by: Option<String>,
    sort_direction: Option<String>,
    page_number: Option<i64>,
    page_size: Option<i64>,
}

#[derive(Deserialize)]
struct CountQuery {
    query: Option<String>,
}

pub fn config_categories(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .service(
                web::resource("")
                    .route(web::post().to(create_category))
                    .route(web::get().to(list_categories)),
            )
            // Registered before "/{id}" so "count" is not parsed as an id.
            .route("/count", web::get().to(count_categories))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_category))
                    .route(web::put().to(update_category))
                    .route(web::delete().to(delete_category)),
            ),
    );
}

async fn create_category(
    _writer: WriterAccess,
    pool: web::Data<DbPool>,
    body: web::Json<CategoryRequest>,
) -> impl Responder {
    let errors = body.validate();
    if !errors.is_empty() {
        return validation_problem(errors);
    }

    let draft = CategoryDraft { id: None, name: body.name.clone(), url_handle: body.url_handle.clone() };
    match content_helpers::create_category(pool.get_ref(), &draft) {
        Ok(category) => HttpResponse::Ok().json(category),
        Err(e) => internal_error("Failed to create category", e),
    }
}

async fn list_categories(pool: web::Data<DbPool>, query: web::Query<ListQuery>) -> impl Responder {
    let query = query.into_inner();
    let category_query = CategoryQuery {
        filter: query.query,
        sort_by: query.sort_by,
        sort_direction: query.sort_direction,
        page_number: query.page_number,
        page_size: query.page_size,
    };

    match content_helpers::list_categories(pool.get_ref(), &category_query) {
        Ok(categories) => HttpResponse::Ok().json(categories),
        Err(e) => internal_error("Failed to list categories", e),
    }
}

async fn count_categories(pool: web::Data<DbPool>, query: web::Query<CountQuery>) -> impl Responder {
    match content_helpers::count_categories(pool.get_ref(), query.query.as_deref()) {
        Ok(count) => HttpResponse::Ok().json(count),
        Err(e) => internal_error("Failed to count categories", e),
    }
}

async fn get_category(pool: web::Data<DbPool>, id: web::Path<Uuid>) -> impl Responder {
    match content_helpers::fetch_category(pool.get_ref(), id.into_inner()) {
        Ok(Some(category)) => HttpResponse::Ok().json(category),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => internal_error("Failed to fetch category", e),
    }
}

async fn update_category(
    _writer: WriterAccess,
    pool: web::Data<DbPool>,
    id: web::Path<Uuid>,
    body: web::Json<CategoryRequest>,
) -> impl Responder {
    let errors = body.validate();
    if !errors.is_empty() {
        return validation_problem(errors);
    }

    let category = Category { id: id.into_inner(), name: body.name.clone(), url_handle: body.url_handle.clone() };
    match content_helpers::update_category(pool.get_ref(), &category) {
        Ok(Some(category)) => HttpResponse::Ok().json(category),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => internal_error("Failed to update category", e),
    }
}

async fn delete_category(_writer: WriterAccess, pool: web::Data<DbPool>, id: web::Path<Uuid>) -> impl Responder {
    match content_helpers::delete_category(pool.get_ref(), id.into_inner()) {
        Ok(Some(category)) => {
            log::info!("Deleted category '{}' ({})", category.name, category.id);
            HttpResponse::Ok().json(category)
        }
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => internal_error("Failed to delete category", e),
    }
}
