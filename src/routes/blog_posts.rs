use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::helper::content_helpers;
use crate::middleware::WriterAccess;
use crate::models::BlogPostDraft;
use crate::routes::{internal_error, require_non_empty, validation_problem};
use crate::DbPool;

/// Shared by create and update: the category list is always the complete set.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlogPostRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    short_description: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    featured_image_url: String,
    #[serde(default)]
    url_handle: String,
    published_date: DateTime<Utc>,
    #[serde(default)]
    author: String,
    #[serde(default)]
    is_visible: bool,
    #[serde(default)]
    categories: Vec<Uuid>,
}

impl BlogPostRequest {
    fn into_draft(self) -> Result<BlogPostDraft, Vec<String>> {
        let mut errors = Vec::new();
        require_non_empty(&mut errors, "Title", &self.title);
        require_non_empty(&mut errors, "UrlHandle", &self.url_handle);
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(BlogPostDraft {
            title: self.title,
            short_description: self.short_description,
            content: self.content,
            featured_image_url: self.featured_image_url,
            url_handle: self.url_handle,
            published_date: self.published_date,
            author: self.author,
            is_visible: self.is_visible,
            category_ids: self.categories,
        })
    }
}

pub fn config_blog_posts(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/blogposts")
            .service(
                web::resource("")
                    .route(web::post().to(create_blog_post))
                    .route(web::get().to(get_all_blog_posts)),
            )
            // GET accepts an id or a URL handle; PUT and DELETE require an id.
            .service(
                web::resource("/{key}")
                    .route(web::get().to(get_blog_post))
                    .route(web::put().to(update_blog_post))
                    .route(web::delete().to(delete_blog_post)),
            ),
    );
}

async fn create_blog_post(
    _writer: WriterAccess,
    pool: web::Data<DbPool>,
    body: web::Json<BlogPostRequest>,
) -> impl Responder {
    let draft = match body.into_inner().into_draft() {
        Ok(draft) => draft,
        Err(errors) => return validation_problem(errors),
    };

    match content_helpers::create_post(pool.get_ref(), &draft) {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(e) => internal_error("Failed to create blog post", e),
    }
}

async fn get_all_blog_posts(pool: web::Data<DbPool>) -> impl Responder {
    match content_helpers::fetch_all_posts(pool.get_ref()) {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(e) => internal_error("Failed to fetch blog posts", e),
    }
}

/// `{key}` is either a post id or its URL handle.
async fn get_blog_post(pool: web::Data<DbPool>, key: web::Path<String>) -> impl Responder {
    match content_helpers::fetch_post_by_key(pool.get_ref(), &key) {
        Ok(Some(post)) => HttpResponse::Ok().json(post),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => internal_error("Failed to fetch blog post", e),
    }
}

async fn update_blog_post(
    _writer: WriterAccess,
    pool: web::Data<DbPool>,
    id: web::Path<Uuid>,
    body: web::Json<BlogPostRequest>,
) -> impl Responder {
    let draft = match body.into_inner().into_draft() {
        Ok(draft) => draft,
        Err(errors) => return validation_problem(errors),
    };

    match content_helpers::update_post(pool.get_ref(), id.into_inner(), &draft) {
        Ok(Some(post)) => HttpResponse::Ok().json(post),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => internal_error("Failed to update blog post", e),
    }
}

async fn delete_blog_post(_writer: WriterAccess, pool: web::Data<DbPool>, id: web::Path<Uuid>) -> impl Responder {
    match content_helpers::delete_post(pool.get_ref(), id.into_inner()) {
        Ok(Some(post)) => {
            log::info!("Deleted blog post '{}' ({})", post.url_handle, post.id);
            HttpResponse::Ok().json(post)
        }
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => internal_error("Failed to delete blog post", e),
    }
}
