use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use std::fmt::Display;

pub mod auth;
pub mod blog_posts;
pub mod categories;
pub mod images;

#[derive(Serialize)]
pub struct ValidationProblem {
    pub title: &'static str,
    pub status: u16,
    pub errors: Vec<String>,
}

/// 400 with a list of field-less messages.
pub fn validation_problem(errors: Vec<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ValidationProblem {
        title: "One or more validation errors occurred.",
        status: 400,
        errors,
    })
}

/// Store failures are not retried; log and end the request.
pub fn internal_error(context: &str, e: impl Display) -> HttpResponse {
    log::error!("{}: {}", context, e);
    HttpResponse::InternalServerError().finish()
}

pub fn require_non_empty(errors: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("The {} field is required.", field));
    }
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected JSON body for {}: {}", req.path(), err);
    let response = validation_problem(vec![format!("The request body is invalid: {}", err)]);
    InternalError::from_response(err, response).into()
}

fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected query string for {}: {}", req.path(), err);
    let response = validation_problem(vec![format!("The query string is invalid: {}", err)]);
    InternalError::from_response(err, response).into()
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .configure(auth::config_auth)
            .configure(categories::config_categories)
            .configure(blog_posts::config_blog_posts)
            .configure(images::config_images),
    );
}
