use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::config::Config;
use crate::helper::image_helpers::{self, ImageError};
use crate::middleware::WriterAccess;
use crate::routes::{internal_error, validation_problem};
use crate::DbPool;

pub fn config_images(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/images")
            .service(
                web::resource("")
                    .route(web::get().to(get_all_images))
                    .route(web::post().to(upload_image)),
            ),
    );
}

async fn get_all_images(pool: web::Data<DbPool>) -> impl Responder {
    match image_helpers::fetch_all_images(pool.get_ref()) {
        Ok(images) => HttpResponse::Ok().json(images),
        Err(e) => internal_error("Failed to fetch images", e),
    }
}

async fn upload_image(
    _writer: WriterAccess,
    req: HttpRequest,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    payload: Multipart,
) -> impl Responder {
    // The public URL is built from the host this request arrived on.
    let origin = {
        let info = req.connection_info();
        format!("{}://{}", info.scheme(), info.host())
    };

    let result = match image_helpers::read_upload(payload).await {
        Ok(upload) => image_helpers::save_image(pool.get_ref(), &config.images_dir(), upload, &origin).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(image) => HttpResponse::Ok().json(image),
        Err(ImageError::Validation(errors)) => validation_problem(errors),
        Err(ImageError::Multipart(e)) => validation_problem(vec![format!("Malformed upload: {}", e)]),
        Err(e) => internal_error("Failed to store image", e),
    }
}
