use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, web::Bytes, web::BytesMut};
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::models::db_operations::{images_db_operations, DbError, EntityStore};
use crate::models::BlogImage;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_TEXT_FIELD_BYTES: usize = 1024;
const ALLOWED_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Invalid image upload: {}", .0.join(" "))]
    Validation(Vec<String>),
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blocking task error: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

/// The parts of an upload form, collected before anything touches disk.
#[derive(Debug, Default)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub original_file_name: String,
    pub file_name: String,
    pub title: String,
}

impl ImageUpload {
    /// Lowercased extension of the uploaded file, leading dot included.
    pub fn extension(&self) -> String {
        Path::new(&self.original_file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.bytes.is_empty() {
            errors.push("No file was uploaded.".to_string());
        }
        if !ALLOWED_EXTENSIONS.contains(&self.extension().as_str()) {
            errors.push("Unsupported file format".to_string());
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            errors.push("File size cannot be more than 10MB".to_string());
        }
        // The stored name becomes a path segment and a URL segment.
        if self.file_name.is_empty()
            || !self.file_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            errors.push("File name may only contain letters, numbers, hyphens and underscores.".to_string());
        }
        if self.title.trim().is_empty() {
            errors.push("Title is required.".to_string());
        }
        errors
    }
}

/// Buffers a field, failing as soon as it grows past `limit` bytes.
async fn read_capped<S>(field: &mut S, limit: usize, too_large: &str) -> Result<BytesMut, ImageError>
where
    S: Stream<Item = Result<Bytes, MultipartError>> + Unpin,
{
    let mut data = BytesMut::new();
    while let Some(chunk) = field.next().await {
        data.extend_from_slice(&chunk?);
        if data.len() > limit {
            return Err(ImageError::Validation(vec![too_large.to_string()]));
        }
    }
    Ok(data)
}

async fn read_text_field<S>(field: &mut S, name: &str) -> Result<String, ImageError>
where
    S: Stream<Item = Result<Bytes, MultipartError>> + Unpin,
{
    let too_large = format!("The {} field cannot be longer than {} bytes.", name, MAX_TEXT_FIELD_BYTES);
    let data = read_capped(field, MAX_TEXT_FIELD_BYTES, &too_large).await?;
    String::from_utf8(data.to_vec())
        .map_err(|_| ImageError::Validation(vec!["Invalid UTF-8 in form field.".to_string()]))
}

/// Drains a multipart payload with `file`, `fileName` and `title` fields.
pub async fn read_upload(mut payload: Multipart) -> Result<ImageUpload, ImageError> {
    let mut upload = ImageUpload::default();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field.content_disposition().get_name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "file" => {
                upload.original_file_name = field
                    .content_disposition()
                    .get_filename()
                    .unwrap_or_default()
                    .to_string();
                let data = read_capped(&mut field, MAX_IMAGE_BYTES, "File size cannot be more than 10MB").await?;
                upload.bytes = data.to_vec();
            }
            "fileName" => upload.file_name = read_text_field(&mut field, "fileName").await?.trim().to_string(),
            "title" => upload.title = read_text_field(&mut field, "title").await?,
            _ => (),
        }
    }

    Ok(upload)
}

/// Writes the file, then records it. The two steps are not atomic: a failed insert
/// leaves the written file behind.
pub async fn save_image<S: EntityStore + ?Sized>(
    store: &S,
    images_dir: &Path,
    upload: ImageUpload,
    origin: &str,
) -> Result<BlogImage, ImageError> {
    let errors = upload.validate();
    if !errors.is_empty() {
        return Err(ImageError::Validation(errors));
    }

    let file_extension = upload.extension();
    let stored_name = format!("{}{}", upload.file_name, file_extension);
    let image = BlogImage {
        id: Uuid::new_v4(),
        url: format!("{}/images/{}", origin.trim_end_matches('/'), stored_name),
        file_name: upload.file_name,
        file_extension,
        title: upload.title,
        date_created: Utc::now(),
    };

    let dir = images_dir.to_path_buf();
    let path: PathBuf = dir.join(&stored_name);
    let bytes = upload.bytes;
    web::block(move || {
        fs::create_dir_all(&dir)?;
        fs::write(&path, bytes)
    })
    .await??;

    let conn = store.connection()?;
    images_db_operations::add_image(&conn, &image).map_err(DbError::from)?;

    log::info!("Stored image '{}' at {}", image.full_file_name(), image.url);
    Ok(image)
}

pub fn fetch_all_images<S: EntityStore + ?Sized>(store: &S) -> Result<Vec<BlogImage>, DbError> {
    let conn = store.connection()?;
    Ok(images_db_operations::read_all_images(&conn)?)
}
