pub mod auth_helpers;
pub mod content_helpers;
pub mod image_helpers;
pub mod token_helpers;
