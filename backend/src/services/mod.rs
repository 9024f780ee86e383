pub mod annex;
pub mod selection;
pub mod servidores;

use crate::config::StorageConfig;
use actix_files::Files;

/// URL prefix under which stored photos are served.
pub const UPLOADS_PATH: &str = "/uploads";

/// Static file service for the upload directory.
pub fn uploaded_photos(storage: &StorageConfig) -> Files {
    Files::new(UPLOADS_PATH, &storage.upload_dir)
}
