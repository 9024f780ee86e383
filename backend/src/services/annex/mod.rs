//! # Annex Service Module
//!
//! Produces the "anexo fotográfico" DOCX for a list of selected servidores.
//!
//! ## Sub-modules:
//! - `generate`: HTTP handler, record lookup and debug copy.
//! - `document`: layout of the photo grid and reference table, DOCX rendering.
//! - `photo`: loading and resampling of stored photos.
//!
//! # Registered Routes:
//!
//! *   **`POST /api/annex`**:
//!     - **Handler**: `generate::process`
//!     - **Description**: Expects a JSON `ExportRequest` whose `servidores`
//!       field lists ids in annex order. Responds with the DOCX as an
//!       attachment.

mod document;
mod generate;
mod photo;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/annex";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(generate::process))
}
