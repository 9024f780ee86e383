//! # Servidor Service Module
//!
//! Roster management under `/api/servidores`.
//!
//! ## Sub-modules:
//! - `register`: multipart registration with photo upload.
//! - `list`: the whole roster as JSON.
//! - `delete`: removal by id.
//! - `upload`: filename pre-fill and photo storage used by `register`.
//!
//! # Registered Routes:
//!
//! *   **`POST /`**: `register::process`. Responds `201` with the new record,
//!     `400` on validation errors and `409` when the MASP already exists.
//! *   **`GET /`**: `list::process`.
//! *   **`DELETE /{id}`**: `delete::process`. Responds `204`, or `404` when no
//!     servidor has that id.

mod delete;
mod list;
mod register;
mod upload;

use actix_web::web::{delete as delete_route, get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/servidores";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(register::process))
        .route("", get().to(list::process))
        .route("/{id}", delete_route().to(delete::process))
}
