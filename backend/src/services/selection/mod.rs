//! # Selection Service Module
//!
//! Routes under `/api/selection`.
//!
//! *   **`POST /`**:
//!     - **Handler**: `select::process`
//!     - **Description**: Expects a JSON `SelectionRequest` (mandatory ids,
//!       random sample size and the `filtro_*` fields). Returns the selected
//!       servidores as a JSON array, mandatory ones first.

mod select;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/selection";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(select::process))
}
