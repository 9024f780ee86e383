use crate::error::{AppError, Result};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use log::info;

/// Actix web handler for `DELETE /api/servidores/{id}`.
///
/// The row is removed for good. The photo file stays in the upload directory.
pub async fn process(state: web::Data<AppState>, id: web::Path<i64>) -> Result<HttpResponse> {
    let id = id.into_inner();
    if state.store.delete(id)? {
        info!("servidor {id} deleted");
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::NotFound(format!("Servidor {id} não encontrado.")))
    }
}
