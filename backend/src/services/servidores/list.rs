use crate::error::Result;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::servidor::Servidor;
use serde::Serialize;
use std::path::Path;

/// A servidor as shown in the roster, with a browser-reachable photo URL.
#[derive(Debug, Serialize)]
pub struct ServidorListing {
    #[serde(flatten)]
    pub servidor: Servidor,
    pub foto_url: Option<String>,
}

impl From<Servidor> for ServidorListing {
    fn from(servidor: Servidor) -> Self {
        let foto_url = Path::new(&servidor.foto)
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| format!("{}/{}", crate::services::UPLOADS_PATH, n));
        ServidorListing { servidor, foto_url }
    }
}

/// Actix web handler for `GET /api/servidores`: the whole roster in store order.
pub async fn process(state: web::Data<AppState>) -> Result<HttpResponse> {
    let listing: Vec<ServidorListing> = state
        .store
        .list()?
        .into_iter()
        .map(ServidorListing::from)
        .collect();
    Ok(HttpResponse::Ok().json(listing))
}
