//! # Annex Generation Service
//!
//! Backend logic for `POST /api/annex`.
//!
//! 1.  **HTTP Request**: `process` receives an `ExportRequest` with the ids of
//!     the selected servidores, in annex order.
//! 2.  **Lookup**: `resolve_in_order` fetches the records and puts them back
//!     in request order. Unknown ids are dropped, repeated ids kept once.
//! 3.  **Assembly**: the DOCX is built on the blocking pool, since decoding
//!     and resampling photos is CPU bound.
//! 4.  **Response**: the document is returned as an attachment named
//!     `anexo_fotografico.docx`. The number of photos that could not be
//!     placed goes in the `X-Photo-Warnings` header. The warnings themselves
//!     go in `X-Photo-Warning-Details` as base64-encoded JSON, since names are
//!     not ASCII-safe in a header value.
//!
//! If a debug copy path is configured the bytes are written there too. A
//! failure to do so is logged and otherwise ignored.

use super::document::{assemble, Annex, AnnexLayout, DOCX_MIME, DOWNLOAD_NAME};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::ServidorStore;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common::model::servidor::Servidor;
use common::model::warning::PhotoWarning;
use common::requests::ExportRequest;
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const WARNINGS_HEADER: &str = "X-Photo-Warnings";
pub const WARNING_DETAILS_HEADER: &str = "X-Photo-Warning-Details";

pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<ExportRequest>,
) -> Result<HttpResponse> {
    let ids = payload.into_inner().servidores;
    let servidores = resolve_in_order(&state.store, &ids)?;
    let count = servidores.len();

    let annex = tokio::task::spawn_blocking(move || {
        assemble(&servidores, &AnnexLayout::default())
    })
    .await
    .map_err(|e| AppError::Internal(format!("annex task join error: {e}")))??;

    info!(
        "annex generated with {} servidores, {} photo warnings, {} bytes",
        count,
        annex.warnings.len(),
        annex.bytes.len()
    );

    if let Some(path) = &state.annex.debug_copy {
        write_debug_copy(path, &annex);
    }

    let details = encode_warnings(&annex.warnings)?;
    Ok(HttpResponse::Ok()
        .content_type(DOCX_MIME)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(DOWNLOAD_NAME.to_string())],
        })
        .insert_header((WARNINGS_HEADER, annex.warnings.len().to_string()))
        .insert_header((WARNING_DETAILS_HEADER, details))
        .body(annex.bytes))
}

/// Looks up `ids` and returns the matching servidores in the order the ids
/// were given.
pub fn resolve_in_order(store: &ServidorStore, ids: &[i64]) -> Result<Vec<Servidor>> {
    let mut found = store.find_by_ids(ids)?;
    let mut seen = HashSet::new();
    let mut ordered = Vec::with_capacity(found.len());
    for id in ids {
        if !seen.insert(*id) {
            continue;
        }
        if let Some(pos) = found.iter().position(|s| s.id == *id) {
            ordered.push(found.swap_remove(pos));
        }
    }
    Ok(ordered)
}

/// Serializes `warnings` to JSON and base64-encodes it for a header value.
pub fn encode_warnings(warnings: &[PhotoWarning]) -> Result<String> {
    let json = serde_json::to_vec(warnings)
        .map_err(|e| AppError::Internal(format!("could not serialize warnings: {e}")))?;
    Ok(BASE64.encode(json))
}

fn write_debug_copy(path: &Path, annex: &Annex) {
    match fs::write(path, &annex.bytes) {
        Ok(()) => info!("annex debug copy written to {}", path.display()),
        Err(e) => warn!("could not write annex debug copy to {}: {}", path.display(), e),
    }
}
