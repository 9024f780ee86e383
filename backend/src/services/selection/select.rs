//! # Selection Service
//!
//! Builds the list of servidores that goes into an annex: every mandatory
//! servidor, followed by a random sample of the remaining roster narrowed by
//! the requested filters.
//!
//! 1.  Mandatory ids are looked up in store order. Ids that do not exist are
//!     dropped without error.
//! 2.  The candidate pool is every other servidor matching all filters that
//!     are not "Todos".
//! 3.  `min(quantidade_aleatorios, pool size)` candidates are drawn uniformly
//!     without replacement.
//!
//! The random source is a parameter of `select`, so callers decide whether
//! they want fresh randomness (the HTTP handler) or a seeded generator.

use crate::error::Result;
use crate::state::AppState;
use crate::store::ServidorStore;
use actix_web::{web, HttpResponse};
use common::model::servidor::Servidor;
use common::requests::SelectionRequest;
use log::{debug, info};
use rand::seq::IndexedRandom;
use rand::Rng;

/// Actix web handler for `POST /api/selection`.
pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<SelectionRequest>,
) -> Result<HttpResponse> {
    let request = payload.into_inner();
    let selected = select(&state.store, &request, &mut rand::rng())?;
    info!(
        "selection produced {} servidores ({} mandatory requested, {} random requested)",
        selected.len(),
        request.obrigatorios.len(),
        request.quantidade_aleatorios
    );
    Ok(HttpResponse::Ok().json(selected))
}

/// Mandatory servidores (store order) followed by a random, filtered sample.
pub fn select<R>(
    store: &ServidorStore,
    request: &SelectionRequest,
    rng: &mut R,
) -> Result<Vec<Servidor>>
where
    R: Rng + ?Sized,
{
    let mandatory = store.find_by_ids(&request.obrigatorios)?;
    if mandatory.len() < request.obrigatorios.len() {
        let unknown: Vec<i64> = request
            .obrigatorios
            .iter()
            .copied()
            .filter(|id| !mandatory.iter().any(|s| s.id == *id))
            .collect();
        if !unknown.is_empty() {
            debug!("ignoring unknown mandatory ids {:?}", unknown);
        }
    }

    // Only ids that resolved are excluded; unknown ones match nothing anyway.
    let excluded: Vec<i64> = mandatory.iter().map(|s| s.id).collect();
    let pool = store.find_candidates(&excluded, &request.filters)?;

    let amount = request.quantidade_aleatorios.min(pool.len());
    debug!("drawing {} of {} candidates", amount, pool.len());

    let mut selected = mandatory;
    selected.extend(pool.choose_multiple(rng, amount).cloned());
    Ok(selected)
}
