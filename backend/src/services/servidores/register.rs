//! # Servidor Registration Service
//!
//! Handles `POST /api/servidores`, a `multipart/form-data` upload with the
//! text fields `masp`, `nome`, `sexo`, `raca`, `barba`, `careca` and the
//! photo in the file field `foto`.
//!
//! ## Workflow
//!
//! 1.  All parts are drained into a `RegistrationForm`. The photo is kept in
//!     memory so nothing touches the disk before validation.
//! 2.  If the photo filename looks like `Name_Parts_MASP.ext`, empty `nome`
//!     and `masp` fields are pre-filled from it.
//! 3.  Required fields and the photo extension are validated.
//! 4.  The photo is staged in a temporary file in the upload directory and
//!     the record is inserted. Only once the insert succeeds is the photo
//!     moved to its final name, so a rejected insert (e.g. duplicate MASP)
//!     never touches a photo already on disk.

use super::upload::{hint_from_filename, stage_photo};
use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::ServidorStore;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::model::flag::Flag;
use common::model::servidor::{NewServidor, Servidor};
use futures_util::StreamExt;
use log::{info, warn};

const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Raw registration input, before validation.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub masp: String,
    pub nome: String,
    pub sexo: String,
    pub raca: String,
    pub barba: Option<String>,
    pub careca: Option<String>,
    pub foto: Option<UploadedPhoto>,
}

pub async fn process(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse> {
    let form = read_form(payload).await?;
    let servidor = register(&state.store, &state.storage, form)?;
    info!("servidor {} registered with MASP {}", servidor.id, servidor.masp);
    Ok(HttpResponse::Created().json(servidor))
}

async fn read_form(mut payload: Multipart) -> Result<RegistrationForm> {
    let mut form = RegistrationForm::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("Formulário inválido: {e}")))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()))
            .unwrap_or_default();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()));

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::Validation(format!("Formulário inválido: {e}")))?;
            if bytes.len() + chunk.len() > MAX_PHOTO_BYTES {
                return Err(AppError::Validation(
                    "Arquivo muito grande (máximo 10 MB).".to_string(),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        if name == "foto" {
            // Browsers send an empty, nameless part when no file was chosen.
            form.foto = filename
                .filter(|f| !f.is_empty())
                .map(|filename| UploadedPhoto { filename, bytes });
            continue;
        }

        let value = String::from_utf8(bytes)
            .map_err(|_| AppError::Validation(format!("Campo '{name}' não é UTF-8 válido.")))?
            .trim()
            .to_string();
        match name.as_str() {
            "masp" => form.masp = value,
            "nome" => form.nome = value,
            "sexo" => form.sexo = value,
            "raca" => form.raca = value,
            "barba" => form.barba = Some(value),
            "careca" => form.careca = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

/// Validates `form`, stores its photo and inserts the servidor.
pub fn register(
    store: &ServidorStore,
    storage: &StorageConfig,
    mut form: RegistrationForm,
) -> Result<Servidor> {
    let photo = match form.foto.take() {
        Some(photo) if storage.is_allowed_file(&photo.filename) => Some(photo),
        _ => None,
    };

    if let Some(hint) = photo.as_ref().and_then(|p| hint_from_filename(&p.filename)) {
        if form.nome.is_empty() {
            form.nome = hint.nome;
        }
        if form.masp.is_empty() {
            form.masp = hint.masp;
        }
    }

    if form.masp.is_empty() || form.nome.is_empty() || form.sexo.is_empty() || form.raca.is_empty()
    {
        return Err(AppError::Validation(
            "Todos os campos são obrigatórios.".to_string(),
        ));
    }

    let Some(photo) = photo else {
        return Err(AppError::Validation(format!(
            "Por favor, envie uma foto válida ({}).",
            storage.allowed_extensions.join(", ").to_uppercase()
        )));
    };

    let barba = parse_flag("barba", form.barba.as_deref())?;
    let careca = parse_flag("careca", form.careca.as_deref())?;

    let staged = stage_photo(storage, &photo.filename, &photo.bytes)?;
    let new = NewServidor {
        masp: form.masp,
        nome: form.nome,
        sexo: form.sexo,
        raca: form.raca,
        foto: staged.path.to_string_lossy().to_string(),
        barba,
        careca,
    };

    let servidor = store.insert(&new)?;
    if let Err(e) = staged.commit() {
        if let Err(undo) = store.delete(servidor.id) {
            warn!("could not roll back servidor {}: {}", servidor.id, undo);
        }
        return Err(e);
    }
    Ok(servidor)
}

fn parse_flag(field: &str, raw: Option<&str>) -> Result<Flag> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Flag::default()),
        Some(value) => value
            .parse()
            .map_err(|e| AppError::Validation(format!("Campo '{field}': {e}"))),
    }
}
