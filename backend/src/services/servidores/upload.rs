//! Photo upload helpers: filename pre-fill, filename sanitizing and storage.

use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// Name and MASP guessed from a photo named like `joao_da_silva_12345.jpg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameHint {
    pub nome: String,
    pub masp: String,
}

/// Splits the file stem on `_`: the last part is the MASP and the rest,
/// capitalized, is the name. Needs at least two parts.
pub fn hint_from_filename(filename: &str) -> Option<FilenameHint> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 2 {
        return None;
    }
    let (name_parts, masp) = parts.split_at(parts.len() - 1);
    let masp = masp[0].trim();
    let nome = name_parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| capitalize(p))
        .collect::<Vec<_>>()
        .join(" ");
    if masp.is_empty() || nome.is_empty() {
        return None;
    }
    Some(FilenameHint {
        nome,
        masp: masp.to_string(),
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Reduces a client-supplied filename to a safe single path component.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let re = Regex::new(r"[^\p{L}\p{N}._-]+")
        .map_err(|e| AppError::Internal(format!("regex error: {e}")))?;
    let cleaned = re.replace_all(base.trim(), "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() || Path::new(cleaned).extension().is_none() {
        return Err(AppError::Validation(format!(
            "Nome de arquivo inválido: '{filename}'"
        )));
    }
    Ok(cleaned.to_string())
}

/// An uploaded photo written to a hidden temporary file in the upload
/// directory. Nothing at `path` changes until `commit` is called; dropping it
/// removes the temporary file.
#[derive(Debug)]
pub struct StagedPhoto {
    file: NamedTempFile,
    /// Final location, keyed by the (sanitized) original name.
    pub path: PathBuf,
}

impl StagedPhoto {
    /// Moves the photo to its final path, replacing any file already there.
    pub fn commit(self) -> Result<PathBuf> {
        self.file
            .persist(&self.path)
            .map_err(|e| AppError::Io(e.error))?;
        Ok(self.path)
    }
}

/// Writes `bytes` next to where `filename` will be stored, without touching
/// an existing file of that name.
pub fn stage_photo(storage: &StorageConfig, filename: &str, bytes: &[u8]) -> Result<StagedPhoto> {
    let name = sanitize_filename(filename)?;
    fs::create_dir_all(&storage.upload_dir)?;
    let mut file = Builder::new()
        .prefix(".upload-")
        .tempfile_in(&storage.upload_dir)?;
    file.write_all(bytes)?;
    Ok(StagedPhoto {
        file,
        path: storage.upload_dir.join(name),
    })
}
