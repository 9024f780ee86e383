use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-fatal problem met while placing a photo in the annex.
///
/// The cell for the servidor is still rendered with its caption; only the
/// picture is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoWarning {
    /// 1-based position of the servidor in the annex.
    pub ordinal: usize,
    pub masp: String,
    pub nome: String,
    pub reason: PhotoProblem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhotoProblem {
    /// The record carries no photo path.
    NoPhoto,
    /// The photo path does not point at an existing file.
    FileNotFound(String),
    /// The file exists but could not be read, decoded or re-encoded.
    EmbedFailed(String),
}

impl fmt::Display for PhotoWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            PhotoProblem::NoPhoto => write!(
                f,
                "[{}] servidor {} ({}) has no photo registered",
                self.ordinal, self.nome, self.masp
            ),
            PhotoProblem::FileNotFound(path) => write!(
                f,
                "[{}] photo file not found for {} ({}): {}",
                self.ordinal, self.nome, self.masp, path
            ),
            PhotoProblem::EmbedFailed(err) => write!(
                f,
                "[{}] could not add photo for {} ({}): {}",
                self.ordinal, self.nome, self.masp, err
            ),
        }
    }
}
