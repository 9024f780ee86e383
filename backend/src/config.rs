//! Runtime configuration, read once from the environment at start-up.
//!
//! Every setting has a default so the server can be started with no
//! environment at all, which mirrors how the roster tool is usually run on a
//! single workstation:
//!
//! | Variable | Default |
//! |---|---|
//! | `SERVIDORES_HOST` | `127.0.0.1` |
//! | `SERVIDORES_PORT` | `8080` |
//! | `SERVIDORES_DB` | `servidores.db` |
//! | `SERVIDORES_UPLOAD_DIR` | `static/uploads` |
//! | `SERVIDORES_ALLOWED_EXTENSIONS` | `jpg,jpeg,png` |
//! | `SERVIDORES_DEBUG_COPY` | unset |
//! | `SERVIDORES_OPEN_BROWSER` | `false` |

use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB: &str = "servidores.db";
const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid port number, got '{value}'")]
    InvalidPort { name: &'static str, value: String },
    #[error("{name} must be 'true' or 'false', got '{value}'")]
    InvalidBool { name: &'static str, value: String },
    #[error("{0} must list at least one file extension")]
    NoExtensions(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub annex: AnnexConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Open the UI in the default browser once the server is listening.
    pub open_browser: bool,
}

/// Where records and photos live. Handed to the record store and to the
/// upload handler.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    /// Lower-case photo extensions accepted on upload, without the dot.
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AnnexConfig {
    /// When set, every generated annex is also written to this path.
    pub debug_copy: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup, so tests do
    /// not have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match get("SERVIDORES_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                name: "SERVIDORES_PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let open_browser = match get("SERVIDORES_OPEN_BROWSER") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidBool {
                name: "SERVIDORES_OPEN_BROWSER",
                value: raw,
            })?,
            None => false,
        };

        let allowed_extensions = match get("SERVIDORES_ALLOWED_EXTENSIONS") {
            Some(raw) => parse_extensions(&raw),
            None => DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        };
        if allowed_extensions.is_empty() {
            return Err(ConfigError::NoExtensions("SERVIDORES_ALLOWED_EXTENSIONS"));
        }

        Ok(Config {
            server: ServerConfig {
                host: get("SERVIDORES_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port,
                open_browser,
            },
            storage: StorageConfig {
                database_path: get("SERVIDORES_DB")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DB)),
                upload_dir: get("SERVIDORES_UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
                allowed_extensions,
            },
            annex: AnnexConfig {
                debug_copy: get("SERVIDORES_DEBUG_COPY").map(PathBuf::from),
            },
        })
    }
}

impl StorageConfig {
    /// Storage rooted at `dir`, with the default extension allow-list.
    #[cfg(test)]
    pub fn in_dir(dir: &Path) -> Self {
        StorageConfig {
            database_path: dir.join(DEFAULT_DB),
            upload_dir: dir.join("uploads"),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }

    /// `true` when `filename` has an extension on the allow-list.
    pub fn is_allowed_file(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|a| *a == e)
            })
            .unwrap_or(false)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_with_empty_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(!config.server.open_browser);
        assert_eq!(config.storage.database_path, PathBuf::from("servidores.db"));
        assert_eq!(config.storage.upload_dir, PathBuf::from("static/uploads"));
        assert_eq!(config.storage.allowed_extensions, vec!["jpg", "jpeg", "png"]);
        assert!(config.annex.debug_copy.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("SERVIDORES_PORT", "9000"),
            ("SERVIDORES_ALLOWED_EXTENSIONS", ".PNG, webp"),
            ("SERVIDORES_DEBUG_COPY", "temp_anexo_fotografico.docx"),
            ("SERVIDORES_OPEN_BROWSER", "yes"),
        ])
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.server.open_browser);
        assert_eq!(config.storage.allowed_extensions, vec!["png", "webp"]);
        assert_eq!(
            config.annex.debug_copy,
            Some(PathBuf::from("temp_anexo_fotografico.docx"))
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("SERVIDORES_PORT", "http")]),
            Err(ConfigError::InvalidPort { .. })
        ));
        assert!(matches!(
            config_from(&[("SERVIDORES_OPEN_BROWSER", "maybe")]),
            Err(ConfigError::InvalidBool { .. })
        ));
        assert!(matches!(
            config_from(&[("SERVIDORES_ALLOWED_EXTENSIONS", " , ")]),
            Err(ConfigError::NoExtensions(_))
        ));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let storage = config_from(&[]).unwrap().storage;
        assert!(storage.is_allowed_file("foto.JPG"));
        assert!(storage.is_allowed_file("joao_silva_123.png"));
        assert!(!storage.is_allowed_file("foto.gif"));
        assert!(!storage.is_allowed_file("semextensao"));
    }
}
