use crate::model::flag::Flag;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Filter value the UI sends when a dimension must not be narrowed.
pub const ANY: &str = "Todos";

/// Request payload for `POST /api/selection`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SelectionRequest {
    /// Ids that must appear in the result regardless of the filters.
    #[serde(default)]
    pub obrigatorios: Vec<i64>,
    /// How many extra servidores to draw at random from the filtered pool.
    #[serde(default)]
    pub quantidade_aleatorios: usize,
    #[serde(flatten)]
    pub filters: SelectionFilters,
}

/// Attribute filters applied to the random candidate pool.
///
/// `None` means "any". On the wire each field also accepts the literal
/// `"Todos"` or an empty string with the same meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SelectionFilters {
    #[serde(default, rename = "filtro_sexo", deserialize_with = "any_as_none")]
    pub sexo: Option<String>,
    #[serde(default, rename = "filtro_raca", deserialize_with = "any_as_none")]
    pub raca: Option<String>,
    #[serde(default, rename = "filtro_barba", deserialize_with = "any_as_none")]
    pub barba: Option<Flag>,
    #[serde(default, rename = "filtro_careca", deserialize_with = "any_as_none")]
    pub careca: Option<Flag>,
}

/// Request payload for `POST /api/annex`: the ids to export, in annex order.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub servidores: Vec<i64>,
}

fn any_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some(ANY) => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}
