//! SQLite-backed record store for servidores.
//!
//! A connection is opened per operation from the configured database path,
//! so the store itself is just a path and can be cloned freely into every
//! actix worker. Iteration order is always ascending `id`, which is the
//! insertion order of the roster.

use crate::error::{AppError, Result};
use common::model::flag::Flag;
use common::model::servidor::{NewServidor, Servidor};
use common::requests::SelectionFilters;
use log::debug;
use rusqlite::types::{Type, Value};
use rusqlite::{ffi, params, params_from_iter, Connection, Row};
use std::path::{Path, PathBuf};

const COLUMNS: &str = "id, masp, nome, sexo, raca, foto, barba, careca";

#[derive(Debug, Clone)]
pub struct ServidorStore {
    path: PathBuf,
}

impl ServidorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ServidorStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Creates the `servidores` table if it does not exist yet.
    pub fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS servidores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                masp TEXT UNIQUE NOT NULL,
                nome TEXT NOT NULL,
                sexo TEXT NOT NULL,
                raca TEXT NOT NULL,
                foto TEXT NOT NULL,
                barba TEXT NOT NULL,
                careca TEXT NOT NULL
            )",
        )?;
        Ok(())
    }

    /// Inserts a new servidor. A duplicate MASP is reported as
    /// `AppError::Conflict` and leaves the table untouched.
    pub fn insert(&self, new: &NewServidor) -> Result<Servidor> {
        let conn = self.connect()?;
        let inserted = conn.execute(
            "INSERT INTO servidores (masp, nome, sexo, raca, foto, barba, careca)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.masp,
                new.nome,
                new.sexo,
                new.raca,
                new.foto,
                new.barba.as_str(),
                new.careca.as_str()
            ],
        );
        match inserted {
            Ok(_) => Ok(new.clone().with_id(conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(AppError::Conflict("MASP já cadastrado.".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn list(&self) -> Result<Vec<Servidor>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM servidores ORDER BY id"))?;
        let rows = stmt.query_map([], map_servidor)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Permanently removes a servidor. Returns `false` if no row had that id.
    /// The stored photo file is left where it is.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM servidores WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// Fetches the servidores whose id is in `ids`, in store order. Unknown
    /// ids are skipped.
    pub fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Servidor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {COLUMNS} FROM servidores WHERE id IN ({}) ORDER BY id",
            placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), map_servidor)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every servidor not listed in `exclude` that matches all the filters
    /// that are set, in store order.
    pub fn find_candidates(
        &self,
        exclude: &[i64],
        filters: &SelectionFilters,
    ) -> Result<Vec<Servidor>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if !exclude.is_empty() {
            clauses.push(format!("id NOT IN ({})", placeholders(exclude.len())));
            values.extend(exclude.iter().map(|id| Value::Integer(*id)));
        }
        if let Some(sexo) = &filters.sexo {
            clauses.push("sexo = ?".to_string());
            values.push(Value::Text(sexo.clone()));
        }
        if let Some(raca) = &filters.raca {
            clauses.push("raca = ?".to_string());
            values.push(Value::Text(raca.clone()));
        }
        if let Some(barba) = filters.barba {
            clauses.push("barba = ?".to_string());
            values.push(Value::Text(barba.as_str().to_string()));
        }
        if let Some(careca) = filters.careca {
            clauses.push("careca = ?".to_string());
            values.push(Value::Text(careca.as_str().to_string()));
        }

        let mut sql = format!("SELECT {COLUMNS} FROM servidores");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id");
        debug!("candidate query: {sql}");

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), map_servidor)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

fn map_servidor(row: &Row<'_>) -> rusqlite::Result<Servidor> {
    Ok(Servidor {
        id: row.get(0)?,
        masp: row.get(1)?,
        nome: row.get(2)?,
        sexo: row.get(3)?,
        raca: row.get(4)?,
        foto: row.get(5)?,
        barba: flag_column(row, 6)?,
        careca: flag_column(row, 7)?,
    })
}

fn flag_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Flag> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
