use crate::model::flag::Flag;
use serde::{Deserialize, Serialize};

/// A registered servidor, as stored in the `servidores` table.
///
/// `id` is assigned by the database and never changes. `masp` is the
/// human-assigned personnel code and is unique across the whole roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Servidor {
    pub id: i64,
    pub masp: String,
    pub nome: String,
    pub sexo: String,
    pub raca: String,
    /// Path of the stored photo, relative to the working directory of the server.
    pub foto: String,
    pub barba: Flag,
    pub careca: Flag,
}

/// The fields of a servidor before it has been inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServidor {
    pub masp: String,
    pub nome: String,
    pub sexo: String,
    pub raca: String,
    pub foto: String,
    pub barba: Flag,
    pub careca: Flag,
}

impl NewServidor {
    pub fn with_id(self, id: i64) -> Servidor {
        Servidor {
            id,
            masp: self.masp,
            nome: self.nome,
            sexo: self.sexo,
            raca: self.raca,
            foto: self.foto,
            barba: self.barba,
            careca: self.careca,
        }
    }
}
