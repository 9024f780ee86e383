//! Data model shared between the HTTP layer and the core services of the
//! servidores annex backend.

pub mod model;
pub mod requests;
