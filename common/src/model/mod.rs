pub mod flag;
pub mod servidor;
pub mod warning;
