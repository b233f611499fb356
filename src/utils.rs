pub mod cache;
pub mod config;
pub mod date;
pub mod file;
