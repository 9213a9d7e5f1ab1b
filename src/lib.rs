pub mod channels;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod report;
pub mod templates_structs;
