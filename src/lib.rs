pub mod api;
pub mod db;
pub mod server;
pub mod types;
