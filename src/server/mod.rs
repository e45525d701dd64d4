mod config;
mod daemon;

pub use config::{
  BackendType, LoggingSection, PostgresSection, ServerConfig, ServerSection, SqliteSection,
  StorageSection,
};
pub use daemon::Daemon;
