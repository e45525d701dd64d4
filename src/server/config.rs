use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Expand environment variables in a string.
/// Supports $VAR_NAME and ${VAR_NAME} syntax; unset variables expand to "".
fn expand_env_vars(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut rest = input;

  while let Some(pos) = rest.find('$') {
    out.push_str(&rest[..pos]);
    let after = &rest[pos + 1..];

    if let Some(braced) = after.strip_prefix('{') {
      match braced.find('}') {
        Some(end) => {
          out.push_str(&std::env::var(&braced[..end]).unwrap_or_default());
          rest = &braced[end + 1..];
        }
        None => {
          // Unterminated, keep the remainder verbatim
          out.push_str(&rest[pos..]);
          rest = "";
        }
      }
      continue;
    }

    let name_len = after
      .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
      .unwrap_or(after.len());
    if name_len == 0 {
      out.push('$');
    } else {
      out.push_str(&std::env::var(&after[..name_len]).unwrap_or_default());
    }
    rest = &after[name_len..];
  }

  out.push_str(rest);
  out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
  Postgres,
  #[default]
  Sqlite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
  #[serde(default)]
  pub server: ServerSection,
  #[serde(default)]
  pub backend: BackendType,
  #[serde(default)]
  pub postgres: PostgresSection,
  #[serde(default)]
  pub sqlite: SqliteSection,
  #[serde(default)]
  pub storage: StorageSection,
  #[serde(default)]
  pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
  /// CORS allowed origins.
  /// Use ["*"] for permissive mode, or list origins like ["http://localhost:5173"]
  #[serde(default = "default_cors_origins")]
  pub cors_origins: Vec<String>,
}

fn default_host() -> String {
  "0.0.0.0".into()
}
fn default_port() -> u16 {
  3000
}
fn default_cors_origins() -> Vec<String> {
  vec!["*".to_string()]
}

impl Default for ServerSection {
  fn default() -> Self {
    Self {
      host: default_host(),
      port: default_port(),
      cors_origins: default_cors_origins(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresSection {
  #[serde(default = "default_pg_url")]
  pub url: String,
  #[serde(default = "default_max_conn")]
  pub max_connections: usize,
}
fn default_pg_url() -> String {
  "postgres://localhost/parceldb".into()
}
fn default_max_conn() -> usize {
  20
}
impl Default for PostgresSection {
  fn default() -> Self {
    Self {
      url: default_pg_url(),
      max_connections: default_max_conn(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteSection {
  #[serde(default = "default_sqlite_path")]
  pub path: String,
}
fn default_sqlite_path() -> String {
  "parceld.db".into()
}
impl Default for SqliteSection {
  fn default() -> Self {
    Self {
      path: default_sqlite_path(),
    }
  }
}

/// Where parcel documents live inside the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
  #[serde(default = "default_collection")]
  pub collection: String,
}
fn default_collection() -> String {
  "parcels".into()
}
impl Default for StorageSection {
  fn default() -> Self {
    Self {
      collection: default_collection(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
  #[serde(default = "default_level")]
  pub level: String,
}
fn default_level() -> String {
  "info".into()
}
impl Default for LoggingSection {
  fn default() -> Self {
    Self {
      level: default_level(),
    }
  }
}

impl ServerConfig {
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
    let content = std::fs::read_to_string(&path)?;
    Self::from_yaml(&content)
  }

  pub fn from_yaml(content: &str) -> Result<Self, anyhow::Error> {
    let expanded = expand_env_vars(content);
    Ok(serde_yaml::from_str(&expanded)?)
  }

  /// Auto-detect `parceld.yaml` (preferred) or `parceld.yml` in `dir`
  pub fn find_config_file_in(dir: impl AsRef<Path>) -> Option<PathBuf> {
    ["parceld.yaml", "parceld.yml"]
      .iter()
      .map(|name| dir.as_ref().join(name))
      .find(|p| p.is_file())
  }

  pub fn find_config_file() -> Option<PathBuf> {
    Self::find_config_file_in(".")
  }

  /// Select the backend from a connection string.
  ///
  /// `postgres://` and `postgresql://` pick PostgreSQL. `sqlite:<path>`,
  /// `sqlite://<path>`, `sqlite::memory:` or a bare filesystem path pick SQLite.
  pub fn apply_database_url(&mut self, url: &str) -> Result<(), anyhow::Error> {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
      self.backend = BackendType::Postgres;
      self.postgres.url = url.to_string();
      return Ok(());
    }

    let path = if let Some(rest) = url.strip_prefix("sqlite:") {
      rest.strip_prefix("//").unwrap_or(rest)
    } else if url.contains("://") {
      anyhow::bail!("Unsupported database URL scheme: {}", url);
    } else {
      url
    };

    if path.is_empty() {
      anyhow::bail!("SQLite database URL has no path: {}", url);
    }
    self.backend = BackendType::Sqlite;
    self.sqlite.path = path.to_string();
    Ok(())
  }

  pub fn address(&self) -> String {
    format!("{}:{}", self.server.host, self.server.port)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_expand_braced_and_bare_vars() {
    std::env::set_var("PARCELD_TEST_HOST", "db.internal");
    assert_eq!(
      expand_env_vars("postgres://${PARCELD_TEST_HOST}/x"),
      "postgres://db.internal/x"
    );
    assert_eq!(
      expand_env_vars("host=$PARCELD_TEST_HOST;"),
      "host=db.internal;"
    );
  }

  #[test]
  fn test_expand_leaves_lone_dollar_and_unterminated_brace() {
    assert_eq!(expand_env_vars("cost: 5$"), "cost: 5$");
    assert_eq!(expand_env_vars("a ${UNTERMINATED"), "a ${UNTERMINATED");
  }

  #[test]
  fn test_expand_unset_var_is_empty() {
    assert_eq!(
      expand_env_vars("[${PARCELD_TEST_DEFINITELY_UNSET}]"),
      "[]"
    );
  }
}
