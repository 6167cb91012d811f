use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `catalog.database_url`.
pub const DATABASE_URL_ENV: &str = "CATALOG_DATABASE_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Read a delimiter-separated dump of the document table instead of
    /// querying the database.
    #[serde(default)]
    pub dump_path: Option<PathBuf>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            dump_path: None,
            delimiter: default_delimiter(),
            max_connections: default_max_connections(),
        }
    }
}

impl CatalogConfig {
    /// The configured delimiter as a single character.
    pub fn delimiter_char(&self) -> char {
        self.delimiter.chars().next().unwrap_or('|')
    }
}

fn default_database_url() -> String {
    "postgres://postgres@localhost:5432/postgres".to_string()
}
fn default_delimiter() -> String {
    "|".to_string()
}
fn default_max_connections() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Document type queried in the YQL `sources` clause.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Field matched against the semantic identifier.
    #[serde(default = "default_field")]
    pub field: String,
    #[serde(default = "default_hits")]
    pub hits: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            schema: default_schema(),
            field: default_field(),
            hits: default_hits(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8081/search/".to_string()
}
fn default_schema() -> String {
    "danswer_index".to_string()
}
fn default_field() -> String {
    "semantic_identifier".to_string()
}
fn default_hits() -> u32 {
    400
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./outputs")
}

impl Config {
    /// All defaults: local Postgres, local index on port 8081, `./outputs`.
    pub fn minimal() -> Self {
        Self::default()
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.is_empty() {
                self.catalog.database_url = url;
            }
        }
    }
}

/// Load configuration from `path`, falling back to [`Config::minimal`] when
/// the file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::minimal()
    };
    config.apply_env();
    Ok(config)
}

/// Parse and validate a TOML configuration document.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.catalog.delimiter.chars().count() != 1 {
        anyhow::bail!(
            "catalog.delimiter must be exactly one character, got '{}'",
            config.catalog.delimiter
        );
    }

    if config.catalog.max_connections == 0 {
        anyhow::bail!("catalog.max_connections must be >= 1");
    }

    if config.index.hits == 0 {
        anyhow::bail!("index.hits must be >= 1");
    }

    if config.index.timeout_secs == 0 {
        anyhow::bail!("index.timeout_secs must be >= 1");
    }

    // Both are spliced into the YQL text, so keep them to plain identifiers.
    for (name, value) in [
        ("index.schema", &config.index.schema),
        ("index.field", &config.index.field),
    ] {
        if !is_identifier(value) {
            anyhow::bail!(
                "{} must be a non-empty identifier of [A-Za-z0-9_], got '{}'",
                name,
                value
            );
        }
    }

    Ok(())
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.index.hits, 400);
        assert_eq!(config.index.schema, "danswer_index");
        assert_eq!(config.catalog.delimiter_char(), '|');
        assert_eq!(config.output.dir, PathBuf::from("./outputs"));
        assert!(config.catalog.dump_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = parse_config(
            r#"
[catalog]
dump_path = "/tmp/catalog.txt"
delimiter = ";"

[index]
endpoint = "http://index:8081/search/"
hits = 2000
"#,
        )
        .unwrap();
        assert_eq!(config.index.hits, 2000);
        assert_eq!(config.index.endpoint, "http://index:8081/search/");
        assert_eq!(config.catalog.delimiter_char(), ';');
        assert_eq!(
            config.catalog.dump_path,
            Some(PathBuf::from("/tmp/catalog.txt"))
        );
    }

    #[test]
    fn test_zero_hits_rejected() {
        let err = parse_config("[index]\nhits = 0\n").unwrap_err();
        assert!(err.to_string().contains("index.hits"));
    }

    #[test]
    fn test_multi_char_delimiter_rejected() {
        assert!(parse_config("[catalog]\ndelimiter = \"||\"\n").is_err());
        assert!(parse_config("[catalog]\ndelimiter = \"\"\n").is_err());
    }

    #[test]
    fn test_schema_must_be_identifier() {
        let err = parse_config("[index]\nschema = \"docs where true\"\n").unwrap_err();
        assert!(err.to_string().contains("index.schema"));
    }

    #[test]
    fn test_example_config_parses() {
        let config = parse_config(include_str!("../config/audit.example.toml")).unwrap();
        assert_eq!(config.index.hits, default_hits());
        assert_eq!(config.index.endpoint, default_endpoint());
    }

    #[test]
    fn test_missing_file_falls_back_to_minimal() {
        let config = load_config(Path::new("/nonexistent/audit.toml")).unwrap();
        assert_eq!(config.index.hits, 400);
    }
}
