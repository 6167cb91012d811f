use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;

use crate::config::CatalogConfig;
use crate::error::{AuditError, AuditResult};

pub async fn connect(config: &CatalogConfig) -> AuditResult<PgPool> {
    let options = PgConnectOptions::from_str(&config.database_url)
        .map_err(|e| AuditError::Transport(format!("invalid catalog.database_url: {}", e)))?
        .application_name("idx-audit");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}
