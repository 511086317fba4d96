use std::time::Duration;

use anyhow::{Result, bail};
use url::Url;

/// Port managed poolers use for transaction-mode multiplexing.
const TRANSACTION_POOLER_PORT: u16 = 6543;
const DEFAULT_POSTGRES_PORT: u16 = 5432;

/// What sits at the other end of `DATABASE_URL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbTarget {
    /// A Postgres server we talk to directly.
    Direct,
    /// A managed pooler in session mode (one server connection per client).
    SessionPooler,
    /// A managed pooler in transaction mode: server connections are swapped
    /// between transactions, so prepared statements cannot be cached.
    TransactionPooler,
}

impl DbTarget {
    pub fn detect(host: &str, port: u16) -> Self {
        let host = host.to_ascii_lowercase();
        let pooler_host = host
            .split('.')
            .any(|label| label == "pooler" || label.ends_with("-pooler"));

        if port == TRANSACTION_POOLER_PORT {
            DbTarget::TransactionPooler
        } else if pooler_host {
            DbTarget::SessionPooler
        } else {
            DbTarget::Direct
        }
    }
}

/// Pool sizing and timeouts for a [`DbTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub statement_cache: bool,
}

impl PoolSettings {
    pub fn for_target(target: DbTarget) -> Self {
        match target {
            DbTarget::Direct => Self {
                max_connections: 10,
                acquire_timeout: Duration::from_secs(10),
                idle_timeout: Duration::from_secs(300),
                statement_cache: true,
            },
            // Poolers cap client connections tightly and are slow to hand out
            // the first one after a cold start.
            DbTarget::SessionPooler | DbTarget::TransactionPooler => Self {
                max_connections: 5,
                acquire_timeout: Duration::from_secs(20),
                idle_timeout: Duration::from_secs(30),
                statement_cache: target == DbTarget::SessionPooler,
            },
        }
    }
}

/// Check the URL is a Postgres URL and work out what it points at.
pub fn inspect_url(database_url: &str) -> Result<DbTarget> {
    let url = Url::parse(database_url)
        .map_err(|e| anyhow::anyhow!("Invalid DATABASE_URL: {}", e))?;

    if !matches!(url.scheme(), "postgres" | "postgresql") {
        bail!(
            "Invalid DATABASE_URL scheme '{}': must be postgres:// or postgresql://",
            url.scheme()
        );
    }

    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL has no host"))?;
    let port = url.port().unwrap_or(DEFAULT_POSTGRES_PORT);

    Ok(DbTarget::detect(host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_poolers_by_port_and_host() {
        assert_eq!(
            DbTarget::detect("aws-0-eu-west-1.pooler.supabase.com", 6543),
            DbTarget::TransactionPooler
        );
        assert_eq!(
            DbTarget::detect("aws-0-eu-west-1.pooler.supabase.com", 5432),
            DbTarget::SessionPooler
        );
        assert_eq!(
            DbTarget::detect("ep-cool-river-123456-pooler.us-east-2.aws.neon.tech", 5432),
            DbTarget::SessionPooler
        );
        assert_eq!(DbTarget::detect("db.abcdef.supabase.co", 5432), DbTarget::Direct);
        assert_eq!(DbTarget::detect("localhost", 5432), DbTarget::Direct);
    }

    #[test]
    fn transaction_pooler_disables_statement_cache() {
        let settings = PoolSettings::for_target(DbTarget::TransactionPooler);
        assert!(!settings.statement_cache);
        let direct = PoolSettings::for_target(DbTarget::Direct);
        assert!(settings.max_connections < direct.max_connections);
    }

    #[test]
    fn inspect_url_rejects_other_schemes() {
        assert!(inspect_url("mysql://user:pw@localhost/db").is_err());
        assert!(inspect_url("not a url").is_err());
        assert_eq!(
            inspect_url("postgresql://user:pw@localhost:5432/fete").unwrap(),
            DbTarget::Direct
        );
        assert_eq!(
            inspect_url("postgres://u:p@aws-0-us-east-1.pooler.supabase.com:6543/postgres")
                .unwrap(),
            DbTarget::TransactionPooler
        );
    }
}
