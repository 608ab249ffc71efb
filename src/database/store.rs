use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use thiserror::Error;

use crate::config::DatabaseConfig;

use super::record::CatalogRecord;

/// The only record IDs this endpoint can ever serve.
const ALLOWED_IDS: [i64; 23] = [
    15140, 15688, 16578, 15579, 15551, 16453, 16942, 15087, 15506, 16151, 2398, 15310, 16704,
    17044, 16444, 15476, 16929, 16627, 16529, 16489, 16987, 16934, 16541,
];

const ROW_LIMIT: u32 = 25;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CONNECTIONS: u32 = 5;

/// Errors from the catalog store. Returned to the handler, which converts
/// them into an error envelope; they never terminate the process.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connect(sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Read access to catalog records. Trait seam so the handler can be
/// constructed with a stub in tests.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch up to 25 allow-listed records in randomized order, optionally
    /// restricted to rows updated at or after `min_updated_at`.
    async fn fetch(
        &self,
        min_updated_at: Option<NaiveDateTime>,
    ) -> Result<Vec<CatalogRecord>, StoreError>;
}

/// Catalog store backed by a MySQL pool created once at startup.
#[derive(Clone)]
pub struct CatalogStore {
    pool: MySqlPool,
}

impl CatalogStore {
    /// Open the pool and ping it. A failure here is a startup error; the
    /// server must not begin accepting traffic without a working connection.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        // The table stores latin1; keep the connection in the storage charset
        // and decode to UTF-8 ourselves in record_from_row.
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .charset("latin1")
            .collation("latin1_swedish_ci");

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(StoreError::Connect)?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(StoreError::Connect)?;

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CatalogSource for CatalogStore {
    async fn fetch(
        &self,
        min_updated_at: Option<NaiveDateTime>,
    ) -> Result<Vec<CatalogRecord>, StoreError> {
        let sql = query_sql(min_updated_at.is_some());

        let mut query = sqlx::query(&sql);
        if let Some(ts) = min_updated_at {
            query = query.bind(ts.format("%Y-%m-%d %H:%M:%S").to_string());
        }

        let rows = query.fetch_all(&self.pool).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(record_from_row(row)?);
        }
        Ok(records)
    }
}

fn query_sql(with_update_filter: bool) -> String {
    let ids = ALLOWED_IDS
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let filter = if with_update_filter {
        " AND at_date_update >= ?"
    } else {
        ""
    };

    format!(
        "SELECT at_id, at_name, at_shortdesc, at_keywords \
         FROM atoms \
         WHERE at_public = 'yes' AND at_type != '' \
         AND at_id IN ({ids}){filter} \
         ORDER BY RAND() DESC LIMIT {ROW_LIMIT}"
    )
}

/// Text columns come back as raw latin1 bytes; decoding happens here so
/// storage encoding never leaks past the store.
fn record_from_row(row: &MySqlRow) -> Result<CatalogRecord, StoreError> {
    let id: i32 = row.try_get("at_id")?;
    let name = decode_latin1(&row.try_get::<Vec<u8>, _>("at_name")?);
    let short_desc = decode_latin1(&row.try_get::<Vec<u8>, _>("at_shortdesc")?);
    let keywords = row
        .try_get::<Option<Vec<u8>>, _>("at_keywords")?
        .map(|bytes| decode_latin1(&bytes));

    Ok(CatalogRecord::from_row(
        i64::from(id),
        name,
        short_desc,
        keywords,
    ))
}

/// latin1 maps each byte to the Unicode code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin1_high_bytes() {
        // "café" with latin1 0xE9 for é
        assert_eq!(decode_latin1(&[0x63, 0x61, 0x66, 0xE9]), "café");
    }

    #[test]
    fn test_decode_latin1_ascii_passthrough() {
        assert_eq!(decode_latin1(b"plain ascii"), "plain ascii");
    }

    #[test]
    fn test_allow_list_has_fixed_size() {
        assert_eq!(ALLOWED_IDS.len(), 23);
    }

    #[test]
    fn test_query_limits_rows() {
        let sql = query_sql(false);
        assert!(sql.ends_with("ORDER BY RAND() DESC LIMIT 25"), "{sql}");
        assert!(!sql.contains('?'), "unfiltered query must not bind: {sql}");
    }

    #[test]
    fn test_query_embeds_every_allowed_id() {
        let sql = query_sql(false);
        for id in ALLOWED_IDS {
            assert!(sql.contains(&id.to_string()), "missing {id} in {sql}");
        }
    }

    #[test]
    fn test_filtered_query_binds_update_time() {
        let sql = query_sql(true);
        assert!(sql.contains("AND at_date_update >= ?"), "{sql}");
    }
}
