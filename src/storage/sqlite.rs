//! SQLite storage backend implementation
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Reads are not blocked by the (rare) writes
//! - **Migrations**: Schema versioning with sqlx
//!
//! ## Layout
//!
//! - `monitor_config`: a single row (`id = 1`) with channel/message ids,
//!   alert template and the show-address flag
//! - `monitored_endpoints`: address → name with an explicit position column
//!   so the display order survives restarts

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument};

use super::backend::{ConfigStore, StoredEndpoint, StoredState};
use super::error::{StorageError, StorageResult};
use crate::monitor::MonitorConfiguration;
use crate::{ChannelId, MessageId};

/// SQLite storage backend
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteStore {
    /// Open (or create) the database and run migrations
    ///
    /// ```no_run
    /// # use guardia_status::storage::sqlite::SqliteStore;
    /// # async fn example() -> anyhow::Result<()> {
    /// let store = SqliteStore::new("./status.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn id_to_db(id: u64) -> StorageResult<i64> {
        i64::try_from(id)
            .map_err(|_| StorageError::SerializationError(format!("id {id} out of range")))
    }

    fn id_from_db(id: Option<i64>) -> StorageResult<Option<u64>> {
        id.map(|id| {
            u64::try_from(id)
                .map_err(|_| StorageError::SerializationError(format!("negative id {id}")))
        })
        .transpose()
    }
}

#[async_trait]
impl ConfigStore for SqliteStore {
    #[instrument(skip(self))]
    async fn load(&self) -> StorageResult<StoredState> {
        let row = sqlx::query(
            r#"
            SELECT display_channel_id, display_message_id, alert_channel_id,
                   alert_template, show_address
            FROM monitor_config
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let config = match row {
            Some(row) => MonitorConfiguration {
                display_channel: Self::id_from_db(row.try_get("display_channel_id")?)?
                    .map(ChannelId),
                display_message: Self::id_from_db(row.try_get("display_message_id")?)?
                    .map(MessageId),
                alert_channel: Self::id_from_db(row.try_get("alert_channel_id")?)?
                    .map(ChannelId),
                alert_template: row.try_get("alert_template")?,
                show_address: row.try_get::<i64, _>("show_address")? != 0,
            },
            None => {
                debug!("no stored configuration, using defaults");
                MonitorConfiguration::default()
            }
        };

        let endpoints = sqlx::query(
            r#"
            SELECT address, name
            FROM monitored_endpoints
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| -> StorageResult<StoredEndpoint> {
            Ok(StoredEndpoint {
                address: row.try_get("address")?,
                name: row.try_get("name")?,
            })
        })
        .collect::<StorageResult<Vec<_>>>()?;

        debug!("loaded {} endpoints", endpoints.len());

        Ok(StoredState { config, endpoints })
    }

    #[instrument(skip(self, state), fields(endpoints = state.endpoints.len()))]
    async fn save(&self, state: &StoredState) -> StorageResult<()> {
        let config = &state.config;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO monitor_config (
                id, display_channel_id, display_message_id, alert_channel_id,
                alert_template, show_address
            )
            VALUES (1, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                display_channel_id = excluded.display_channel_id,
                display_message_id = excluded.display_message_id,
                alert_channel_id = excluded.alert_channel_id,
                alert_template = excluded.alert_template,
                show_address = excluded.show_address
            "#,
        )
        .bind(config.display_channel.map(|c| Self::id_to_db(c.0)).transpose()?)
        .bind(config.display_message.map(|m| Self::id_to_db(m.0)).transpose()?)
        .bind(config.alert_channel.map(|c| Self::id_to_db(c.0)).transpose()?)
        .bind(&config.alert_template)
        .bind(config.show_address as i64)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM monitored_endpoints")
            .execute(&mut *tx)
            .await?;

        for (position, endpoint) in state.endpoints.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO monitored_endpoints (address, name, position)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(&endpoint.address)
            .bind(&endpoint.name)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!("saved monitor state");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("SQLite ({})", self.db_path)
    }
}
