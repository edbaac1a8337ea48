use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

use super::SessionSource;
use crate::context::RequestContext;
use crate::types::{Address, SessionRecord};

const PROCESSLIST_QUERY: &str = r#"
    SELECT ID AS id, USER AS user, HOST AS host, DB AS db, COMMAND AS command,
           CAST(TIME AS CHAR) AS time, STATE AS state, INFO AS info
    FROM information_schema.PROCESSLIST
"#;

const MAX_CONNECTIONS: u32 = 4;

#[derive(Debug, sqlx::FromRow)]
struct ProcesslistRow {
    id: u64,
    user: String,
    host: String,
    db: Option<String>,
    command: String,
    time: String,
    state: Option<String>,
    info: Option<String>,
}

impl ProcesslistRow {
    /// Rows without a `host:port` peer (socket clients, internal threads)
    /// cannot be traced to a network origin.
    fn into_session(self) -> Option<SessionRecord> {
        let Some(peer) = Address::parse(&self.host) else {
            debug!("Skipping session {} with host {:?}", self.id, self.host);
            return None;
        };
        Some(SessionRecord {
            id: self.id,
            user: self.user,
            db: self.db,
            command: self.command,
            time: self.time,
            state: self.state,
            info: self.info,
            peer,
        })
    }
}

/// Reads `information_schema.PROCESSLIST` over a lazily-connected pool.
pub struct MysqlSessionSource {
    pool: MySqlPool,
}

impl MysqlSessionSource {
    pub fn new(dsn: &str, acquire_timeout: Duration) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(dsn)
            .context("invalid MySQL DSN")?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl SessionSource for MysqlSessionSource {
    #[tracing::instrument(skip_all)]
    async fn fetch_sessions(&self, ctx: &RequestContext) -> Result<Vec<SessionRecord>> {
        info!("Requesting sessions from MySQL");
        let query = sqlx::query_as::<_, ProcesslistRow>(PROCESSLIST_QUERY).fetch_all(&self.pool);

        let rows = tokio::select! {
            rows = query => rows.context("failed to query processlist")?,
            _ = ctx.done() => bail!("session fetch interrupted: {}", ctx.error()),
        };

        let sessions: Vec<SessionRecord> = rows
            .into_iter()
            .filter_map(ProcesslistRow::into_session)
            .collect();
        info!("Got {} sessions from MySQL", sessions.len());
        Ok(sessions)
    }
}
