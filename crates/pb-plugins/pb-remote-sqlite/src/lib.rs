//! # pb-remote-sqlite
//!
//! A realtime pin collection backed by SQLite. `create` inserts one JSON
//! document per pin; `subscribe` spawns a polling task that re-reads the
//! newest 50 documents and pushes a snapshot whenever they change.

use std::time::Duration;

use async_trait::async_trait;
use pb_core::models::NewPin;
use pb_core::repository::REMOTE_LIMIT;
use pb_core::traits::{FeedCallback, FeedEvent, RemoteDocument, RemoteFeed, Subscription};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tokio::sync::oneshot::{self, error::TryRecvError};
use uuid::Uuid;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS pins (
    id TEXT PRIMARY KEY,
    created_at INTEGER NOT NULL,
    data TEXT NOT NULL
)";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

pub struct SqliteRemoteFeed {
    pool: SqlitePool,
    poll_interval: Duration,
}

type Row = (String, String);

impl SqliteRemoteFeed {
    /// Connects and creates the `pins` table if missing.
    ///
    /// A single connection is kept open for the lifetime of the pool so that
    /// `sqlite::memory:` databases survive between queries.
    pub async fn new(database_url: &str, poll_interval: Duration) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        tracing::info!(url = database_url, ?poll_interval, "remote pin collection ready");
        Ok(Self { pool, poll_interval })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn fetch_latest(pool: &SqlitePool) -> Result<Vec<Row>, sqlx::Error> {
    sqlx::query_as::<_, Row>("SELECT id, data FROM pins ORDER BY created_at DESC, rowid DESC LIMIT ?")
        .bind(REMOTE_LIMIT as i64)
        .fetch_all(pool)
        .await
}

fn to_documents(rows: &[Row]) -> Vec<RemoteDocument> {
    rows.iter()
        .map(|(id, data)| RemoteDocument {
            id: id.clone(),
            // Undecodable rows still travel; the core drops them.
            data: serde_json::from_str(data).unwrap_or(Value::Null),
        })
        .collect()
}

#[async_trait]
impl RemoteFeed for SqliteRemoteFeed {
    fn subscribe(&self, on_event: FeedCallback) -> Subscription {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            on_event(FeedEvent::Error("no async runtime to poll the collection".into()));
            return Subscription::noop();
        };

        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let pool = self.pool.clone();
        let every = self.poll_interval;

        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(every);
            let mut last: Option<Vec<Row>> = None;
            let mut failing = false;
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    _ = ticker.tick() => {}
                }
                // A poll in flight is abandoned as soon as the handle is cancelled.
                let fetched = tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    rows = fetch_latest(&pool) => rows,
                };
                if !matches!(cancel_rx.try_recv(), Err(TryRecvError::Empty)) {
                    break;
                }
                match fetched {
                    Ok(rows) => {
                        failing = false;
                        if last.as_ref() != Some(&rows) {
                            tracing::debug!(count = rows.len(), "remote snapshot");
                            on_event(FeedEvent::Snapshot(to_documents(&rows)));
                            last = Some(rows);
                        }
                    }
                    Err(e) => {
                        // Report the first failure of a streak only.
                        if !failing {
                            tracing::warn!(error = %e, "remote snapshot query failed");
                            on_event(FeedEvent::Error(e.to_string()));
                        }
                        failing = true;
                        last = None;
                    }
                }
            }
            tracing::debug!("remote polling stopped");
        });

        Subscription::new(move || {
            let _ = cancel_tx.send(());
        })
    }

    async fn create(&self, pin: NewPin) -> anyhow::Result<String> {
        let id = Uuid::now_v7().to_string();
        sqlx::query("INSERT INTO pins (id, created_at, data) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(pin.created_at)
            .bind(serde_json::to_string(&pin)?)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }
}
