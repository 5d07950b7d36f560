use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

mod migrations;

use migrations::run_migrations;

use crate::measure::record::MergedMeasurements;
use crate::measure::{BodyLandmarks, MergedRecord};
use crate::units::UnitSystem;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid datetime '{value}': {err}"))
}

fn unit_from_str(value: &str) -> Result<UnitSystem> {
    UnitSystem::parse(value).ok_or_else(|| anyhow!("unknown unit system '{value}'"))
}

/// A persisted measurement record as stored in and loaded from SQLite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementEntry {
    pub id: String,
    pub measurement_type: String,
    pub measurements: MergedMeasurements,
    pub unit_system: UnitSystem,
    pub confidence_score: f64,
    pub body_landmarks: Option<BodyLandmarks>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MeasurementEntry {
    pub fn from_record(id: String, record: &MergedRecord, notes: Option<String>) -> Self {
        Self {
            id,
            measurement_type: record.measurement_type.clone(),
            measurements: record.measurements.clone(),
            unit_system: record.unit_system,
            confidence_score: record.ar_confidence,
            body_landmarks: Some(record.body_landmarks.clone()),
            notes,
            created_at: record.created_at,
            updated_at: record.created_at,
        }
    }
}

fn entry_from_row(row: &Row<'_>) -> Result<MeasurementEntry> {
    let measurements: String = row.get(2)?;
    let body_landmarks: Option<String> = row.get(5)?;
    Ok(MeasurementEntry {
        id: row.get(0)?,
        measurement_type: row.get(1)?,
        measurements: serde_json::from_str(&measurements)
            .context("corrupt measurements JSON in database")?,
        unit_system: unit_from_str(&row.get::<_, String>(3)?)?,
        confidence_score: row.get(4)?,
        body_landmarks: body_landmarks
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .context("corrupt body landmarks JSON in database")?,
        notes: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?)?,
        updated_at: parse_datetime(&row.get::<_, String>(8)?)?,
    })
}

const ENTRY_COLUMNS: &str = "id, measurement_type, measurements, unit_system, \
     confidence_score, body_landmarks, notes, created_at, updated_at";

#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("fitform-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("Failed to enable foreign keys: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    pub async fn insert_measurement(&self, entry: &MeasurementEntry) -> Result<()> {
        let record = entry.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO measurements (id, measurement_type, measurements, unit_system,
                     confidence_score, body_landmarks, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id,
                    record.measurement_type,
                    serde_json::to_string(&record.measurements)
                        .context("failed to serialize measurements")?,
                    record.unit_system.as_str(),
                    record.confidence_score,
                    record
                        .body_landmarks
                        .as_ref()
                        .map(serde_json::to_string)
                        .transpose()
                        .context("failed to serialize body landmarks")?,
                    record.notes,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert measurement")?;
            Ok(())
        })
        .await
    }

    pub async fn get_measurement(&self, id: &str) -> Result<Option<MeasurementEntry>> {
        let id = id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM measurements WHERE id = ?1"
            ))?;

            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(entry_from_row(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Newest-first history, optionally narrowed by unit system and record
    /// kind.
    pub async fn list_measurements(
        &self,
        unit_system: Option<UnitSystem>,
        measurement_type: Option<String>,
    ) -> Result<Vec<MeasurementEntry>> {
        let unit_filter = unit_system.map(|u| u.as_str().to_string());
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM measurements
                 WHERE (?1 IS NULL OR unit_system = ?1)
                   AND (?2 IS NULL OR measurement_type = ?2)
                 ORDER BY created_at DESC"
            ))?;

            let mut rows = stmt.query(params![unit_filter, measurement_type])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(entry_from_row(row)?);
            }
            Ok(entries)
        })
        .await
    }

    pub async fn update_measurement_notes(
        &self,
        id: &str,
        notes: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let id = id.to_string();
        self.execute(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE measurements SET notes = ?1, updated_at = ?2 WHERE id = ?3",
                    params![notes, updated_at.to_rfc3339(), id],
                )
                .with_context(|| "failed to update measurement notes")?;
            Ok(changed > 0)
        })
        .await
    }

    pub async fn delete_measurement(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.execute(move |conn| {
            let changed = conn
                .execute("DELETE FROM measurements WHERE id = ?1", params![id])
                .with_context(|| "failed to delete measurement")?;
            Ok(changed > 0)
        })
        .await
    }
}
