use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use shared::PipelineError;
use tracing::{debug, info, warn};

use crate::models::FactRow;
use crate::schema::{master_table, REPLACE_MASTER_TABLE};

/// Rows per INSERT statement; keeps bound parameters well under SQLite's limit.
const INSERT_CHUNK_ROWS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Verification {
    Matched { rows: i64 },
    Mismatch { expected: usize, actual: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistReport {
    pub written: usize,
    pub verification: Verification,
}

pub struct Persister {
    database_url: String,
}

impl Persister {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self { database_url: database_url.into() }
    }

    /// Replaces `master_table` with `rows` and checks the stored row count.
    pub fn persist(&self, rows: &[FactRow]) -> Result<PersistReport, PipelineError> {
        let report = {
            let mut conn = SqliteConnection::establish(&self.database_url)?;
            info!("Connected to {}", self.database_url);

            info!("Writing {} rows into 'master_table'", rows.len());
            let written = replace_master_table(&mut conn, rows)?;

            let verification = verify_row_count(&mut conn, rows.len())?;
            PersistReport { written, verification }
        };
        debug!("Connection to {} closed", self.database_url);

        match report.verification {
            Verification::Matched { rows } => {
                info!("Verification passed: 'master_table' holds {} rows", rows)
            }
            Verification::Mismatch { expected, actual } => warn!(
                "Verification failed: wrote {} rows but 'master_table' holds {}",
                expected, actual
            ),
        }

        Ok(report)
    }
}

fn replace_master_table(
    conn: &mut SqliteConnection,
    rows: &[FactRow],
) -> Result<usize, PipelineError> {
    let written = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        conn.batch_execute(REPLACE_MASTER_TABLE)?;

        let mut written = 0;
        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            written += diesel::insert_into(master_table::table)
                .values(chunk)
                .execute(conn)?;
        }
        Ok(written)
    })?;
    Ok(written)
}

pub fn verify_row_count(
    conn: &mut SqliteConnection,
    expected: usize,
) -> Result<Verification, PipelineError> {
    let actual: i64 = master_table::table.count().get_result(conn)?;
    if usize::try_from(actual).is_ok_and(|actual| actual == expected) {
        Ok(Verification::Matched { rows: actual })
    } else {
        Ok(Verification::Mismatch { expected, actual })
    }
}
