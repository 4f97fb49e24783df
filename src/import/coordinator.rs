//! Import coordination.
//!
//! The Importer runs one linear pass:
//! 1. Load and header-check the source file
//! 2. Open the dedicated database connection
//! 3. Coerce every row into the batch, reporting progress
//! 4. Upsert and commit the batch
//! 5. Close the connection, whether or not 3 and 4 succeeded

use sqlx::Connection;
use sqlx::postgres::PgConnection;

use crate::config::ImportConfig;
use crate::error::ImportResult;
use crate::import::{batch::MedicineBatch, database_operations, stats::ImportStats};
use crate::schema;
use crate::source::SourceTable;

/// Rows between progress notices.
pub const PROGRESS_INTERVAL: usize = 1000;

/// Moves one CSV file into the `medicines` table.
pub struct Importer {
    config: ImportConfig,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Run the import.
    ///
    /// With `dry_run` set, the file is loaded and every row coerced, but no
    /// connection is made and `records_upserted` stays 0.
    ///
    /// # Errors
    /// The first failure ends the run. The connection, once open, is closed
    /// before the error is returned.
    pub async fn run(&self) -> ImportResult<ImportStats> {
        log::info!("reading {}", self.config.csv_path.display());
        let source = SourceTable::load(&self.config.csv_path)?;

        if self.config.dry_run {
            let (batch, stats) = prepare(&source)?;
            log::info!(
                "dry run: {} medicines ready, database left untouched",
                batch.len()
            );
            return Ok(stats);
        }

        log::info!(
            "connecting to database {}",
            self.config.database.database_name()
        );
        let mut conn = database_operations::connect(&self.config.database).await?;

        let result = import_source(&mut conn, &source).await;

        match conn.close().await {
            Ok(()) => log::info!("database connection closed"),
            Err(err) => log::warn!("failed to close database connection cleanly: {}", err),
        }

        result
    }
}

async fn import_source(conn: &mut PgConnection, source: &SourceTable) -> ImportResult<ImportStats> {
    let (batch, mut stats) = prepare(source)?;

    stats.records_upserted = database_operations::write_batch(conn, &batch).await?;
    log::info!(
        "committed {} medicines to {}",
        stats.records_upserted,
        schema::TABLE
    );

    Ok(stats)
}

fn is_progress_point(processed: usize) -> bool {
    processed > 0 && processed % PROGRESS_INTERVAL == 0
}

fn prepare(source: &SourceTable) -> ImportResult<(MedicineBatch, ImportStats)> {
    log::info!("importing {} medicines", source.len());

    let records = source.records(|processed| {
        if is_progress_point(processed) {
            log::info!("processed {} medicines", processed);
        }
    })?;

    let rows_read = records.len();
    let batch: MedicineBatch = records.into_iter().collect();

    if batch.duplicates() > 0 {
        log::info!(
            "{} rows repeat an earlier id; the later row is kept",
            batch.duplicates()
        );
    }

    let stats = ImportStats {
        rows_read,
        records_prepared: batch.len(),
        records_upserted: 0,
        duplicate_ids: batch.duplicates(),
    };

    Ok((batch, stats))
}
