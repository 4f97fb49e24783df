//! Database operations for the medicine import.
//!
//! The importer owns exactly one connection for the duration of a run;
//! there is no pool.

use sqlx::Connection;
use sqlx::postgres::PgConnection;

use crate::config::DatabaseConfig;
use crate::error::{ImportError, ImportResult};
use crate::import::batch::MedicineBatch;

/// Open the run's dedicated connection.
pub async fn connect(config: &DatabaseConfig) -> ImportResult<PgConnection> {
    let options = config.connect_options()?;
    PgConnection::connect_with(&options)
        .await
        .map_err(ImportError::Connection)
}

/// Upsert a batch of medicines in one statement.
///
/// New ids are inserted; existing ids have every non-key column replaced
/// with the incoming value.
///
/// # Returns
/// Number of rows inserted or updated
pub async fn upsert_medicines_batch(
    conn: &mut PgConnection,
    batch: &MedicineBatch,
) -> Result<u64, sqlx::Error> {
    if batch.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"INSERT INTO medicines (
               id, medicine_name, mrp, brand, pack_size, composition, category, popularity
           )
           SELECT * FROM UNNEST(
               $1::int8[],
               $2::text[],
               $3::numeric[],
               $4::text[],
               $5::text[],
               $6::text[],
               $7::text[],
               $8::numeric[]
           )
           ON CONFLICT (id) DO UPDATE
           SET medicine_name = EXCLUDED.medicine_name,
               mrp = EXCLUDED.mrp,
               brand = EXCLUDED.brand,
               pack_size = EXCLUDED.pack_size,
               composition = EXCLUDED.composition,
               category = EXCLUDED.category,
               popularity = EXCLUDED.popularity"#,
    )
    .bind(&batch.ids)
    .bind(&batch.medicine_names)
    .bind(&batch.mrps)
    .bind(&batch.brands)
    .bind(&batch.pack_sizes)
    .bind(&batch.compositions)
    .bind(&batch.categories)
    .bind(&batch.popularities)
    .execute(&mut *conn)
    .await?;

    let rows_affected = result.rows_affected();
    log::trace!("bulk upserted {} medicines", rows_affected);
    Ok(rows_affected)
}

/// Upsert the batch inside its own transaction and commit it.
///
/// If the statement or the commit fails, nothing from the batch is kept.
pub async fn write_batch(conn: &mut PgConnection, batch: &MedicineBatch) -> ImportResult<u64> {
    let mut tx = conn.begin().await.map_err(ImportError::Write)?;
    let written = upsert_medicines_batch(&mut *tx, batch)
        .await
        .map_err(ImportError::Write)?;
    tx.commit().await.map_err(ImportError::Write)?;
    Ok(written)
}
