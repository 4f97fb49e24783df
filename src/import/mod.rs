//! Medicine import pipeline.
//!
//! One run moves the source file into the `medicines` table:
//!
//! 1. **Load** (`crate::source`) - Read and header-check the whole CSV
//! 2. **Prepare** (`batch`) - Coerce rows into columnar format, one row per id
//! 3. **Write** (`database_operations`) - One UNNEST upsert, committed atomically
//! 4. **Coordination** (`coordinator`) - Owns the connection and the run order
//! 5. **Statistics** (`stats`) - Counts reported at the end
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use medicine_importer::config::ImportConfig;
//! use medicine_importer::import::Importer;
//!
//! let importer = Importer::new(ImportConfig::from_env()?);
//! let stats = importer.run().await?;
//!
//! println!("Imported {} medicines", stats.records_upserted);
//! ```

pub mod batch;
pub mod coordinator;
pub mod database_operations;
pub mod stats;

pub use batch::MedicineBatch;
pub use coordinator::{Importer, PROGRESS_INTERVAL};
pub use stats::ImportStats;
