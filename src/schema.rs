//! Declared layout of the source file and the destination table.
//!
//! Both sides use the same eight column names. The source may order them
//! freely and may carry extra columns, but every declared column must be
//! present before any row is transformed.

use csv::StringRecord;

use crate::error::{ImportError, ImportResult};

pub const TABLE: &str = "medicines";

pub const ID: &str = "id";
pub const MEDICINE_NAME: &str = "medicine_name";
pub const MRP: &str = "mrp";
pub const BRAND: &str = "brand";
pub const PACK_SIZE: &str = "pack_size";
pub const COMPOSITION: &str = "composition";
pub const CATEGORY: &str = "category";
pub const POPULARITY: &str = "popularity";

/// Destination column order; `id` is the conflict key.
pub const COLUMNS: [&str; 8] = [
    ID,
    MEDICINE_NAME,
    MRP,
    BRAND,
    PACK_SIZE,
    COMPOSITION,
    CATEGORY,
    POPULARITY,
];

/// Fail with the first declared column the header row lacks.
pub fn validate_headers(headers: &StringRecord) -> ImportResult<()> {
    for column in COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(ImportError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    Ok(())
}
