//! Loading the source CSV into memory.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{ImportError, ImportResult};
use crate::record::{MedicineRecord, RawMedicineRow};
use crate::schema;

/// The whole source file, header row validated.
#[derive(Debug)]
pub struct SourceTable {
    path: PathBuf,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl SourceTable {
    /// Read every row of `path`.
    ///
    /// A missing file, a row with more fields than the header, or invalid
    /// UTF-8 is a file error; a header row lacking a declared column is a
    /// missing-column error. Short rows are kept; their trailing cells count
    /// as empty. Nothing is coerced yet.
    pub fn load(path: impl AsRef<Path>) -> ImportResult<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::Headers)
            .from_path(path)
            .map_err(|err| ImportError::file(path, err))?;

        let headers = reader
            .headers()
            .map_err(|err| ImportError::file(path, err))?
            .clone();
        schema::validate_headers(&headers)?;

        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ImportError::file(path, err))?;

        if let Some(row) = rows.iter().find(|row| row.len() > headers.len()) {
            return Err(ImportError::ExtraFields {
                line: row.position().map(|pos| pos.line()).unwrap_or_default(),
                found: row.len(),
                expected: headers.len(),
            });
        }

        log::debug!("loaded {} rows from {}", rows.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Coerce every row in file order.
    ///
    /// `on_row` is called with the 1-based count of rows processed so far.
    pub fn records<F>(&self, mut on_row: F) -> ImportResult<Vec<MedicineRecord>>
    where
        F: FnMut(usize),
    {
        let mut records = Vec::with_capacity(self.rows.len());

        for (index, row) in self.rows.iter().enumerate() {
            // header occupies line 1
            let line = row
                .position()
                .map(|pos| pos.line())
                .unwrap_or(index as u64 + 2);
            let row = pad_to(row, self.headers.len());
            let raw: RawMedicineRow = row
                .deserialize(Some(&self.headers))
                .map_err(|err| ImportError::file(&self.path, err))?;
            records.push(MedicineRecord::from_raw(raw, line)?);
            on_row(index + 1);
        }

        Ok(records)
    }
}

/// Extend a short row with empty cells up to `width` fields.
fn pad_to(row: &StringRecord, width: usize) -> Cow<'_, StringRecord> {
    if row.len() >= width {
        return Cow::Borrowed(row);
    }
    let mut padded = row.clone();
    while padded.len() < width {
        padded.push_field("");
    }
    Cow::Owned(padded)
}
