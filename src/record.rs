//! Medicine rows and the coercion from raw CSV text to typed values.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

use crate::error::{ImportError, ImportResult};
use crate::schema;

/// Category written when the source leaves it blank.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Cell spellings treated the same as an empty cell.
pub const NULL_TOKENS: [&str; 10] = [
    "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// One source row as text, keyed by header name.
#[derive(Debug, Default, Deserialize)]
pub struct RawMedicineRow {
    pub id: Option<String>,
    pub medicine_name: Option<String>,
    pub mrp: Option<String>,
    pub brand: Option<String>,
    pub pack_size: Option<String>,
    pub composition: Option<String>,
    pub category: Option<String>,
    pub popularity: Option<String>,
}

/// A fully populated row of the `medicines` table.
///
/// `id` is the only field that may be absent; the destination key decides
/// whether such a row is accepted.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MedicineRecord {
    pub id: Option<i64>,
    pub medicine_name: String,
    pub mrp: Decimal,
    pub brand: String,
    pub pack_size: String,
    pub composition: String,
    pub category: String,
    pub popularity: Decimal,
}

impl MedicineRecord {
    /// Coerce a raw row, substituting defaults for missing cells.
    ///
    /// `line` is only used to locate values that are present but cannot be
    /// parsed.
    pub fn from_raw(raw: RawMedicineRow, line: u64) -> ImportResult<Self> {
        Ok(Self {
            id: coerce_id(raw.id, line)?,
            medicine_name: text_or(raw.medicine_name, ""),
            mrp: decimal_or_zero(raw.mrp, schema::MRP, line)?,
            brand: text_or(raw.brand, ""),
            pack_size: text_or(raw.pack_size, ""),
            composition: text_or(raw.composition, ""),
            category: text_or(raw.category, DEFAULT_CATEGORY),
            popularity: decimal_or_zero(raw.popularity, schema::POPULARITY, line)?,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && !NULL_TOKENS.contains(&v.trim()))
}

/// Numeric cells holding only whitespace are missing too.
fn present_number(value: Option<String>) -> Option<String> {
    present(value).filter(|v| !v.trim().is_empty())
}

fn text_or(value: Option<String>, default: &str) -> String {
    present(value).unwrap_or_else(|| default.to_string())
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

fn decimal_or_zero(
    value: Option<String>,
    column: &'static str,
    line: u64,
) -> ImportResult<Decimal> {
    match present_number(value) {
        None => Ok(Decimal::ZERO),
        Some(raw) => parse_decimal(&raw).ok_or(ImportError::InvalidValue {
            line,
            column,
            value: raw,
        }),
    }
}

/// Ids may arrive as `5` or as a whole-number decimal like `5.0`.
fn coerce_id(value: Option<String>, line: u64) -> ImportResult<Option<i64>> {
    let Some(raw) = present_number(value) else {
        return Ok(None);
    };

    if let Ok(id) = raw.trim().parse::<i64>() {
        return Ok(Some(id));
    }

    parse_decimal(&raw)
        .filter(|d| d.fract().is_zero())
        .and_then(|d| d.to_i64())
        .map(Some)
        .ok_or(ImportError::InvalidValue {
            line,
            column: schema::ID,
            value: raw,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(fields: [&str; 8]) -> RawMedicineRow {
        let cell = |s: &str| {
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        };
        RawMedicineRow {
            id: cell(fields[0]),
            medicine_name: cell(fields[1]),
            mrp: cell(fields[2]),
            brand: cell(fields[3]),
            pack_size: cell(fields[4]),
            composition: cell(fields[5]),
            category: cell(fields[6]),
            popularity: cell(fields[7]),
        }
    }

    #[test]
    fn populated_row_is_kept_verbatim() {
        let record = MedicineRecord::from_raw(
            raw([
                "1",
                "Paracetamol",
                "25.50",
                "ABC",
                "10 tabs",
                "Paracetamol 500mg",
                "Pain Relief",
                "8.2",
            ]),
            2,
        )
        .unwrap();

        assert_eq!(record.id, Some(1));
        assert_eq!(record.medicine_name, "Paracetamol");
        assert_eq!(record.mrp, Decimal::new(2550, 2));
        assert_eq!(record.brand, "ABC");
        assert_eq!(record.pack_size, "10 tabs");
        assert_eq!(record.composition, "Paracetamol 500mg");
        assert_eq!(record.category, "Pain Relief");
        assert_eq!(record.popularity, Decimal::new(82, 1));
    }

    #[test]
    fn empty_fields_take_defaults() {
        let record = MedicineRecord::from_raw(raw(["2", "", "", "", "", "", "", ""]), 3).unwrap();

        assert_eq!(record.id, Some(2));
        assert_eq!(record.medicine_name, "");
        assert_eq!(record.mrp, Decimal::ZERO);
        assert_eq!(record.brand, "");
        assert_eq!(record.pack_size, "");
        assert_eq!(record.composition, "");
        assert_eq!(record.category, "Other");
        assert_eq!(record.popularity, Decimal::ZERO);
    }

    #[test]
    fn null_tokens_count_as_missing() {
        let record = MedicineRecord::from_raw(
            raw(["3", "NaN", "NA", "null", "N/A", "None", "#N/A", "<NA>"]),
            4,
        )
        .unwrap();

        assert_eq!(record.medicine_name, "");
        assert_eq!(record.mrp, Decimal::ZERO);
        assert_eq!(record.brand, "");
        assert_eq!(record.category, "Other");
        assert_eq!(record.popularity, Decimal::ZERO);
    }

    #[test]
    fn whitespace_text_is_not_missing() {
        let record = MedicineRecord::from_raw(raw(["4", " ", "", "", "", "", " ", ""]), 5).unwrap();
        assert_eq!(record.medicine_name, " ");
        assert_eq!(record.category, " ");
    }

    #[test]
    fn blank_numeric_cells_take_defaults() {
        let record =
            MedicineRecord::from_raw(raw(["  ", "X", " ", "", "", "", "", "\t"]), 11).unwrap();
        assert_eq!(record.id, None);
        assert_eq!(record.mrp, Decimal::ZERO);
        assert_eq!(record.popularity, Decimal::ZERO);
    }

    #[test]
    fn missing_id_maps_to_none() {
        let record = MedicineRecord::from_raw(raw(["", "X", "", "", "", "", "", ""]), 6).unwrap();
        assert_eq!(record.id, None);
    }

    #[test]
    fn whole_number_decimal_id_is_accepted() {
        let record =
            MedicineRecord::from_raw(raw(["12.0", "X", "", "", "", "", "", ""]), 7).unwrap();
        assert_eq!(record.id, Some(12));
    }

    #[test]
    fn fractional_id_is_rejected() {
        let err = MedicineRecord::from_raw(raw(["12.5", "X", "", "", "", "", "", ""]), 8)
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::InvalidValue { line: 8, column: "id", .. }
        ));
    }

    #[test]
    fn numeric_cells_tolerate_padding_and_exponents() {
        let record =
            MedicineRecord::from_raw(raw(["5", "X", " 19.99 ", "", "", "", "", "1e2"]), 9)
                .unwrap();
        assert_eq!(record.mrp, Decimal::new(1999, 2));
        assert_eq!(record.popularity, Decimal::from(100));
    }

    #[test]
    fn unparsable_popularity_is_reported() {
        let err = MedicineRecord::from_raw(raw(["5", "X", "1", "", "", "", "", "high"]), 10)
            .unwrap_err();
        match err {
            ImportError::InvalidValue { column, value, .. } => {
                assert_eq!(column, "popularity");
                assert_eq!(value, "high");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
