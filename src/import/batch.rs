//! Columnar batch for the single UNNEST upsert.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::record::MedicineRecord;

/// Prepared medicine rows in parallel vectors.
///
/// All vectors have the same length; index `i` across them is one row.
/// Each id appears at most once, because PostgreSQL refuses an
/// `ON CONFLICT DO UPDATE` that touches the same key twice.
#[derive(Debug, Default)]
pub struct MedicineBatch {
    pub ids: Vec<Option<i64>>,
    pub medicine_names: Vec<String>,
    pub mrps: Vec<Decimal>,
    pub brands: Vec<String>,
    pub pack_sizes: Vec<String>,
    pub compositions: Vec<String>,
    pub categories: Vec<String>,
    pub popularities: Vec<Decimal>,
    positions: HashMap<i64, usize>,
    duplicates: usize,
}

impl MedicineBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            medicine_names: Vec::with_capacity(capacity),
            mrps: Vec::with_capacity(capacity),
            brands: Vec::with_capacity(capacity),
            pack_sizes: Vec::with_capacity(capacity),
            compositions: Vec::with_capacity(capacity),
            categories: Vec::with_capacity(capacity),
            popularities: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            duplicates: 0,
        }
    }

    /// Add a record. A later record with an id already in the batch
    /// replaces the earlier one in place. Records without an id are never
    /// merged.
    pub fn push(&mut self, record: MedicineRecord) {
        if let Some(id) = record.id {
            if let Some(&slot) = self.positions.get(&id) {
                log::debug!("id {} appears more than once, keeping the later row", id);
                self.duplicates += 1;
                self.overwrite(slot, record);
                return;
            }
            self.positions.insert(id, self.ids.len());
        }

        self.ids.push(record.id);
        self.medicine_names.push(record.medicine_name);
        self.mrps.push(record.mrp);
        self.brands.push(record.brand);
        self.pack_sizes.push(record.pack_size);
        self.compositions.push(record.composition);
        self.categories.push(record.category);
        self.popularities.push(record.popularity);
    }

    fn overwrite(&mut self, slot: usize, record: MedicineRecord) {
        self.medicine_names[slot] = record.medicine_name;
        self.mrps[slot] = record.mrp;
        self.brands[slot] = record.brand;
        self.pack_sizes[slot] = record.pack_size;
        self.compositions[slot] = record.composition;
        self.categories[slot] = record.category;
        self.popularities[slot] = record.popularity;
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of records folded into an earlier row with the same id.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

impl FromIterator<MedicineRecord> for MedicineBatch {
    fn from_iter<I: IntoIterator<Item = MedicineRecord>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut batch = MedicineBatch::with_capacity(iter.size_hint().0);
        for record in iter {
            batch.push(record);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: Option<i64>, name: &str, mrp: i64) -> MedicineRecord {
        MedicineRecord {
            id,
            medicine_name: name.to_string(),
            mrp: Decimal::from(mrp),
            brand: String::new(),
            pack_size: String::new(),
            composition: String::new(),
            category: "Other".to_string(),
            popularity: Decimal::ZERO,
        }
    }

    #[test]
    fn columns_stay_aligned() {
        let batch: MedicineBatch = vec![record(Some(1), "A", 10), record(Some(2), "B", 20)]
            .into_iter()
            .collect();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.ids, vec![Some(1), Some(2)]);
        assert_eq!(batch.medicine_names, vec!["A", "B"]);
        assert_eq!(batch.mrps, vec![Decimal::from(10), Decimal::from(20)]);
        assert_eq!(batch.categories.len(), 2);
        assert_eq!(batch.duplicates(), 0);
    }

    #[test]
    fn later_duplicate_wins_in_original_slot() {
        let batch: MedicineBatch = vec![
            record(Some(5), "First", 1),
            record(Some(6), "Other", 2),
            record(Some(5), "Second", 3),
        ]
        .into_iter()
        .collect();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.ids, vec![Some(5), Some(6)]);
        assert_eq!(batch.medicine_names, vec!["Second", "Other"]);
        assert_eq!(batch.mrps[0], Decimal::from(3));
        assert_eq!(batch.duplicates(), 1);
    }

    #[test]
    fn rows_without_id_are_not_merged() {
        let batch: MedicineBatch = vec![record(None, "A", 1), record(None, "B", 2)]
            .into_iter()
            .collect();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.ids, vec![None, None]);
        assert_eq!(batch.duplicates(), 0);
    }

    #[test]
    fn empty_batch() {
        let batch = MedicineBatch::default();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }
}
