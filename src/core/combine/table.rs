//! Incremental table of unique integer combinations.
//!
//! [`CombinationTable`] assigns every distinct k-tuple of band values an id in first-seen
//! order (1, 2, 3, ...) and keeps a running count per tuple. Rows of a raster stack are fed
//! in one scan-line at a time through [`CombinationTable::update_batch`]; the final contents
//! are read back with [`CombinationTable::export_table`].
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hasher};

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hash state that folds each key element into a Boost-style `hash_combine` seed.
///
/// Keys only ever feed `i32` elements, which the standard library hands over either one at a
/// time or as a single native-endian byte run for a whole slice. Both paths mix the same
/// sequence of values, so an owned key and a borrowed `[i32]` hash identically.
#[derive(Debug, Default, Clone, Copy)]
pub struct CombinationHasher {
    seed: u64,
}

impl CombinationHasher {
    #[inline]
    fn combine(&mut self, e: i32) {
        let v = e as i64 as u64;
        self.seed ^= v
            .wrapping_add(0x9e37_79b9)
            .wrapping_add(self.seed << 6)
            .wrapping_add(self.seed >> 2);
    }
}

impl Hasher for CombinationHasher {
    #[inline]
    fn finish(&self) -> u64 {
        // spread into the high bits, hashbrown takes its control byte from the top 7
        self.seed.wrapping_mul(0x9e37_79b9_7f4a_7c15)
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        let mut chunks = bytes.chunks_exact(4);
        for c in &mut chunks {
            self.combine(i32::from_ne_bytes([c[0], c[1], c[2], c[3]]));
        }
        for &b in chunks.remainder() {
            self.combine(b as i32);
        }
    }

    #[inline]
    fn write_i32(&mut self, i: i32) {
        self.combine(i);
    }

    // slice length prefix; every key in a table has the same length
    #[inline]
    fn write_usize(&mut self, _len: usize) {}
}

type CombinationBuildHasher = BuildHasherDefault<CombinationHasher>;

/// Fixed-length tuple of band values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombinationKey(Box<[i32]>);

impl CombinationKey {
    pub fn values(&self) -> &[i32] {
        &self.0
    }
}

impl Borrow<[i32]> for CombinationKey {
    fn borrow(&self) -> &[i32] {
        &self.0
    }
}

impl From<&[i32]> for CombinationKey {
    fn from(values: &[i32]) -> Self {
        CombinationKey(values.into())
    }
}

/// Id and running count of one distinct combination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinationRecord {
    pub id: u64,
    pub count: f64,
}

/// One exported row: key values, id and count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationRow {
    pub values: Vec<i32>,
    pub id: u64,
    pub count: f64,
}

/// Snapshot of a table. Row order follows hash map iteration and is not stable;
/// call [`CombinationTableExport::sort_by_id`] when order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationTableExport {
    /// Variable names followed by `id` and `count`
    pub columns: Vec<String>,
    pub rows: Vec<CombinationRow>,
}

impl CombinationTableExport {
    pub fn sort_by_id(&mut self) {
        self.rows.sort_unstable_by_key(|r| r.id);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Variable names only (without `id` and `count`)
    pub fn variable_names(&self) -> &[String] {
        &self.columns[..self.columns.len().saturating_sub(2)]
    }

    pub fn find(&self, values: &[i32]) -> Option<&CombinationRow> {
        self.rows.iter().find(|r| r.values == values)
    }
}

/// Mapping from k-tuples of integers to dense first-seen ids and running counts
#[derive(Debug, Clone)]
pub struct CombinationTable {
    key_length: usize,
    names: Option<Vec<String>>,
    map: HashMap<CombinationKey, CombinationRecord, CombinationBuildHasher>,
    last_id: u64,
    scratch: Vec<i32>,
}

impl CombinationTable {
    /// Table for keys of length `key_length`; columns export as `V1`..`Vk`
    pub fn new(key_length: usize) -> Result<Self> {
        if key_length == 0 {
            return Err(Error::invalid("key_length", key_length));
        }
        Ok(Self {
            key_length,
            names: None,
            map: HashMap::default(),
            last_id: 0,
            scratch: Vec::with_capacity(key_length),
        })
    }

    /// Table with one variable name per key position
    pub fn with_names<S: AsRef<str>>(key_length: usize, names: &[S]) -> Result<Self> {
        if names.len() != key_length {
            return Err(Error::invalid(
                "names",
                format!("{} names for key length {}", names.len(), key_length),
            ));
        }
        let mut table = Self::new(key_length)?;
        table.names = Some(names.iter().map(|s| s.as_ref().to_string()).collect());
        Ok(table)
    }

    pub fn key_length(&self) -> usize {
        self.key_length
    }

    /// Number of distinct combinations seen so far
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Most recently assigned id, 0 before the first update
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    /// Export column headers: variable names, then `id` and `count`
    pub fn column_names(&self) -> Vec<String> {
        let mut columns: Vec<String> = match &self.names {
            Some(names) => names.clone(),
            None => (1..=self.key_length).map(|i| format!("V{}", i)).collect(),
        };
        columns.push("id".to_string());
        columns.push("count".to_string());
        columns
    }

    /// Look up a combination without inserting it
    pub fn get(&self, key: &[i32]) -> Option<&CombinationRecord> {
        self.map.get(key)
    }

    /// Add `increment` to the count of `key`, assigning the next id if the key is new.
    /// Returns the key's id.
    pub fn update(&mut self, key: &[i32], increment: f64) -> Result<u64> {
        self.check_key(key)?;
        Ok(self.upsert(key, increment))
    }

    /// Update from a `k x M` grid where column `j` is the `j`-th tuple.
    /// Returns the `M` ids in column order.
    pub fn update_batch(&mut self, rows: ArrayView2<'_, i32>, increment: f64) -> Result<Vec<u64>> {
        self.check_rows(&rows)?;
        let mut key = std::mem::take(&mut self.scratch);
        let ids = rows
            .columns()
            .into_iter()
            .map(|col| {
                key.clear();
                key.extend(col.iter().copied());
                self.upsert(&key, increment)
            })
            .collect();
        self.scratch = key;
        Ok(ids)
    }

    /// Update from an `M x k` grid where each row is one tuple
    pub fn update_batch_by_tuple(
        &mut self,
        tuples: ArrayView2<'_, i32>,
        increment: f64,
    ) -> Result<Vec<u64>> {
        if tuples.ncols() != self.key_length {
            return Err(Error::invalid(
                "tuples",
                format!("{} columns for key length {}", tuples.ncols(), self.key_length),
            ));
        }
        let mut key = std::mem::take(&mut self.scratch);
        let ids = tuples
            .rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(values) => self.upsert(values, increment),
                None => {
                    key.clear();
                    key.extend(row.iter().copied());
                    self.upsert(&key, increment)
                }
            })
            .collect();
        self.scratch = key;
        Ok(ids)
    }

    /// Like [`update_batch`](Self::update_batch), but columns with `valid[j] == false` are
    /// left uncounted and reported as id 0.
    pub fn update_batch_masked(
        &mut self,
        rows: ArrayView2<'_, i32>,
        valid: &[bool],
        increment: f64,
    ) -> Result<Vec<u64>> {
        self.check_rows(&rows)?;
        if valid.len() != rows.ncols() {
            return Err(Error::invalid(
                "valid",
                format!("mask of {} for {} columns", valid.len(), rows.ncols()),
            ));
        }
        let mut key = std::mem::take(&mut self.scratch);
        let ids = rows
            .columns()
            .into_iter()
            .zip(valid)
            .map(|(col, &ok)| {
                if !ok {
                    return 0;
                }
                key.clear();
                key.extend(col.iter().copied());
                self.upsert(&key, increment)
            })
            .collect();
        self.scratch = key;
        Ok(ids)
    }

    /// Snapshot of every distinct combination, in unspecified order
    pub fn export_table(&self) -> CombinationTableExport {
        let rows = self
            .map
            .iter()
            .map(|(key, rec)| CombinationRow {
                values: key.values().to_vec(),
                id: rec.id,
                count: rec.count,
            })
            .collect();
        CombinationTableExport {
            columns: self.column_names(),
            rows,
        }
    }

    fn upsert(&mut self, key: &[i32], increment: f64) -> u64 {
        if let Some(rec) = self.map.get_mut(key) {
            rec.count += increment;
            return rec.id;
        }
        self.last_id += 1;
        let id = self.last_id;
        self.map.insert(
            CombinationKey::from(key),
            CombinationRecord {
                id,
                count: increment,
            },
        );
        id
    }

    fn check_key(&self, key: &[i32]) -> Result<()> {
        if key.len() != self.key_length {
            return Err(Error::invalid(
                "key",
                format!("length {} for key length {}", key.len(), self.key_length),
            ));
        }
        Ok(())
    }

    fn check_rows(&self, rows: &ArrayView2<'_, i32>) -> Result<()> {
        if rows.nrows() != self.key_length {
            return Err(Error::invalid(
                "rows",
                format!("{} rows for key length {}", rows.nrows(), self.key_length),
            ));
        }
        Ok(())
    }
}
