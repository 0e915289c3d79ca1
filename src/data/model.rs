use std::collections::{BTreeMap, HashSet};
use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
///
/// Equality, ordering and hashing are all derived from one total order
/// (floats compare with `total_cmp`), so `NaN == NaN` here.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, ""),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// One row of the source table: field name → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: BTreeMap<String, CellValue>,
}

static NULL: CellValue = CellValue::Null;

impl Record {
    /// Build a record from `(field, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
    {
        Record {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `field`; a missing field reads as [`CellValue::Null`].
    pub fn get(&self, field: &str) -> &CellValue {
        self.fields.get(field).unwrap_or(&NULL)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("grouping field '{field}' is not a column (columns: {columns:?})")]
    UnknownGroupingField { field: String, columns: Vec<String> },
}

/// The immutable table plus its grouping index.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    /// Column names in source order.
    columns: Vec<String>,
    grouping_field: String,
    /// Distinct grouping values in first-seen order.
    distinct_groups: Vec<CellValue>,
}

impl Dataset {
    pub fn new(
        columns: Vec<String>,
        records: Vec<Record>,
        grouping_field: &str,
    ) -> Result<Self, DataError> {
        if !columns.iter().any(|c| c == grouping_field) {
            return Err(DataError::UnknownGroupingField {
                field: grouping_field.to_string(),
                columns,
            });
        }

        let distinct_groups = {
            let mut seen = HashSet::new();
            records
                .iter()
                .map(|r| r.get(grouping_field))
                .filter(|v| seen.insert(*v))
                .cloned()
                .collect()
        };

        Ok(Dataset {
            records,
            columns,
            grouping_field: grouping_field.to_string(),
            distinct_groups,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn grouping_field(&self) -> &str {
        &self.grouping_field
    }

    pub fn distinct_groups(&self) -> &[CellValue] {
        &self.distinct_groups
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DerivedView – the records matching one selection
// ---------------------------------------------------------------------------

/// Indices into a [`Dataset`] of the records matching `selection`, in
/// dataset order. Never cached across selection changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedView {
    pub selection: Option<CellValue>,
    pub indices: Vec<usize>,
}

impl DerivedView {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The matching records, borrowed from `dataset`.
    pub fn records<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a Record> + 'a {
        self.indices.iter().filter_map(|&i| dataset.record(i))
    }
}
