//! Per-draw spatial feature extraction.
//!
//! A draw is mapped onto the slip grid and reduced to a fixed-schema numeric
//! vector. Two schemas exist:
//!
//! - [`FeatureSchema::Grid`] (canonical): centroid, Manhattan dispersion,
//!   quadrant/border/corner counts, row/col spread, adjacency, BFS
//!   connectivity, inertia, eccentricity, compactness, symmetry and rings.
//! - [`FeatureSchema::Slip`]: Euclidean distance statistics, half-plane and
//!   quadrant counts, centroid offset, nearest-neighbor distance and
//!   higher-order pattern statistics.
//!
//! Observed and simulated tables must come from the same schema; the validator
//! rejects tables whose key sets differ.

pub mod slip;
pub mod spatial;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::LotteryConfig;
use crate::error::{InvalidDrawError, ValidationInputError};
use crate::grid::GridMapper;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Which feature set to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSchema {
    #[default]
    Grid,
    Slip,
}

impl FeatureSchema {
    /// Feature keys in vector order.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Self::Grid => spatial::NAMES,
            Self::Slip => slip::NAMES,
        }
    }

    pub fn len(self) -> usize {
        self.names().len()
    }

    pub fn is_empty(self) -> bool {
        self.names().is_empty()
    }

    pub fn index_of(self, name: &str) -> Option<usize> {
        self.names().iter().position(|&n| n == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Slip => "slip",
        }
    }
}

impl std::str::FromStr for FeatureSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Self::Grid),
            "slip" => Ok(Self::Slip),
            other => Err(format!("unknown feature schema '{other}' (expected grid or slip)")),
        }
    }
}

// ---------------------------------------------------------------------------
// FeatureVector
// ---------------------------------------------------------------------------

/// Feature values of exactly one draw, aligned with `schema.names()`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: FeatureSchema,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.index_of(name).map(|i| self.values[i])
    }

    /// `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.schema
            .names()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Converts validated draws into feature vectors for one lottery variant.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    grid: GridMapper,
    schema: FeatureSchema,
}

impl FeatureExtractor {
    pub fn new(config: &LotteryConfig, schema: FeatureSchema) -> Self {
        Self {
            grid: GridMapper::new(config),
            schema,
        }
    }

    pub fn grid(&self) -> &GridMapper {
        &self.grid
    }

    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    /// Extract features for one draw. The draw is validated first; nothing is
    /// computed for an invalid draw.
    pub fn extract(&self, numbers: &[u32]) -> Result<FeatureVector, InvalidDrawError> {
        let positions = self.grid.positions(numbers)?;
        let values = match self.schema {
            FeatureSchema::Grid => spatial::extract(&self.grid, &positions),
            FeatureSchema::Slip => slip::extract(&self.grid, &positions),
        };
        debug_assert_eq!(values.len(), self.schema.len());
        Ok(FeatureVector {
            schema: self.schema,
            values,
        })
    }
}

// ---------------------------------------------------------------------------
// FeatureTable
// ---------------------------------------------------------------------------

/// Column-named table of per-draw feature values.
///
/// This is the shape exchanged with the validator, so tables built outside
/// the extractor (e.g. loaded from a file) can be validated too.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FeatureTable {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Empty table with the given columns.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Empty table with a schema's columns.
    pub fn for_schema(schema: FeatureSchema) -> Self {
        Self::new(schema.names().iter().copied())
    }

    /// Table from extracted vectors; every vector must use `schema`.
    pub fn from_vectors<'a, I>(schema: FeatureSchema, vectors: I) -> Result<Self, ValidationInputError>
    where
        I: IntoIterator<Item = &'a FeatureVector>,
    {
        let mut table = Self::for_schema(schema);
        for vector in vectors {
            if vector.schema() != schema {
                return Err(ValidationInputError::MixedRunSchemas);
            }
            table.rows.push(vector.values().to_vec());
        }
        Ok(table)
    }

    /// Append a row; its length must match the column count.
    pub fn push_row(&mut self, row: Vec<f64>) -> Result<(), ValidationInputError> {
        if row.len() != self.names.len() {
            return Err(ValidationInputError::RaggedRow {
                row: self.rows.len(),
                expected: self.names.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_sizes() {
        assert_eq!(FeatureSchema::Grid.len(), 27);
        assert_eq!(FeatureSchema::Slip.len(), 19);
        assert_eq!(FeatureSchema::Grid.index_of("dispersion"), Some(2));
        assert_eq!(FeatureSchema::Grid.index_of("nope"), None);
    }

    #[test]
    fn test_schema_names_unique() {
        for schema in [FeatureSchema::Grid, FeatureSchema::Slip] {
            let mut names = schema.names().to_vec();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), schema.len());
        }
    }

    #[test]
    fn test_extract_rejects_invalid_draw() {
        let ex = FeatureExtractor::new(&LotteryConfig::megasena(), FeatureSchema::Grid);
        assert!(matches!(
            ex.extract(&[1, 2, 3]),
            Err(InvalidDrawError::WrongSize { expected: 6, got: 3 })
        ));
        assert!(ex.extract(&[1, 2, 3, 4, 5, 99]).is_err());
    }

    #[test]
    fn test_vector_lookup_and_serialize() {
        let ex = FeatureExtractor::new(&LotteryConfig::megasena(), FeatureSchema::Grid);
        let v = ex.extract(&[1, 10, 11, 20, 30, 60]).unwrap();
        assert_eq!(v.get("corner_count"), Some(3.0));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["border_count"], 6.0);
        assert_eq!(json.as_object().unwrap().len(), 27);
    }

    #[test]
    fn test_table_from_vectors() {
        let ex = FeatureExtractor::new(&LotteryConfig::lotofacil(), FeatureSchema::Slip);
        let draws = [
            (1..=15).collect::<Vec<u32>>(),
            (11..=25).collect::<Vec<u32>>(),
        ];
        let vectors: Vec<_> = draws.iter().map(|d| ex.extract(d).unwrap()).collect();
        let table = FeatureTable::from_vectors(FeatureSchema::Slip, &vectors).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.names().len(), FeatureSchema::Slip.len());
        assert_eq!(table.column("top_count").unwrap().len(), 2);
        assert!(FeatureTable::from_vectors(FeatureSchema::Grid, &vectors).is_err());
    }

    #[test]
    fn test_push_row_checks_width() {
        let mut table = FeatureTable::new(["a", "b"]);
        assert!(table.push_row(vec![1.0, 2.0]).is_ok());
        assert!(matches!(
            table.push_row(vec![1.0]),
            Err(ValidationInputError::RaggedRow { row: 1, expected: 2, got: 1 })
        ));
    }
}
