use crate::value::ScalarValue;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One row of an ad-hoc result: column name -> value, in the column order the
/// engine reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRow {
    cells: Vec<(String, ScalarValue)>,
}

impl QueryRow {
    /// Zips column names with one row of values.
    ///
    /// A repeated column name (an unaliased join such as `a.id, b.id`) keeps
    /// the position of its first occurrence and the value of its last, so the
    /// row has fewer keys than the result set has columns. Callers that need
    /// every column must alias them apart.
    pub fn from_columns(columns: &[String], values: Vec<ScalarValue>) -> Self {
        let mut cells: Vec<(String, ScalarValue)> = Vec::with_capacity(columns.len());
        for (name, value) in columns.iter().zip(values) {
            match cells.iter_mut().find(|(existing, _)| existing == name) {
                Some(cell) => cell.1 = value,
                None => cells.push((name.clone(), value)),
            }
        }
        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for QueryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// The normalized rows of one ad-hoc statement.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct QueryResult {
    rows: Vec<QueryRow>,
}

impl QueryResult {
    /// Builds the result from the engine's column list and raw value rows.
    pub fn from_columns(columns: &[String], rows: Vec<Vec<ScalarValue>>) -> Self {
        let distinct = {
            let mut seen: Vec<&String> = Vec::with_capacity(columns.len());
            for name in columns {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
            seen.len()
        };
        if distinct < columns.len() {
            tracing::warn!(
                columns = ?columns,
                dropped = columns.len() - distinct,
                "Result set has duplicate column names; only the last value of each survives."
            );
        }

        let rows = rows
            .into_iter()
            .map(|values| QueryRow::from_columns(columns, values))
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[QueryRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<QueryRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
