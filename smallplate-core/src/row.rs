//! Row values produced by the CSV loader.

use std::collections::BTreeMap;

use serde::Serialize;

/// One data record keyed by column name.
///
/// Keys come from the header record and values are the raw field text.
/// Rows serialize as plain maps so templates can address columns as
/// attributes (`row.name`).
///
/// # Examples
/// ```
/// use smallplate_core::Row;
///
/// let row = Row::from_iter([("name", "Alice"), ("dept", "Eng")]);
/// assert_eq!(row.get("name"), Some("Alice"));
/// assert_eq!(row.get_or_empty("missing"), "");
/// assert_eq!(row.len(), 2);
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, String>,
}

impl Row {
    pub(crate) fn with_cells(cells: BTreeMap<String, String>) -> Self {
        Self { cells }
    }

    /// Returns the value stored under `column`, if any.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// Returns the value stored under `column`, reading a missing column as
    /// the empty string.
    #[must_use]
    pub fn get_or_empty(&self, column: &str) -> &str {
        self.get(column).unwrap_or_default()
    }

    /// Number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row holds no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over `(column, value)` pairs in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells
            .iter()
            .map(|(column, value)| (column.as_str(), value.as_str()))
    }

    /// Iterates over the column names in sorted order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::with_cells(
            iter.into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }
}
