//! Grouping of adjacent rows that share a key value.
//!
//! Only *consecutive* runs are merged: two runs with the same key separated
//! by a different key stay separate groups. Sort the rows first when a full
//! group-by is wanted.

use serde::Serialize;

use crate::row::Row;

/// A key value paired with the consecutive run of items that share it.
///
/// Serializes as `{ key, items }` so templates can iterate `group.items`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Group<K, T> {
    key: K,
    items: Vec<T>,
}

impl<K, T> Group<K, T> {
    /// Returns the key shared by every item in the run.
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Returns the run's items in input order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of items in the run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the run is empty. Groups produced by [`group_runs`] never are.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Splits the group into its key and items.
    #[must_use]
    pub fn into_parts(self) -> (K, Vec<T>) {
        (self.key, self.items)
    }
}

/// Partitions `items` into maximal runs of equal keys, preserving order.
///
/// `key_of` is evaluated once per item. An empty input yields no groups.
///
/// # Examples
/// ```
/// use smallplate_core::group_runs;
///
/// let groups = group_runs([1, 1, 2, 1], |value| *value);
/// let sizes: Vec<usize> = groups.iter().map(|group| group.len()).collect();
/// assert_eq!(sizes, [2, 1, 1]);
/// ```
#[must_use]
pub fn group_runs<T, K, I, F>(items: I, mut key_of: F) -> Vec<Group<K, T>>
where
    I: IntoIterator<Item = T>,
    K: PartialEq,
    F: FnMut(&T) -> K,
{
    let mut groups: Vec<Group<K, T>> = Vec::new();
    let mut current: Option<Group<K, T>> = None;

    for item in items {
        let key = key_of(&item);
        match current.as_mut() {
            Some(run) if run.key == key => run.items.push(item),
            _ => {
                groups.extend(current.replace(Group {
                    key,
                    items: vec![item],
                }));
            }
        }
    }

    groups.extend(current);
    groups
}

/// Groups consecutive `rows` by the value of `key_name`.
///
/// A row without the column reads as the empty string, so adjacent rows
/// missing the key coalesce into one group.
///
/// # Examples
/// ```
/// use smallplate_core::{group_consecutive, load_rows};
///
/// let rows = load_rows("name,dept\nAlice,Eng\nBob,Eng\nCarl,Sales\n".as_bytes())?;
/// let groups = group_consecutive("dept", &rows);
/// assert_eq!(groups.len(), 2);
/// assert_eq!(*groups[0].key(), "Eng");
/// assert_eq!(groups[0].len(), 2);
/// assert_eq!(*groups[1].key(), "Sales");
/// # Ok::<(), smallplate_core::LoadError>(())
/// ```
#[must_use]
pub fn group_consecutive<'a>(key_name: &str, rows: &'a [Row]) -> Vec<Group<&'a str, &'a Row>> {
    group_runs(rows, |row| row.get_or_empty(key_name))
}
