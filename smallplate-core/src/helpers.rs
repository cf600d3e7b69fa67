//! Helper functions exposed to templates.
//!
//! Helpers are collected in a [`HelperTable`] that the renderer installs on
//! each template environment; there is no process-wide registry.

use std::collections::BTreeMap;
use std::num::IntErrorKind;

use minijinja::value::Value;
use minijinja::{Environment, Error, ErrorKind, context};

use crate::group::group_runs;

/// Parses `raw` as a base-10 integer, returning `0` when it is not one.
///
/// An optional leading `+` or `-` is accepted; surrounding whitespace is not.
/// Well-formed numbers outside the `i64` range saturate to the nearest bound.
///
/// # Examples
/// ```
/// use smallplate_core::parse_int_or_zero;
///
/// assert_eq!(parse_int_or_zero("42"), 42);
/// assert_eq!(parse_int_or_zero("-7"), -7);
/// assert_eq!(parse_int_or_zero("forty-two"), 0);
/// assert_eq!(parse_int_or_zero(" 1"), 0);
/// ```
#[must_use]
pub fn parse_int_or_zero(raw: &str) -> i64 {
    match raw.parse::<i64>() {
        Ok(value) => value,
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => 0,
        },
    }
}

/// Named functions made available to templates.
///
/// # Examples
/// ```
/// use smallplate_core::HelperTable;
///
/// let table = HelperTable::standard();
/// let names: Vec<&str> = table.names().collect();
/// assert_eq!(names, ["groupby", "int", "unescape"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct HelperTable {
    functions: BTreeMap<String, Value>,
}

impl HelperTable {
    /// Creates a table without any helpers.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the table used by the command line: `unescape`, `groupby` and
    /// `int`.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_function("unescape", Value::from_function(unescape))
            .with_function("groupby", Value::from_function(groupby))
            .with_function("int", Value::from_function(int))
    }

    /// Adds `function` under `name`, replacing any helper already registered
    /// with that name.
    ///
    /// `function` is normally built with [`Value::from_function`].
    #[must_use]
    pub fn with_function(mut self, name: impl Into<String>, function: Value) -> Self {
        self.functions.insert(name.into(), function);
        self
    }

    /// Iterates over the registered helper names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub(crate) fn install(&self, env: &mut Environment<'_>) {
        for (name, function) in &self.functions {
            env.add_global(name.clone(), function.clone());
        }
    }
}

/// Marks `text` as safe so it is emitted verbatim under HTML escaping.
fn unescape(text: String) -> Value {
    Value::from_safe_string(text)
}

/// Lenient integer conversion; numbers pass through unchanged.
fn int(value: &Value) -> i64 {
    match value.as_str() {
        Some(text) => parse_int_or_zero(text),
        None => i64::try_from(value.clone()).unwrap_or_default(),
    }
}

/// Groups consecutive items of `rows` by their `key` attribute.
///
/// Each group is a map with `key` and `items`. An item without the attribute
/// reads as the empty string.
fn groupby(key: &str, rows: &Value) -> Result<Value, Error> {
    let iter = rows.try_iter().map_err(|err| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("groupby expects a sequence of rows, got {}", rows.kind()),
        )
        .with_source(err)
    })?;

    let mut keyed = Vec::new();
    for item in iter {
        let attr = item.get_attr(key)?;
        let group_key = if attr.is_undefined() || attr.is_none() {
            Value::from("")
        } else {
            attr
        };
        keyed.push((group_key, item));
    }

    let groups = group_runs(keyed, |(group_key, _)| group_key.clone());
    Ok(groups
        .into_iter()
        .map(|group| {
            let (group_key, members) = group.into_parts();
            let items: Vec<Value> = members.into_iter().map(|(_, item)| item).collect();
            context! { key => group_key, items => items }
        })
        .collect())
}
