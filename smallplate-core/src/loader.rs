//! CSV loading into ordered [`Row`] sequences.
//!
//! The first record supplies the column names; every later record becomes one
//! [`Row`]. Lexical behaviour is configured through [`LoaderOptions`].

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, instrument, warn};

use crate::error::{LoadError, OptionsFault};
use crate::quotes::validate_quotes;
use crate::row::Row;

/// How records whose field count differs from the header are handled.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RaggedPolicy {
    /// Pad short records with empty values and ignore extra fields.
    #[default]
    Lenient,
    /// Reject any record whose field count differs from the header.
    Strict,
}

/// How quoting mistakes in the input are handled.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum QuotePolicy {
    /// Reject unterminated, bare and extraneous quotes.
    #[default]
    Strict,
    /// Accept whatever the underlying CSV reader accepts.
    Lazy,
}

/// Lexical options applied while loading CSV input.
///
/// # Examples
/// ```
/// use smallplate_core::{LoaderOptions, RaggedPolicy};
///
/// let options = LoaderOptions::new()
///     .with_delimiter(b';')
///     .with_comment(None)
///     .with_ragged(RaggedPolicy::Strict);
/// assert_eq!(options.delimiter(), b';');
/// assert_eq!(options.comment(), None);
/// assert_eq!(options.ragged(), RaggedPolicy::Strict);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LoaderOptions {
    delimiter: u8,
    comment: Option<u8>,
    ragged: RaggedPolicy,
    quotes: QuotePolicy,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            comment: Some(b'#'),
            ragged: RaggedPolicy::Lenient,
            quotes: QuotePolicy::Strict,
        }
    }
}

impl LoaderOptions {
    /// Creates options populated with the defaults: comma delimiter, `#`
    /// comments, lenient ragged records and strict quoting.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the comment marker, or disables comments with `None`.
    #[must_use]
    pub const fn with_comment(mut self, comment: Option<u8>) -> Self {
        self.comment = comment;
        self
    }

    /// Sets the ragged-record policy.
    #[must_use]
    pub const fn with_ragged(mut self, ragged: RaggedPolicy) -> Self {
        self.ragged = ragged;
        self
    }

    /// Sets the quoting policy.
    #[must_use]
    pub const fn with_quotes(mut self, quotes: QuotePolicy) -> Self {
        self.quotes = quotes;
        self
    }

    /// Returns the field delimiter.
    #[must_use]
    pub const fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Returns the comment marker, if comments are enabled.
    #[must_use]
    pub const fn comment(&self) -> Option<u8> {
        self.comment
    }

    /// Returns the ragged-record policy.
    #[must_use]
    pub const fn ragged(&self) -> RaggedPolicy {
        self.ragged
    }

    /// Returns the quoting policy.
    #[must_use]
    pub const fn quotes(&self) -> QuotePolicy {
        self.quotes
    }

    /// Checks that the delimiter and comment marker describe a usable dialect.
    ///
    /// Neither byte may be `"`, `\r` or `\n`, and the comment marker must
    /// differ from the delimiter.
    ///
    /// # Errors
    /// Returns [`LoadError::InvalidOptions`] naming the offending byte.
    ///
    /// # Examples
    /// ```
    /// use smallplate_core::{LoadError, LoaderOptions, OptionsFault};
    ///
    /// assert!(LoaderOptions::new().validate().is_ok());
    /// let err = LoaderOptions::new().with_delimiter(b'#').validate().unwrap_err();
    /// assert!(matches!(
    ///     err,
    ///     LoadError::InvalidOptions { fault: OptionsFault::CommentIsDelimiter(b'#') }
    /// ));
    /// ```
    pub const fn validate(&self) -> Result<(), LoadError> {
        if is_reserved(self.delimiter) {
            return Err(LoadError::InvalidOptions {
                fault: OptionsFault::Delimiter(self.delimiter),
            });
        }
        match self.comment {
            Some(comment) if is_reserved(comment) => Err(LoadError::InvalidOptions {
                fault: OptionsFault::Comment(comment),
            }),
            Some(comment) if comment == self.delimiter => Err(LoadError::InvalidOptions {
                fault: OptionsFault::CommentIsDelimiter(comment),
            }),
            _ => Ok(()),
        }
    }
}

const fn is_reserved(byte: u8) -> bool {
    matches!(byte, b'"' | b'\r' | b'\n')
}

/// Loads `reader` with the default [`LoaderOptions`].
///
/// # Errors
/// See [`load`].
///
/// # Examples
/// ```
/// use smallplate_core::load_rows;
///
/// let rows = load_rows("name,dept\nAlice,Eng\nBob,Eng\n".as_bytes())?;
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1].get("name"), Some("Bob"));
/// # Ok::<(), smallplate_core::LoadError>(())
/// ```
pub fn load_rows<R: Read>(reader: R) -> Result<Vec<Row>, LoadError> {
    load(reader, &LoaderOptions::default())
}

/// Reads CSV from `reader` and returns one [`Row`] per data record, in input
/// order.
///
/// Comment lines and blank lines are skipped, including before the header.
/// With duplicate header names the right-most column wins.
///
/// # Errors
/// Returns [`LoadError::InvalidOptions`] when `options` fail
/// [`LoaderOptions::validate`], [`LoadError::NoHeader`] when the input holds
/// no record,
/// [`LoadError::Malformed`] for quoting faults under
/// [`QuotePolicy::Strict`], [`LoadError::FieldCount`] for ragged records
/// under [`RaggedPolicy::Strict`], and [`LoadError::Decode`] or
/// [`LoadError::Io`] when the stream cannot be read or decoded. No rows are
/// returned on failure.
///
/// # Examples
/// ```
/// use smallplate_core::{LoadError, LoaderOptions, RaggedPolicy, load};
///
/// let options = LoaderOptions::new().with_ragged(RaggedPolicy::Strict);
/// let err = load("a,b\n1\n".as_bytes(), &options).unwrap_err();
/// assert!(matches!(err, LoadError::FieldCount { expected: 2, found: 1, .. }));
/// ```
#[instrument(name = "core.load", level = "debug", skip(reader), err)]
pub fn load<R: Read>(mut reader: R, options: &LoaderOptions) -> Result<Vec<Row>, LoadError> {
    options.validate()?;

    let mut input = Vec::new();
    reader
        .read_to_end(&mut input)
        .map_err(|source| LoadError::Io { source })?;

    if options.quotes == QuotePolicy::Strict {
        validate_quotes(&input, options.delimiter, options.comment)?;
    }

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .comment(options.comment)
        .from_reader(input.as_slice());

    let mut record = StringRecord::new();
    if !csv_reader.read_record(&mut record)? {
        return Err(LoadError::NoHeader);
    }
    let header: Vec<String> = record.iter().map(ToOwned::to_owned).collect();
    warn_on_duplicate_columns(&header);

    let mut rows = Vec::new();
    while csv_reader.read_record(&mut record)? {
        rows.push(build_row(&header, &record, options.ragged)?);
    }

    debug!(columns = header.len(), rows = rows.len(), "loaded CSV input");
    Ok(rows)
}

fn build_row(
    header: &[String],
    record: &StringRecord,
    ragged: RaggedPolicy,
) -> Result<Row, LoadError> {
    let line = record.position().map_or(0, csv::Position::line);
    if record.len() != header.len() {
        match ragged {
            RaggedPolicy::Strict => {
                return Err(LoadError::FieldCount {
                    line,
                    expected: header.len(),
                    found: record.len(),
                });
            }
            RaggedPolicy::Lenient if record.len() > header.len() => {
                debug!(
                    line,
                    ignored = record.len() - header.len(),
                    "ignoring fields beyond the header"
                );
            }
            RaggedPolicy::Lenient => {}
        }
    }

    let cells: BTreeMap<String, String> = header
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let value = record.get(index).unwrap_or_default();
            (column.clone(), value.to_owned())
        })
        .collect();
    Ok(Row::with_cells(cells))
}

fn warn_on_duplicate_columns(header: &[String]) {
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    for column in header {
        if !seen.insert(column.as_str()) && reported.insert(column.as_str()) {
            warn!(
                column = column.as_str(),
                "duplicate header column; the right-most value wins"
            );
        }
    }
}
