//! Error types for the smallplate core library.
//!
//! Loading and rendering fail with distinct enums so callers can report the
//! stage that broke. Each error exposes a stable machine-readable code.

use std::{fmt, io};

use minijinja::ErrorKind;
use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Quote faults detected while validating CSV input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteFault {
    /// A quoted field was still open at the end of the input.
    Unterminated,
    /// A `"` appeared inside a field that did not start with a quote.
    BareQuote,
    /// A closing `"` was followed by something other than a delimiter or
    /// line break.
    ExtraneousQuote,
}

impl fmt::Display for QuoteFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unterminated => "unterminated quoted field",
            Self::BareQuote => "bare `\"` in unquoted field",
            Self::ExtraneousQuote => "extraneous `\"` after quoted field",
        })
    }
}

/// Problems with a [`crate::LoaderOptions`] combination.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptionsFault {
    /// The delimiter is a quote or a line break.
    Delimiter(u8),
    /// The comment marker is a quote or a line break.
    Comment(u8),
    /// The comment marker and the delimiter are the same byte.
    CommentIsDelimiter(u8),
}

impl fmt::Display for OptionsFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delimiter(byte) => write!(f, "invalid delimiter {:?}", char::from(*byte)),
            Self::Comment(byte) => write!(f, "invalid comment marker {:?}", char::from(*byte)),
            Self::CommentIsDelimiter(byte) => write!(
                f,
                "comment marker {:?} is also the delimiter",
                char::from(*byte)
            ),
        }
    }
}

/// Error produced by [`crate::load`] and [`crate::load_rows`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LoadError {
    /// The lexical options cannot describe a CSV dialect.
    #[error("invalid CSV options: {fault}")]
    InvalidOptions {
        /// Which option is at fault.
        fault: OptionsFault,
    },
    /// The input held no record to use as the header.
    #[error("CSV input has no header record")]
    NoHeader,
    /// The input broke the CSV quoting rules.
    #[error("malformed CSV on line {line}: {fault}")]
    Malformed {
        /// 1-based line where the fault was detected.
        line: u64,
        /// Kind of quoting fault.
        fault: QuoteFault,
    },
    /// A record's field count differed from the header under the strict
    /// ragged-record policy.
    #[error("record on line {line} has {found} fields but the header has {expected}")]
    FieldCount {
        /// 1-based line where the record starts.
        line: u64,
        /// Number of header columns.
        expected: usize,
        /// Number of fields in the offending record.
        found: usize,
    },
    /// The CSV reader rejected the input, for example on invalid UTF-8.
    #[error("failed to decode CSV input: {source}")]
    Decode {
        /// Error raised by the `csv` reader.
        #[source]
        source: csv::Error,
    },
    /// Reading the underlying stream failed.
    #[error("failed to read CSV input: {source}")]
    Io {
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

define_error_codes! {
    /// Stable codes describing [`LoadError`] variants.
    enum LoadErrorCode for LoadError {
        /// The lexical options were rejected.
        InvalidOptions => InvalidOptions { .. } => "LOAD_INVALID_OPTIONS",
        /// The input held no header record.
        NoHeader => NoHeader => "LOAD_NO_HEADER",
        /// The input broke the CSV quoting rules.
        Malformed => Malformed { .. } => "LOAD_MALFORMED",
        /// A record's field count differed from the header.
        FieldCount => FieldCount { .. } => "LOAD_FIELD_COUNT",
        /// The CSV reader rejected the input.
        Decode => Decode { .. } => "LOAD_DECODE",
        /// Reading the underlying stream failed.
        Io => Io { .. } => "LOAD_IO",
    }
}

impl From<csv::Error> for LoadError {
    fn from(source: csv::Error) -> Self {
        if source.is_io_error() {
            if let csv::ErrorKind::Io(inner) = source.into_kind() {
                return Self::Io { source: inner };
            }
            return Self::Io {
                source: io::Error::other("CSV reader reported an I/O failure"),
            };
        }
        Self::Decode { source }
    }
}

/// Error produced while compiling or rendering a template.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RenderError {
    /// The template source failed to parse.
    #[error("template `{template}` has a syntax error: {source}")]
    Syntax {
        /// Name of the template being compiled.
        template: String,
        /// Error raised by the template engine.
        #[source]
        source: minijinja::Error,
    },
    /// Evaluating the template failed.
    #[error("template `{template}` failed to render: {source}")]
    Execution {
        /// Name of the template being rendered.
        template: String,
        /// Error raised by the template engine.
        #[source]
        source: minijinja::Error,
    },
    /// The destination writer failed mid-render.
    #[error("failed to write output of template `{template}`: {source}")]
    Write {
        /// Name of the template being rendered.
        template: String,
        /// Error raised by the template engine while writing.
        #[source]
        source: minijinja::Error,
    },
}

define_error_codes! {
    /// Stable codes describing [`RenderError`] variants.
    enum RenderErrorCode for RenderError {
        /// The template source failed to parse.
        Syntax => Syntax { .. } => "RENDER_SYNTAX",
        /// Evaluating the template failed.
        Execution => Execution { .. } => "RENDER_EXECUTION",
        /// The destination writer failed mid-render.
        Write => Write { .. } => "RENDER_WRITE",
    }
}

impl RenderError {
    pub(crate) fn compile(template: &str, source: minijinja::Error) -> Self {
        Self::Syntax {
            template: template.to_owned(),
            source,
        }
    }

    pub(crate) fn render(template: &str, source: minijinja::Error) -> Self {
        let template = template.to_owned();
        match source.kind() {
            ErrorKind::WriteFailure => Self::Write { template, source },
            _ => Self::Execution { template, source },
        }
    }
}
