//! Strict quote validation for CSV input.
//!
//! The `csv` reader accepts sloppy quoting and silently reads an
//! unterminated quoted field to the end of the input. This pass walks the raw
//! bytes once and rejects input that breaks RFC 4180 quoting, reporting the
//! line of the fault.

use crate::error::{LoadError, QuoteFault};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    LineStart,
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
    Comment,
}

/// Checks `input` against strict CSV quoting rules.
///
/// A comment marker only counts at the start of a line, matching the reader.
pub(crate) fn validate_quotes(
    input: &[u8],
    delimiter: u8,
    comment: Option<u8>,
) -> Result<(), LoadError> {
    let bytes = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    let mut state = State::LineStart;
    let mut line: u64 = 1;
    let mut quote_line: u64 = 1;

    for &byte in bytes {
        state = match state {
            State::Comment => match byte {
                b'\n' => State::LineStart,
                _ => State::Comment,
            },
            State::LineStart if comment == Some(byte) => State::Comment,
            State::LineStart | State::FieldStart => match byte {
                b'"' => {
                    quote_line = line;
                    State::Quoted
                }
                b'\n' => State::LineStart,
                b if b == delimiter => State::FieldStart,
                _ => State::Unquoted,
            },
            State::Unquoted => match byte {
                b'"' => return Err(malformed(line, QuoteFault::BareQuote)),
                b'\n' => State::LineStart,
                b if b == delimiter => State::FieldStart,
                _ => State::Unquoted,
            },
            State::Quoted => match byte {
                b'"' => State::QuoteInQuoted,
                _ => State::Quoted,
            },
            State::QuoteInQuoted => match byte {
                b'"' => State::Quoted,
                b'\n' => State::LineStart,
                b'\r' => State::QuoteInQuoted,
                b if b == delimiter => State::FieldStart,
                _ => return Err(malformed(line, QuoteFault::ExtraneousQuote)),
            },
        };
        if byte == b'\n' {
            line += 1;
        }
    }

    if state == State::Quoted {
        return Err(malformed(quote_line, QuoteFault::Unterminated));
    }
    Ok(())
}

const fn malformed(line: u64, fault: QuoteFault) -> LoadError {
    LoadError::Malformed { line, fault }
}
