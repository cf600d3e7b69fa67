//! Core library for smallplate.
//!
//! Loads CSV input into ordered [`Row`] values, groups consecutive rows by a
//! column, and renders templates over the rows with a fixed set of helper
//! functions.

mod error;
mod escape;
mod group;
mod helpers;
mod loader;
mod quotes;
mod render;
mod row;

pub use crate::{
    error::{LoadError, LoadErrorCode, OptionsFault, QuoteFault, RenderError, RenderErrorCode},
    escape::escape_html,
    group::{Group, group_consecutive, group_runs},
    helpers::{HelperTable, parse_int_or_zero},
    loader::{LoaderOptions, QuotePolicy, RaggedPolicy, load, load_rows},
    render::{CompiledTemplate, EscapeMode, RenderOptions, Renderer},
    row::Row,
};
