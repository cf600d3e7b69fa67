//! Template compilation and rendering over loaded rows.
//!
//! Templates use Jinja syntax through `minijinja`. The loaded rows are bound
//! to the `rows` variable and the helpers from [`HelperTable`] are installed
//! as global functions.

use std::io::Write;

use minijinja::{AutoEscape, Environment, context};
use tracing::{debug, instrument};

use crate::error::RenderError;
use crate::escape::html_formatter;
use crate::helpers::HelperTable;
use crate::row::Row;

/// Escaping applied to values interpolated into the output.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EscapeMode {
    /// Escape markup characters unless a value is marked safe.
    #[default]
    Html,
    /// Emit every value verbatim.
    None,
}

/// Configuration handed to a [`Renderer`].
///
/// The default is [`RenderOptions::standard`].
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Helper functions available to templates.
    pub helpers: HelperTable,
    /// Escaping applied to interpolated values.
    pub escape: EscapeMode,
}

impl RenderOptions {
    /// Options with the standard helpers and HTML escaping.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            helpers: HelperTable::standard(),
            escape: EscapeMode::Html,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Compiles templates with a fixed helper table and escaping mode.
///
/// # Examples
/// ```
/// use smallplate_core::{Renderer, RenderOptions, load_rows};
///
/// let rows = load_rows("name\nJames Bond\n".as_bytes())?;
/// let renderer = Renderer::new(RenderOptions::standard());
/// let mut out = Vec::new();
/// renderer.render(
///     "greeting",
///     "{% for row in rows %}Hello {{ row.name }}{% endfor %}",
///     &rows,
///     &mut out,
/// )?;
/// assert_eq!(out, b"Hello James Bond");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    /// Creates a renderer from `options`.
    #[must_use]
    pub const fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Returns the renderer's configuration.
    #[must_use]
    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Parses `source` under `name` and returns a template ready to render.
    ///
    /// # Errors
    /// Returns [`RenderError::Syntax`] when `source` does not parse.
    #[instrument(name = "core.compile", level = "debug", skip(self, source), err)]
    pub fn compile<'s>(
        &self,
        name: &'s str,
        source: &'s str,
    ) -> Result<CompiledTemplate<'s>, RenderError> {
        let mut env = Environment::new();
        let escape = match self.options.escape {
            EscapeMode::Html => AutoEscape::Html,
            EscapeMode::None => AutoEscape::None,
        };
        env.set_auto_escape_callback(move |_| escape.clone());
        env.set_formatter(html_formatter);
        self.options.helpers.install(&mut env);
        env.add_template(name, source)
            .map_err(|source| RenderError::compile(name, source))?;
        debug!(template = name, "compiled template");
        Ok(CompiledTemplate { env, name })
    }

    /// Compiles `source` and streams its rendering over `rows` to `writer`.
    ///
    /// # Errors
    /// Returns [`RenderError`] when compilation, evaluation or writing fails.
    pub fn render<W: Write>(
        &self,
        name: &str,
        source: &str,
        rows: &[Row],
        writer: W,
    ) -> Result<(), RenderError> {
        self.compile(name, source)?.render_to(rows, writer)
    }
}

/// A parsed template bound to its environment.
#[derive(Debug)]
pub struct CompiledTemplate<'s> {
    env: Environment<'s>,
    name: &'s str,
}

impl CompiledTemplate<'_> {
    /// Returns the template name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name
    }

    /// Renders over `rows`, streaming output to `writer` as it is produced.
    ///
    /// Output written before a failure is not retracted.
    ///
    /// # Errors
    /// Returns [`RenderError::Execution`] when evaluation fails and
    /// [`RenderError::Write`] when `writer` fails.
    #[instrument(
        name = "core.render",
        level = "debug",
        skip_all,
        fields(template = self.name, rows = rows.len()),
        err,
    )]
    pub fn render_to<W: Write>(&self, rows: &[Row], writer: W) -> Result<(), RenderError> {
        let template = self
            .env
            .get_template(self.name)
            .map_err(|source| RenderError::render(self.name, source))?;
        template
            .render_to_write(context! { rows => rows }, writer)
            .map_err(|source| RenderError::render(self.name, source))?;
        Ok(())
    }

    /// Renders over `rows` into a string.
    ///
    /// # Errors
    /// Returns [`RenderError::Execution`] when evaluation fails.
    pub fn render_to_string(&self, rows: &[Row]) -> Result<String, RenderError> {
        let template = self
            .env
            .get_template(self.name)
            .map_err(|source| RenderError::render(self.name, source))?;
        template
            .render(context! { rows => rows })
            .map_err(|source| RenderError::render(self.name, source))
    }
}
