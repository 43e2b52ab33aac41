//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for humans, compact text for scripts, or stable
//! JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. `output` in the user config file
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use clap::ValueEnum;
use kin_core::{KinError, Person, Tree};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, visual framing).
    Pretty,
    /// Token-efficient plain text for scripts and pipes.
    Text,
    /// Machine-readable JSON (one object per result, or a JSON array).
    Json,
}

impl OutputMode {
    fn parse_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "text" | "table" => Some(Self::Text),
            "pretty" | "human" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    user_output: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    // Unknown values fall through to the next source.
    if let Some(mode) = format_env.and_then(OutputMode::parse_loose) {
        return mode;
    }

    if let Some(mode) = user_output.and_then(OutputMode::parse_loose) {
        return mode;
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, user config, and TTY
/// defaults.
pub fn resolve_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    user_output: Option<&str>,
) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(
        format_flag,
        json_flag,
        env_val.as_deref(),
        user_output,
        is_tty,
    )
}

/// Trait implemented by any CLI result type that can be rendered in all modes.
pub trait Renderable {
    /// Render for human consumption.
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as a self-contained JSON object.
    fn render_json(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as a single text row, columns in [`Renderable::table_headers`] order.
    fn render_table(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Column headers for text mode.
    fn table_headers() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }
}

/// Render a single [`Renderable`] item to stdout using the given output mode.
pub fn render_item<R: Renderable>(item: &R, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Pretty => item.render_human(&mut out),
        OutputMode::Text => item.render_table(&mut out),
        OutputMode::Json => {
            item.render_json(&mut out)?;
            writeln!(out)
        }
    }
}

/// Render a list of [`Renderable`] items to stdout.
///
/// In JSON mode the items are wrapped in an array; otherwise they are
/// written one after another, with a header row in text mode.
pub fn render_list<R: Renderable>(items: &[R], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_list(&mut out, items, mode)
}

fn write_list<R: Renderable>(out: &mut dyn Write, items: &[R], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Pretty => {
            if items.is_empty() {
                writeln!(out, "(none)")?;
            }
            for item in items {
                item.render_human(out)?;
            }
        }
        OutputMode::Text => {
            let headers = if items.is_empty() {
                &[] as &[&str]
            } else {
                R::table_headers()
            };
            if !headers.is_empty() {
                writeln!(out, "{}", headers.join("  "))?;
            }
            for item in items {
                item.render_table(out)?;
            }
        }
        OutputMode::Json => {
            write!(out, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(out, ",")?;
                }
                writeln!(out)?;
                let mut buf = Vec::new();
                item.render_json(&mut buf)?;
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                out.write_all(&buf)?;
            }
            writeln!(out, "\n]")?;
        }
    }
    Ok(())
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E1001").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create an error with a suggestion and error code.
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }
}

impl From<&KinError> for CliError {
    fn from(err: &KinError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: Some(err.suggestion()),
            error_code: Some(err.code().code().to_string()),
        }
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(&mut out, mode, error)
}

fn write_error(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match error.error_code.as_deref() {
                Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render a success message to stdout.
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "ok": true,
                "message": message,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            writeln!(out, "✓ {message}")?;
        }
    }
    Ok(())
}

pub fn sex_label(is_male: bool) -> &'static str {
    if is_male { "male" } else { "female" }
}

/// `1815-12-10 – 1852-11-27`, with `?` for unknown dates.
pub fn life_span(person: &Person) -> String {
    let fmt = |date: Option<chrono::NaiveDate>| date.map_or_else(|| "?".to_string(), |d| d.to_string());
    if person.death_date.is_some() {
        format!("{} – {}", fmt(person.birth_date), fmt(person.death_date))
    } else {
        format!("b. {}", fmt(person.birth_date))
    }
}

fn write_json<T: Serialize>(w: &mut dyn Write, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *w, value).map_err(io::Error::other)
}

impl Renderable for Tree {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &format!("#{} {}", self.id, self.name))?;
        pretty_kv(w, "Owner", &self.owner)?;
        pretty_kv(w, "Created", self.created_at.format("%Y-%m-%d %H:%M").to_string())?;
        pretty_kv(w, "Updated", self.updated_at.format("%Y-%m-%d %H:%M").to_string())?;
        writeln!(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}  {}  {}", self.id, self.owner, self.name)
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "OWNER", "NAME"]
    }
}

impl Renderable for Person {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "#{:<6} {:<32} {:<7} {}",
            self.id,
            self.full_name(),
            sex_label(self.is_male),
            life_span(self)
        )
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let date = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}",
            self.id,
            self.first_name,
            self.last_name,
            sex_label(self.is_male),
            date(self.birth_date),
            date(self.death_date)
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "FIRST", "LAST", "SEX", "BORN", "DIED"]
    }
}
