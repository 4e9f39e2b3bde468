//! Severity-tagged, location-aware diagnostics collection (spec.md §4.10).
//!
//! This is the pipeline's logging-equivalent: every stage reports through
//! a `&mut dyn DiagnosticSink` rather than a singleton, so ownership stays
//! explicit (spec.md §9 "Global mutable state").

use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::Mutex;

use serde::Serialize;

use crate::error;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, never blocks.
    Note,
    /// Recoverable; the offending element is skipped and generation continues.
    Warning,
    /// Fatal; raised as a failure that unwinds the pipeline.
    Error,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Where a diagnostic originated, when known.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub file: String,
    pub line: Option<u32>,
}

/// A single diagnostic message.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Free-form key/value context (e.g. `{"feature": "...", "foundIn": "..."}`).
    pub context: BTreeMap<String, String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            location: None,
            context: BTreeMap::new(),
        }
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Severity::Note, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    #[must_use]
    pub fn with_location(mut self, file: impl Into<String>, line: Option<u32>) -> Self {
        self.location = Some(Location {
            file: file.into(),
            line,
        });
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Render in the stream-sink format: `<file>:<line>: <severity>: <message> [context: k=v, ...]`.
    pub fn format_line(&self) -> String {
        let location = match &self.location {
            Some(loc) => format!("{}:{}: ", loc.file, loc.line.map_or_else(|| "?".to_string(), |l| l.to_string())),
            None => String::new(),
        };
        let context = if self.context.is_empty() {
            String::new()
        } else {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            format!(" [context: {}]", pairs.join(", "))
        };
        format!(
            "{location}{}: {}{context}",
            self.severity.as_str(),
            self.message
        )
    }
}

/// Behavior every diagnostics sink implements: accept a message, and
/// finalize (flush/close) at the end of a run.
pub trait DiagnosticSink {
    /// Record a diagnostic. Returns an error only for the throwing sink
    /// wrapping an `error`-severity diagnostic.
    fn emit(&mut self, diagnostic: Diagnostic) -> error::Result<()>;

    /// Flush/close the sink. Idempotent: calling twice with no intervening
    /// `emit` produces identical output (spec.md §8).
    fn finalize(&mut self) -> error::Result<()> {
        Ok(())
    }
}

/// Writes each diagnostic line to standard error as it arrives.
#[derive(Debug, Default)]
pub struct StreamSink {
    /// Captured lines, for tests and for callers embedding this sink in a
    /// larger UI instead of real stderr.
    lines: Vec<String>,
    to_stderr: bool,
}

impl StreamSink {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            to_stderr: true,
        }
    }

    /// A sink that records lines without writing to stderr, for tests.
    pub fn silent() -> Self {
        Self {
            lines: Vec::new(),
            to_stderr: false,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl DiagnosticSink for StreamSink {
    fn emit(&mut self, diagnostic: Diagnostic) -> error::Result<()> {
        let line = diagnostic.format_line();
        if self.to_stderr {
            let _ = writeln!(std::io::stderr(), "{line}");
        }
        self.lines.push(line);
        Ok(())
    }
}

/// Accumulates diagnostics under a lock (spec.md §5: "protected by a mutex
/// ... since it may be written from any translator call") and, on
/// `finalize`, writes a structured YAML file with `uniqueMessages`
/// (sorted, deduplicated) and `diagnostics` (sorted) top-level keys.
#[derive(Debug)]
pub struct FileSink {
    path: std::path::PathBuf,
    buffer: Mutex<Vec<Diagnostic>>,
}

#[derive(Serialize)]
struct FileSinkDocument<'a> {
    #[serde(rename = "uniqueMessages")]
    unique_messages: Vec<&'a str>,
    diagnostics: Vec<&'a Diagnostic>,
}

impl FileSink {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// Render the current buffer to the sorted YAML shape, without
    /// touching disk. Exposed for tests.
    pub fn render(&self) -> error::Result<String> {
        let buffer = self.buffer.lock().expect("diagnostics lock poisoned");
        let mut sorted: Vec<&Diagnostic> = buffer.iter().collect();
        sorted.sort_by(|a, b| a.message.cmp(&b.message));

        let mut unique: Vec<&str> = buffer.iter().map(|d| d.message.as_str()).collect();
        unique.sort_unstable();
        unique.dedup();

        let doc = FileSinkDocument {
            unique_messages: unique,
            diagnostics: sorted,
        };
        serde_yaml_ng::to_string(&doc).map_err(error::Error::Parse)
    }
}

impl DiagnosticSink for FileSink {
    fn emit(&mut self, diagnostic: Diagnostic) -> error::Result<()> {
        self.buffer
            .lock()
            .expect("diagnostics lock poisoned")
            .push(diagnostic);
        Ok(())
    }

    fn finalize(&mut self) -> error::Result<()> {
        let rendered = self.render()?;
        std::fs::write(&self.path, rendered).map_err(|e| {
            error::Error::Diagnostic(format!(
                "failed to write diagnostics file {}: {e}",
                self.path.display()
            ))
        })
    }
}

/// Wraps an upstream sink; forwards every diagnostic, and additionally
/// raises `error`-severity diagnostics as a failure, halting the pipeline.
///
/// This is the default policy (spec.md §4.10): "any recoverable issue is a
/// warning that does not interrupt generation."
pub struct ThrowingSink<S: DiagnosticSink> {
    upstream: S,
}

impl<S: DiagnosticSink> ThrowingSink<S> {
    pub fn new(upstream: S) -> Self {
        Self { upstream }
    }

    pub fn into_inner(self) -> S {
        self.upstream
    }
}

impl<S: DiagnosticSink> DiagnosticSink for ThrowingSink<S> {
    fn emit(&mut self, diagnostic: Diagnostic) -> error::Result<()> {
        if diagnostic.severity == Severity::Error {
            let message = diagnostic.format_line();
            self.upstream.emit(diagnostic)?;
            return Err(error::Error::Diagnostic(message));
        }
        self.upstream.emit(diagnostic)
    }

    fn finalize(&mut self) -> error::Result<()> {
        self.upstream.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_sink_format_line_with_location_and_context() {
        let diag = Diagnostic::warning("Feature \"Schema type 'not'\" is not supported, skipping")
            .with_location("spec.yaml", Some(42))
            .with_context("foundIn", "#/components/schemas/X");
        let line = diag.format_line();
        assert_eq!(
            line,
            "spec.yaml:42: warning: Feature \"Schema type 'not'\" is not supported, skipping [context: foundIn=#/components/schemas/X]"
        );
    }

    #[test]
    fn stream_sink_format_line_without_location() {
        let diag = Diagnostic::note("default values are not evaluated");
        assert_eq!(diag.format_line(), "note: default values are not evaluated");
    }

    #[test]
    fn throwing_sink_passes_warnings_through() {
        let mut sink = ThrowingSink::new(StreamSink::silent());
        assert!(sink.emit(Diagnostic::warning("skip me")).is_ok());
        assert_eq!(sink.into_inner().lines().len(), 1);
    }

    #[test]
    fn throwing_sink_raises_on_error_severity() {
        let mut sink = ThrowingSink::new(StreamSink::silent());
        let result = sink.emit(Diagnostic::error("fatal problem"));
        assert!(result.is_err());
    }

    #[test]
    fn file_sink_dedupes_and_sorts_unique_messages() {
        let mut sink = FileSink::new("/dev/null");
        sink.emit(Diagnostic::warning("b problem")).unwrap();
        sink.emit(Diagnostic::warning("a problem")).unwrap();
        sink.emit(Diagnostic::warning("a problem")).unwrap();

        let rendered = sink.render().unwrap();
        let parsed: serde_yaml_ng::Value = serde_yaml_ng::from_str(&rendered).unwrap();
        let unique = parsed["uniqueMessages"].as_sequence().unwrap();
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].as_str().unwrap(), "a problem");
        assert_eq!(unique[1].as_str().unwrap(), "b problem");

        let diagnostics = parsed["diagnostics"].as_sequence().unwrap();
        assert_eq!(diagnostics.len(), 3, "diagnostics keeps every occurrence");
    }

    #[test]
    fn file_sink_render_is_idempotent() {
        let mut sink = FileSink::new("/dev/null");
        sink.emit(Diagnostic::note("hello")).unwrap();
        let first = sink.render().unwrap();
        let second = sink.render().unwrap();
        assert_eq!(first, second);
    }
}
