use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    FormatError,
    ParserError,
    ValueError,
    MissingIdentifier,
    AmbiguousShape,
}

impl DiagnosticKind {
    pub fn tag(&self) -> &'static str {
        match self {
            DiagnosticKind::FormatError => "format_error",
            DiagnosticKind::ParserError => "parser_error",
            DiagnosticKind::ValueError => "value_error",
            DiagnosticKind::MissingIdentifier => "missing_identifier",
            DiagnosticKind::AmbiguousShape => "ambiguous_shape",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A recoverable anomaly found while parsing one station's source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub station: Option<String>,
    pub source: Option<String>,
    pub kind: DiagnosticKind,
    pub detail: String,
    /// Original-file line numbers this diagnostic refers to, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<usize>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        Self {
            station: None,
            source: None,
            kind,
            detail: detail.into(),
            lines: Vec::new(),
        }
    }

    pub fn with_station(mut self, station: Option<&str>) -> Self {
        self.station = station.map(str::to_string);
        self
    }

    pub fn with_source(mut self, source: Option<&str>) -> Self {
        self.source = source.map(str::to_string);
        self
    }

    pub fn with_lines(mut self, lines: Vec<usize>) -> Self {
        self.lines = lines;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(station) = &self.station {
            write!(f, " station {}", station)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        write!(f, ": {}", self.detail)
    }
}

/// Who a batch of diagnostics is about. Every diagnostic pushed through
/// [`DiagnosticSink::report`] is stamped with this context and logged.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    station: Option<String>,
    source: Option<String>,
    collected: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new(station: Option<&str>, source: Option<&str>) -> Self {
        Self {
            station: station.map(str::to_string),
            source: source.map(str::to_string),
            collected: Vec::new(),
        }
    }

    pub fn set_station(&mut self, station: Option<&str>) {
        self.station = station.map(str::to_string);
    }

    pub fn station(&self) -> Option<&str> {
        self.station.as_deref()
    }

    pub fn report(&mut self, kind: DiagnosticKind, detail: impl Into<String>) {
        self.push(Diagnostic::new(kind, detail));
    }

    pub fn report_lines(&mut self, kind: DiagnosticKind, detail: impl Into<String>, lines: Vec<usize>) {
        self.push(Diagnostic::new(kind, detail).with_lines(lines));
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        let diagnostic = diagnostic
            .with_station(self.station.as_deref())
            .with_source(self.source.as_deref());
        tracing::warn!(
            kind = diagnostic.kind.tag(),
            station = diagnostic.station.as_deref().unwrap_or("-"),
            source = diagnostic.source.as_deref().unwrap_or("-"),
            "{}",
            diagnostic.detail
        );
        self.collected.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.collected
    }
}
