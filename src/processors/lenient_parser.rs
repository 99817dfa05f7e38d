use crate::models::{
    Diagnostic, DiagnosticKind, DiagnosticSink, Flag, ObservationRecord, TimeSeries, Variable,
};
use crate::utils::constants::{DEFAULT_HEADER_LINES, DEFAULT_TEXT_DATE_FORMAT, DEFAULT_TEXT_SEPARATOR};
use crate::utils::parsing::parse_number;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Separator {
    /// Runs of whitespace, as in fixed-width exports.
    Whitespace,
    Char(char),
}

impl Separator {
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Separator::Whitespace => line.split_whitespace().collect(),
            Separator::Char(c) => line.trim_end().split(*c).map(str::trim).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextColumn {
    Date,
    Time,
    Value,
    /// Release or status qualifier, kept verbatim as the flag.
    Qualifier,
    Skip,
}

/// Which parsed values make a line faulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRule {
    NonNegative,
    Any,
}

impl ValueRule {
    pub fn accepts(&self, value: f64) -> bool {
        match self {
            ValueRule::NonNegative => value >= 0.0,
            ValueRule::Any => true,
        }
    }
}

/// Column layout of a separated or fixed-width text export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSchema {
    pub separator: Separator,
    pub columns: Vec<TextColumn>,
    /// Index into `columns` of the field that some files leave out.
    pub optional_column: Option<usize>,
    pub date_format: String,
    /// Lines the caller strips before handing over the data region.
    pub header_lines: usize,
    pub value_rule: ValueRule,
}

impl Default for TextSchema {
    fn default() -> Self {
        Self {
            separator: Separator::Char(DEFAULT_TEXT_SEPARATOR),
            columns: vec![TextColumn::Date, TextColumn::Value, TextColumn::Qualifier],
            optional_column: Some(2),
            date_format: DEFAULT_TEXT_DATE_FORMAT.to_string(),
            header_lines: DEFAULT_HEADER_LINES,
            value_rule: ValueRule::NonNegative,
        }
    }
}

impl TextSchema {
    pub fn value_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| *c == TextColumn::Value)
    }

    /// Split a line into fields. A single empty field past the schema
    /// width comes from a trailing separator and is dropped.
    pub fn fields<'a>(&self, line: &'a str) -> Vec<&'a str> {
        let mut fields = self.separator.split(line);
        if fields.len() == self.columns.len() + 1 && fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }
        fields
    }

    /// The schema with the optional column removed, if it names a column.
    pub fn reduced(&self) -> Option<TextSchema> {
        let optional = self.optional_column.filter(|&i| i < self.columns.len())?;
        let mut reduced = self.clone();
        reduced.columns.remove(optional);
        reduced.optional_column = None;
        Some(reduced)
    }

    fn value_index_for(&self, field_count: usize) -> Option<usize> {
        let canonical = self.value_index()?;
        match self.optional_column {
            Some(optional) if field_count + 1 == self.columns.len() && optional < canonical => {
                Some(canonical - 1)
            }
            _ => Some(canonical),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrictError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for StrictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Parse numbered lines with an exact column rule. Blank lines are skipped,
/// anything else that does not fit the schema is an error.
pub fn parse_strict(
    lines: &[(usize, &str)],
    schema: &TextSchema,
) -> std::result::Result<Vec<ObservationRecord>, StrictError> {
    let mut records = Vec::with_capacity(lines.len());

    for &(number, line) in lines {
        if line.trim().is_empty() {
            continue;
        }

        let fields = schema.fields(line);
        if fields.len() != schema.columns.len() {
            return Err(StrictError {
                line: number,
                message: format!(
                    "expected {} fields, found {}",
                    schema.columns.len(),
                    fields.len()
                ),
            });
        }

        let mut date = None;
        let mut value = None;
        let mut flag = None;

        for (column, field) in schema.columns.iter().zip(fields) {
            match column {
                TextColumn::Date => {
                    date = Some(parse_date_field(field, &schema.date_format).ok_or_else(|| {
                        StrictError {
                            line: number,
                            message: format!(
                                "date '{}' does not match format '{}'",
                                field, schema.date_format
                            ),
                        }
                    })?);
                }
                TextColumn::Value => {
                    if !field.is_empty() {
                        value = Some(parse_number(field).ok_or_else(|| StrictError {
                            line: number,
                            message: format!("invalid number '{}'", field),
                        })?);
                    }
                }
                TextColumn::Qualifier => {
                    if !field.is_empty() {
                        flag = Some(Flag::Category(field.to_string()));
                    }
                }
                TextColumn::Time | TextColumn::Skip => {}
            }
        }

        let date = date.ok_or_else(|| StrictError {
            line: number,
            message: "schema has no date column".to_string(),
        })?;
        records.push(ObservationRecord::new(date, value, flag));
    }

    Ok(records)
}

fn parse_date_field(field: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(field, format)
        .or_else(|_| NaiveDateTime::parse_from_str(field, format).map(|dt| dt.date()))
        .ok()
}

/// Salvages text exports that the strict rule rejects.
///
/// Lines whose value fails the schema's [`ValueRule`] are excluded and
/// reported together; a file whose rows lack the optional column is parsed
/// with the reduced schema. If the strict rule still fails the file is
/// abandoned with an empty series.
pub struct LenientParser {
    schema: TextSchema,
    variable: Variable,
}

impl LenientParser {
    pub fn new(schema: TextSchema, variable: Variable) -> Self {
        Self { schema, variable }
    }

    pub fn schema(&self) -> &TextSchema {
        &self.schema
    }

    pub fn parse<S: AsRef<str>>(
        &self,
        lines: &[S],
        station: Option<&str>,
        source: Option<&str>,
    ) -> (TimeSeries, Vec<Diagnostic>) {
        let mut sink = DiagnosticSink::new(station, source);
        let series = self.parse_into(lines, &mut sink);
        (series, sink.into_diagnostics())
    }

    pub fn parse_into<S: AsRef<str>>(&self, lines: &[S], sink: &mut DiagnosticSink) -> TimeSeries {
        let offset = self.schema.header_lines;
        let numbered: Vec<(usize, &str)> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| (i + offset, line.as_ref()))
            .collect();

        let (kept, excluded): (Vec<_>, Vec<_>) =
            numbered.into_iter().partition(|(_, line)| !self.is_faulty(line));

        if !excluded.is_empty() {
            let positions: Vec<usize> = excluded.iter().map(|(n, _)| *n).collect();
            sink.report_lines(
                DiagnosticKind::ParserError,
                format!(
                    "excluded {} lines with invalid values at lines {:?}; review before use",
                    positions.len(),
                    positions
                ),
                positions,
            );
        }

        let schema = self.choose_schema(&kept, sink);

        match parse_strict(&kept, &schema) {
            Ok(records) => TimeSeries::with_records(self.variable, records),
            Err(e) => {
                sink.report(
                    DiagnosticKind::ParserError,
                    format!(
                        "abandoning {} file of station {}: {}",
                        self.variable.code(),
                        sink.station().unwrap_or("<unknown>"),
                        e
                    ),
                );
                TimeSeries::new(self.variable)
            }
        }
    }

    fn is_faulty(&self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        let fields = self.schema.fields(line);
        self.schema
            .value_index_for(fields.len())
            .and_then(|i| fields.get(i))
            .and_then(|field| parse_number(field))
            .is_some_and(|v| !self.schema.value_rule.accepts(v))
    }

    fn choose_schema(&self, lines: &[(usize, &str)], sink: &mut DiagnosticSink) -> TextSchema {
        let first = lines.iter().find(|(_, line)| !line.trim().is_empty());
        let Some((number, line)) = first else {
            return self.schema.clone();
        };

        let found = self.schema.fields(line).len();
        let expected = self.schema.columns.len();
        match self.schema.reduced() {
            Some(reduced) if found + 1 == expected => {
                sink.report_lines(
                    DiagnosticKind::AmbiguousShape,
                    format!(
                        "rows have {} fields, expected {}; assuming the {:?} column is missing",
                        found,
                        expected,
                        self.schema
                            .optional_column
                            .and_then(|i| self.schema.columns.get(i))
                    ),
                    vec![*number],
                );
                reduced
            }
            _ => self.schema.clone(),
        }
    }
}

/// One-shot form of [`LenientParser::parse`].
pub fn parse_lenient<S: AsRef<str>>(
    lines: &[S],
    schema: &TextSchema,
    variable: Variable,
    station: Option<&str>,
) -> (TimeSeries, Vec<Diagnostic>) {
    LenientParser::new(schema.clone(), variable).parse(lines, station, None)
}
