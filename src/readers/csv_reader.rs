use crate::error::{ProcessingError, Result};
use crate::models::{Cell, CellGrid};
use crate::readers::decoding::decode;
use crate::utils::constants::{DEFAULT_CSV_DELIMITER, DEFAULT_ENCODING};
use std::path::Path;

/// Reads delimited exports into a [`CellGrid`] without assuming a header.
/// All cells come back as text; typing happens in the parser.
pub struct CsvGridReader {
    delimiter: u8,
    encoding: String,
}

impl CsvGridReader {
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_CSV_DELIMITER as u8,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Result<Self> {
        if !delimiter.is_ascii() {
            return Err(ProcessingError::Config(format!(
                "CSV delimiter must be ASCII, got '{}'",
                delimiter
            )));
        }
        self.delimiter = delimiter as u8;
        Ok(self)
    }

    pub fn with_encoding(mut self, encoding: &str) -> Self {
        self.encoding = encoding.to_string();
        self
    }

    pub fn read_grid(&self, path: &Path) -> Result<CellGrid> {
        let bytes = std::fs::read(path)?;
        self.parse_bytes(&bytes)
    }

    /// Blank lines are kept as empty rows; they separate blocks. A quoted
    /// field may span lines, the record then fills a single row.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<CellGrid> {
        let text = decode(bytes, &self.encoding)?;
        let mut rows = Vec::new();
        let mut pending = String::new();

        for line in text.lines() {
            if pending.is_empty() && line.trim().is_empty() {
                rows.push(Vec::new());
                continue;
            }
            if !pending.is_empty() {
                pending.push('\n');
            }
            pending.push_str(line);
            if open_quote(&pending, self.delimiter) {
                continue;
            }
            rows.push(self.parse_line(&pending)?);
            pending.clear();
        }
        if !pending.is_empty() {
            tracing::debug!("unterminated quoted field at end of input");
            rows.push(self.parse_line(&pending)?);
        }

        Ok(CellGrid::new(rows))
    }

    fn parse_line(&self, line: &str) -> Result<Vec<Cell>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(line.as_bytes());

        let mut record = csv::StringRecord::new();
        reader.read_record(&mut record)?;
        Ok(record.iter().map(|field| Cell::from(field.trim())).collect())
    }
}

/// True while a quoted field is still open. As in the csv parser, a quote
/// only opens a field at its start; elsewhere it is a literal character.
fn open_quote(record: &str, delimiter: u8) -> bool {
    let mut quoted = false;
    let mut field_start = true;
    let mut bytes = record.bytes().peekable();

    while let Some(b) = bytes.next() {
        if quoted {
            if b == b'"' {
                if bytes.peek() == Some(&b'"') {
                    bytes.next();
                } else {
                    quoted = false;
                }
            }
            continue;
        }
        match b {
            b'"' if field_start => quoted = true,
            b'\n' => field_start = true,
            _ => field_start = b == delimiter,
        }
    }
    quoted
}

impl Default for CsvGridReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_ragged_semicolon_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "Messstellennummer;24700200")?;
        writeln!(file, ";")?;
        writeln!(file, "Datum;Wert;Status")?;
        writeln!(file, "01.01.2020;1,5;geprüft")?;

        let grid = CsvGridReader::new().read_grid(file.path())?;

        assert_eq!(grid.row_count(), 4);
        assert!(grid.is_row_empty(1));
        assert_eq!(grid.get(0, 1), &Cell::text("24700200"));
        assert_eq!(grid.get(3, 2), &Cell::text("geprüft"));
        assert_eq!(grid.get(0, 2), &Cell::Empty);
        Ok(())
    }

    #[test]
    fn test_comma_delimiter() -> Result<()> {
        let reader = CsvGridReader::new().with_delimiter(',')?;
        let grid = reader.parse_bytes(b"a, b\n\n\"c,1\",d,e\n")?;

        assert_eq!(grid.row_count(), 3);
        assert!(grid.is_row_empty(1));
        assert_eq!(grid.get(0, 1), &Cell::text("b"));
        assert_eq!(grid.get(2, 0), &Cell::text("c,1"));
        assert_eq!(grid.width(), 3);
        Ok(())
    }

    #[test]
    fn test_quoted_newline_stays_in_one_row() -> Result<()> {
        let text = "Name;\"Kaub\nRhein\"\n\nDatum;Wert\n01.01.2020;\"1,5\"\n";
        let grid = CsvGridReader::new().parse_bytes(text.as_bytes())?;

        assert_eq!(grid.row_count(), 4);
        assert_eq!(grid.get(0, 1), &Cell::text("Kaub\nRhein"));
        assert!(grid.is_row_empty(1));
        assert_eq!(grid.get(2, 0), &Cell::text("Datum"));
        assert_eq!(grid.get(3, 1), &Cell::text("1,5"));
        Ok(())
    }

    #[test]
    fn test_blank_line_inside_quotes_is_not_a_separator() -> Result<()> {
        let grid = CsvGridReader::new().parse_bytes(b"Hinweis;\"a\n\nb\"\nID;1\n")?;

        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.get(0, 1), &Cell::text("a\n\nb"));
        assert_eq!(grid.get(1, 1), &Cell::text("1"));
        Ok(())
    }

    #[test]
    fn test_inner_quote_is_literal() -> Result<()> {
        let grid = CsvGridReader::new().parse_bytes(b"Pegel;12\" Rohr\nID;1\n")?;

        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.get(0, 1), &Cell::text("12\" Rohr"));
        assert_eq!(grid.get(1, 1), &Cell::text("1"));
        Ok(())
    }

    #[test]
    fn test_non_ascii_delimiter_is_rejected() {
        assert!(CsvGridReader::new().with_delimiter('§').is_err());
    }
}
