pub mod csv_reader;
pub mod decoding;
pub mod excel_reader;
pub mod text_reader;

pub use csv_reader::CsvGridReader;
pub use decoding::decode;
pub use excel_reader::{ExcelGridReader, SheetGrid};
pub use text_reader::{station_from_name, TextExportReader};

use crate::config::ParserConfig;
use crate::error::{ProcessingError, Result};
use crate::models::CellGrid;
use std::path::Path;

/// A grid together with where it came from (`file` or `file#sheet`).
#[derive(Debug, Clone)]
pub struct NamedGrid {
    pub source: String,
    pub grid: CellGrid,
}

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
const DELIMITED_EXTENSIONS: [&str; 2] = ["csv", "txt"];

pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| {
        WORKBOOK_EXTENSIONS.contains(&ext.as_str()) || DELIMITED_EXTENSIONS.contains(&ext.as_str())
    })
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Read every station grid in a file: one per sheet for workbooks, one for
/// delimited text.
pub fn read_grids(path: &Path, config: &ParserConfig) -> Result<Vec<NamedGrid>> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    match extension(path).as_deref() {
        Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext) => {
            let sheets = ExcelGridReader::new()
                .with_skip_sheets(config.skip_sheets.clone())
                .read_all(path)?;
            Ok(sheets
                .into_iter()
                .map(|sheet| NamedGrid {
                    source: format!("{}#{}", file_name, sheet.name),
                    grid: sheet.grid,
                })
                .collect())
        }
        Some(ext) if DELIMITED_EXTENSIONS.contains(&ext) => {
            let grid = CsvGridReader::new()
                .with_delimiter(config.csv_delimiter)?
                .with_encoding(&config.encoding)
                .read_grid(path)?;
            Ok(vec![NamedGrid {
                source: file_name,
                grid,
            }])
        }
        _ => Err(ProcessingError::InvalidFormat(format!(
            "unsupported input file: {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported(&PathBuf::from("a/Kaub.XLSX")));
        assert!(is_supported(&PathBuf::from("24700200.csv")));
        assert!(!is_supported(&PathBuf::from("notes.pdf")));
        assert!(!is_supported(&PathBuf::from("README")));
    }

    #[test]
    fn test_unsupported_file_is_an_error() {
        let result = read_grids(&PathBuf::from("notes.pdf"), &ParserConfig::default());
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }
}
