use crate::error::Result;
use crate::models::{Cell, CellGrid};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::Path;

/// One worksheet of a workbook.
#[derive(Debug, Clone)]
pub struct SheetGrid {
    pub name: String,
    pub grid: CellGrid,
}

/// Reads Excel and OpenDocument workbooks into grids, one per sheet.
pub struct ExcelGridReader {
    skip_sheets: Vec<String>,
}

impl ExcelGridReader {
    pub fn new() -> Self {
        Self {
            skip_sheets: Vec::new(),
        }
    }

    /// Ignore sheets with these names (legend or overview sheets).
    pub fn with_skip_sheets(mut self, names: Vec<String>) -> Self {
        self.skip_sheets = names;
        self
    }

    pub fn read_all(&self, path: &Path) -> Result<Vec<SheetGrid>> {
        let mut workbook = open_workbook_auto(path)?;
        let mut sheets = Vec::new();

        for name in workbook.sheet_names() {
            if self.skip_sheets.iter().any(|s| s.trim() == name.trim()) {
                tracing::debug!(sheet = %name, "skipping sheet");
                continue;
            }
            let range = workbook.worksheet_range(&name)?;
            sheets.push(SheetGrid {
                name,
                grid: range_to_grid(&range),
            });
        }

        Ok(sheets)
    }
}

impl Default for ExcelGridReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a worksheet range, restoring the leading empty rows and columns
/// calamine trims so that row numbers match the sheet.
pub fn range_to_grid(range: &Range<Data>) -> CellGrid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(data_to_cell));
        rows.push(cells);
    }

    CellGrid::new(rows)
}

pub fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from(s.trim()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => datetime_cell(ndt),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => iso_cell(s),
        Data::Error(e) => {
            tracing::debug!(error = ?e, "spreadsheet error cell read as empty");
            Cell::Empty
        }
        other => Cell::from(other.to_string()),
    }
}

fn datetime_cell(ndt: NaiveDateTime) -> Cell {
    if ndt.time() == NaiveTime::MIN {
        Cell::Date(ndt.date())
    } else {
        Cell::DateTime(ndt)
    }
}

fn iso_cell(s: &str) -> Cell {
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return datetime_cell(ndt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Cell::Date(date);
    }
    Cell::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_to_cell() {
        assert_eq!(data_to_cell(&Data::Empty), Cell::Empty);
        assert_eq!(data_to_cell(&Data::String(" Kaub ".into())), Cell::text("Kaub"));
        assert_eq!(data_to_cell(&Data::String("".into())), Cell::Empty);
        assert_eq!(data_to_cell(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(data_to_cell(&Data::Bool(true)), Cell::Bool(true));
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(
            data_to_cell(&Data::DateTimeIso("2020-01-01T00:00:00".into())),
            Cell::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
        );
        assert_eq!(
            data_to_cell(&Data::DateTimeIso("2020-01-01".into())),
            Cell::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
        );
    }

    #[test]
    fn test_range_offset_is_restored() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("ID".into()));
        range.set_value((2, 2), Data::Float(2480010.0));
        range.set_value((3, 1), Data::String("Name".into()));

        let grid = range_to_grid(&range);

        assert_eq!(grid.row_count(), 4);
        assert!(grid.is_row_empty(0));
        assert_eq!(grid.get(2, 1), &Cell::text("ID"));
        assert_eq!(grid.get(2, 2), &Cell::Number(2480010.0));
        assert_eq!(grid.get(3, 2), &Cell::Empty);
    }
}
