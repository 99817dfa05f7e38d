use crate::config::ParserConfig;
use crate::models::{
    BlockView, DiagnosticKind, DiagnosticSink, Flag, ObservationRecord, TimeSeries, Variable,
};
use crate::utils::constants::{DATE_COLUMN, VALUE_COLUMN};
use crate::utils::parsing::{date_from_cell, number_from_cell};

/// Turn a data block into a time series.
///
/// Fully-empty rows and columns are dropped first; the first remaining row
/// is the header. Rows with an unparseable date are dropped, unparseable
/// values become absent. Both are reported once per block with the grid
/// rows affected.
pub fn normalize(
    view: &BlockView<'_>,
    variable: Variable,
    config: &ParserConfig,
    sink: &mut DiagnosticSink,
) -> TimeSeries {
    let mut series = TimeSeries::new(variable);
    let rows = view.non_empty_rows();
    let columns = view.non_empty_columns();

    if rows.len() < 2 || columns.len() < 2 {
        sink.report(
            DiagnosticKind::AmbiguousShape,
            format!(
                "data block did not yield expected shape: {} rows x {} columns after dropping empties",
                rows.len(),
                columns.len()
            ),
        );
        return series;
    }

    let has_flag_column = config.flag_column < columns.len();
    let marker = config.verified_marker.to_lowercase();

    let mut bad_dates = Vec::new();
    let mut bad_values = Vec::new();

    for &row in &rows[1..] {
        let cell = |col: usize| view.get(row, columns[col]);

        let date = match date_from_cell(cell(DATE_COLUMN)) {
            Some(date) => date,
            None => {
                bad_dates.push(view.grid_row(row));
                continue;
            }
        };

        let value_cell = cell(VALUE_COLUMN);
        let value = number_from_cell(value_cell);
        if value.is_none() && !value_cell.is_blank() {
            bad_values.push(view.grid_row(row));
        }

        let flag = has_flag_column.then(|| {
            let text = cell(config.flag_column).render().unwrap_or_default();
            Flag::Verified(text.to_lowercase() == marker)
        });

        series.push(ObservationRecord::new(date, value, flag));
    }

    if !bad_dates.is_empty() {
        sink.report_lines(
            DiagnosticKind::ValueError,
            format!("dropped {} rows with unparseable date", bad_dates.len()),
            bad_dates,
        );
    }
    if !bad_values.is_empty() {
        sink.report_lines(
            DiagnosticKind::ValueError,
            format!("{} rows with non-numeric value set to missing", bad_values.len()),
            bad_values,
        );
    }

    series
}
