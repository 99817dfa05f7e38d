use crate::error::Result;
use crate::models::TimeSeries;
use std::io::Write;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Writes one station's normalized series as `date,<q|w>,flag`.
pub struct SeriesCsvWriter {
    delimiter: u8,
}

impl SeriesCsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn write_file(&self, series: &TimeSeries, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write(series, file)
    }

    /// Absent values and flags are empty fields.
    pub fn write<W: Write>(&self, series: &TimeSeries, out: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(out);

        writer.write_record(series.column_names())?;
        for record in &series.records {
            writer.write_record([
                record.date.format(DATE_FORMAT).to_string(),
                record.value.map(|v| v.to_string()).unwrap_or_default(),
                record.flag.as_ref().map(|f| f.to_string()).unwrap_or_default(),
            ])?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl Default for SeriesCsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// File name for a station's series: `<id>_<code>.csv`, with path
/// separators in the id replaced.
pub fn series_file_name(station_id: &str, series: &TimeSeries) -> String {
    let safe: String = station_id
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{}_{}.csv", safe, series.variable.code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Flag, ObservationRecord, Variable};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_layout() -> Result<()> {
        let series = TimeSeries::with_records(
            Variable::WaterLevel,
            vec![
                ObservationRecord::new(
                    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                    Some(233.0),
                    Some(Flag::Verified(true)),
                ),
                ObservationRecord::new(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(), None, None),
            ],
        );

        let mut out = Vec::new();
        SeriesCsvWriter::new().write(&series, &mut out)?;

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "date,w,flag\n2020-01-01,233,true\n2020-01-02,,\n"
        );
        Ok(())
    }

    #[test]
    fn test_series_file_name() {
        let series = TimeSeries::new(Variable::Discharge);
        assert_eq!(series_file_name("2480010", &series), "2480010_q.csv");
        assert_eq!(series_file_name("a/b", &series), "a_b_q.csv");
    }
}
