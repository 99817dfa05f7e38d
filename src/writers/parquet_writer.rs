use crate::error::{ProcessingError, Result};
use crate::models::{Flag, ObservationRecord, TimeSeries, Variable};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Days since 1970-01-01, the Arrow `Date32` convention.
pub fn to_date32(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

pub fn from_date32(days: i32) -> Option<NaiveDate> {
    epoch().checked_add_signed(chrono::Duration::days(days as i64))
}

/// Writes station time series into one long Parquet table
/// (`station_id, date, <q|w>, flag`).
pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Write all series, one record batch per station. Every series must
    /// carry the same variable since it names the value column.
    pub fn write_series(&self, series: &[(String, TimeSeries)], path: &Path) -> Result<()> {
        let Some((_, first)) = series.first() else {
            return Ok(());
        };
        let variable = first.variable;
        if let Some((id, other)) = series.iter().find(|(_, s)| s.variable != variable) {
            return Err(ProcessingError::InvalidFormat(format!(
                "station {} holds {} but the table is {}",
                id, other.variable, variable
            )));
        }

        let schema = Self::create_schema(variable);
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        for (station_id, ts) in series {
            if ts.is_empty() {
                continue;
            }
            let batch = Self::series_to_batch(station_id, ts, schema.clone())?;
            writer.write(&batch)?;
        }
        writer.close()?;

        Ok(())
    }

    fn create_schema(variable: Variable) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("station_id", DataType::Utf8, false),
            Field::new("date", DataType::Date32, false),
            Field::new(variable.code(), DataType::Float64, true),
            Field::new("flag", DataType::Utf8, true),
        ]))
    }

    fn series_to_batch(
        station_id: &str,
        series: &TimeSeries,
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let records = &series.records;
        let station_ids: Vec<&str> = vec![station_id; records.len()];
        let dates: Vec<i32> = records.iter().map(|r| to_date32(r.date)).collect();
        let values: Vec<Option<f64>> = records.iter().map(|r| r.value).collect();
        let flags: Vec<Option<String>> = records
            .iter()
            .map(|r| r.flag.as_ref().map(|f| f.to_string()))
            .collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(station_ids)),
                Arc::new(Date32Array::from(dates)),
                Arc::new(Float64Array::from(values)),
                Arc::new(StringArray::from(flags)),
            ],
        )?;

        Ok(batch)
    }

    /// Read a table written by [`ParquetWriter::write_series`] back into
    /// per-station series, in file order.
    pub fn read_series(&self, path: &Path) -> Result<Vec<(String, TimeSeries)>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let value_name = builder
            .schema()
            .field(2)
            .name()
            .clone();
        let variable = Variable::from_code(&value_name).ok_or_else(|| {
            ProcessingError::InvalidFormat(format!("unknown value column '{}'", value_name))
        })?;
        let reader = builder.build()?;

        let mut out: Vec<(String, TimeSeries)> = Vec::new();
        for batch in reader {
            let batch = batch?;
            let station_ids = column::<StringArray>(&batch, 0, "station_id")?;
            let dates = column::<Date32Array>(&batch, 1, "date")?;
            let values = column::<Float64Array>(&batch, 2, &value_name)?;
            let flags = column::<StringArray>(&batch, 3, "flag")?;

            for i in 0..batch.num_rows() {
                let date = from_date32(dates.value(i)).ok_or_else(|| {
                    ProcessingError::InvalidFormat("Invalid date in Parquet file".to_string())
                })?;
                let value = (!values.is_null(i)).then(|| values.value(i));
                let flag = (!flags.is_null(i)).then(|| parse_flag(flags.value(i)));
                let record = ObservationRecord::new(date, value, flag);

                let station = station_ids.value(i);
                match out.last_mut() {
                    Some((id, series)) if id == station => series.push(record),
                    _ => out.push((
                        station.to_string(),
                        TimeSeries::with_records(variable, vec![record]),
                    )),
                }
            }
        }

        Ok(out)
    }

    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size: std::fs::metadata(path)?.len(),
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn column<'b, T: 'static>(batch: &'b RecordBatch, index: usize, name: &str) -> Result<&'b T> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column type", name)))
}

fn parse_flag(text: &str) -> Flag {
    match text {
        "true" => Flag::Verified(true),
        "false" => Flag::Verified(false),
        other => Flag::Category(other.to_string()),
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
        )
    }
}
