use crate::error::Result;
use crate::models::{Diagnostic, MetadataRecord};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes merged station metadata as one wide table: `source`, `id`, then
/// the union of all field names in sorted order. Stations lacking a field
/// get an empty cell.
pub struct MetadataTableWriter {
    delimiter: u8,
}

impl MetadataTableWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn columns(records: &[MetadataRecord]) -> Vec<String> {
        let keys: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.fields.keys().map(String::as_str))
            .collect();

        ["source", "id"]
            .into_iter()
            .chain(keys)
            .map(str::to_string)
            .collect()
    }

    pub fn write_file(&self, records: &[MetadataRecord], path: &Path) -> Result<()> {
        self.write(records, File::create(path)?)
    }

    pub fn write<W: Write>(&self, records: &[MetadataRecord], out: W) -> Result<()> {
        let columns = Self::columns(records);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(out);

        writer.write_record(&columns)?;
        for record in records {
            let row = columns.iter().enumerate().map(|(i, column)| match i {
                0 => record.source.clone().unwrap_or_default(),
                1 => record.primary_id.clone().unwrap_or_default(),
                _ => record
                    .get(column)
                    .and_then(|cell| cell.render())
                    .unwrap_or_default(),
            });
            writer.write_record(row)?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl Default for MetadataTableWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Pretty-printed JSON, used for metadata records and diagnostics.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn write_diagnostics(diagnostics: &[Diagnostic], path: &Path) -> Result<()> {
    write_json(diagnostics, path)
}
