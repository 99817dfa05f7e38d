pub mod metadata_writer;
pub mod parquet_writer;
pub mod series_writer;

pub use metadata_writer::{write_diagnostics, write_json, MetadataTableWriter};
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
pub use series_writer::{series_file_name, SeriesCsvWriter};
