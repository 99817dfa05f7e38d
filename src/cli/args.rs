use crate::models::Variable;
use crate::utils::constants::DEFAULT_ROW_GROUP_SIZE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hydro-blocks")]
#[command(about = "Block parser for dirty hydrological spreadsheet and text exports")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "TOML settings file (HYDRO_* variables override it)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the blocks found in each sheet and the role assigned to them
    Inspect {
        #[arg(short, long, help = "Spreadsheet or CSV file")]
        input: PathBuf,
    },

    /// Extract metadata and the time series of one spreadsheet or CSV file
    Extract {
        #[arg(short, long, help = "Spreadsheet or CSV file")]
        input: PathBuf,

        #[arg(short, long, help = "Output directory")]
        output_dir: PathBuf,

        #[arg(long, default_value = "q", help = "Variable code: q (discharge) or w (water level)")]
        variable: Variable,

        #[arg(long, default_value = "false", help = "Only extract metadata")]
        metadata_only: bool,
    },

    /// Parse a line-oriented text export, from disk or from a zip entry
    Text {
        #[arg(short, long, help = "Text file, or zip archive when --entry is given")]
        input: PathBuf,

        #[arg(short, long, help = "Entry inside the zip archive")]
        entry: Option<String>,

        #[arg(short, long, help = "Station identifier [default: file stem]")]
        station_id: Option<String>,

        #[arg(long, default_value = "q")]
        variable: Variable,

        #[arg(short, long, help = "Output CSV file [default: <id>_<variable>.csv]")]
        output_file: Option<PathBuf>,

        #[arg(long, help = "Header lines to skip (overrides settings)")]
        header_lines: Option<usize>,

        #[arg(long, default_value = "false", help = "Memory-map the input file")]
        mmap: bool,
    },

    /// Extract every spreadsheet or CSV file in a directory
    Batch {
        #[arg(short, long, help = "Input directory")]
        input_dir: PathBuf,

        #[arg(short, long, help = "Output directory")]
        output_dir: PathBuf,

        #[arg(long, default_value = "q")]
        variable: Variable,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,

        #[arg(
            long,
            help = "Filter to file names containing this pattern (e.g., 'Pegel_')"
        )]
        file_pattern: Option<String>,

        #[arg(long, help = "Also write all series into this Parquet file")]
        parquet: Option<PathBuf>,

        #[arg(short, long, default_value = "snappy")]
        compression: String,

        #[arg(long, default_value_t = DEFAULT_ROW_GROUP_SIZE, help = "Rows per Parquet row group")]
        row_group_size: usize,

        #[arg(long, default_value = "false", help = "Parse and report without writing output")]
        validate_only: bool,
    },
}
