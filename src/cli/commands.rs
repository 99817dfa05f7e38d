use crate::cli::args::{Cli, Commands};
use crate::config::ParserConfig;
use crate::error::Result;
use crate::models::{Diagnostic, Variable};
use crate::processors::block_splitter::{separator_rows, split};
use crate::processors::{
    collect_inputs, BatchProcessor, BatchReport, BlockParser, ExtractOptions, LenientParser,
};
use crate::readers::{read_grids, station_from_name, TextExportReader};
use crate::utils::constants::{DIAGNOSTICS_FILE, METADATA_FILE, METADATA_JSON_FILE, NO_ID_FILE};
use crate::utils::progress::ProgressReporter;
use crate::writers::{
    series_file_name, write_diagnostics, write_json, MetadataTableWriter, ParquetWriter,
    SeriesCsvWriter,
};
use std::path::Path;
use tracing::Level;

/// Install the stderr log subscriber. `--verbose` raises the level to DEBUG.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);
    let config = ParserConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { input } => inspect(&input, &config),

        Commands::Extract {
            input,
            output_dir,
            variable,
            metadata_only,
        } => {
            let options = if metadata_only {
                ExtractOptions::metadata_only(variable)
            } else {
                ExtractOptions::new(variable)
            };
            let report = BatchProcessor::new(BlockParser::new(config), options)
                .with_max_workers(1)
                .process_files(&[input], None)?;

            write_report(&report, &output_dir)?;
            print_diagnostics(&report.diagnostics);
            println!("\n{}", report.summary());
            Ok(())
        }

        Commands::Text {
            input,
            entry,
            station_id,
            variable,
            output_file,
            header_lines,
            mmap,
        } => {
            let reader = TextExportReader::new()
                .with_header_lines(header_lines.unwrap_or(config.text.header_lines))
                .with_encoding(&config.encoding)
                .with_mmap(mmap);

            let (lines, name) = match &entry {
                Some(entry) => (reader.read_zip_entry(&input, entry)?, entry.clone()),
                None => (reader.read_lines(&input)?, input.display().to_string()),
            };
            let station = station_id.unwrap_or_else(|| station_from_name(&name));

            let mut schema = config.text.clone();
            schema.header_lines = reader.header_lines();
            let (series, diagnostics) =
                LenientParser::new(schema, variable).parse(&lines, Some(&station), Some(&name));

            let output_file =
                output_file.unwrap_or_else(|| series_file_name(&station, &series).into());
            SeriesCsvWriter::new().write_file(&series, &output_file)?;

            print_diagnostics(&diagnostics);
            println!(
                "Wrote {} {} [{}] records of station {} to {}",
                series.len(),
                variable.display_name(),
                variable.units(),
                station,
                output_file.display()
            );
            Ok(())
        }

        Commands::Batch {
            input_dir,
            output_dir,
            variable,
            max_workers,
            file_pattern,
            parquet,
            compression,
            row_group_size,
            validate_only,
        } => {
            println!("Parsing station files...");
            println!("Input directory: {}", input_dir.display());
            println!("Workers: {}", max_workers);

            let paths = collect_inputs(&input_dir, file_pattern.as_deref())?;
            if paths.is_empty() {
                println!("No input files found");
                return Ok(());
            }

            let progress = ProgressReporter::new(paths.len() as u64, "Parsing files...", false);
            let report = BatchProcessor::new(BlockParser::new(config), ExtractOptions::new(variable))
                .with_max_workers(max_workers)
                .process_files(&paths, Some(&progress))?;

            println!("\n{}", report.summary());
            if validate_only {
                println!("Validation complete - no output written");
                return Ok(());
            }

            write_report(&report, &output_dir)?;

            if let Some(parquet) = parquet {
                let writer = ParquetWriter::new()
                    .with_compression(&compression)?
                    .with_row_group_size(row_group_size);
                writer.write_series(&report.series, &parquet)?;
                println!("\n{}", writer.get_file_info(&parquet)?.summary());
            }

            println!("Processing complete!");
            Ok(())
        }
    }
}

fn inspect(input: &Path, config: &ParserConfig) -> Result<()> {
    let parser = BlockParser::new(config.clone());

    for named in read_grids(input, config)? {
        let blocks = split(&named.grid);
        println!(
            "{}: {} rows, {} blocks, {} separator rows",
            named.source,
            named.grid.row_count(),
            blocks.len(),
            separator_rows(&named.grid, &blocks)
        );

        for classified in parser.layout().classify(&blocks) {
            let view = classified.block.view(&named.grid);
            println!(
                "  {:<14} {} ({} x {})",
                classified.role.display_name(),
                classified.block,
                view.row_count(),
                view.width()
            );
        }

        let extraction = parser.extract(
            &named.grid,
            &blocks,
            Some(&named.source),
            ExtractOptions::metadata_only(Variable::Discharge),
        );
        match extraction.station_id() {
            Some(id) => println!("  station id: {}", id),
            None => println!("  station id: <none>"),
        }
        print_diagnostics(&extraction.diagnostics);
    }

    Ok(())
}

fn write_report(report: &BatchReport, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    let table = MetadataTableWriter::new();
    table.write_file(&report.metadata, &output_dir.join(METADATA_FILE))?;
    if !report.metadata_without_id.is_empty() {
        table.write_file(&report.metadata_without_id, &output_dir.join(NO_ID_FILE))?;
    }
    write_json(&report.metadata, &output_dir.join(METADATA_JSON_FILE))?;

    let series_writer = SeriesCsvWriter::new();
    for (station_id, series) in &report.series {
        series_writer.write_file(series, &output_dir.join(series_file_name(station_id, series)))?;
    }

    write_diagnostics(&report.diagnostics, &output_dir.join(DIAGNOSTICS_FILE))?;

    tracing::info!(
        dir = %output_dir.display(),
        stations = report.metadata.len(),
        series = report.series.len(),
        "output written"
    );
    Ok(())
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("\nDiagnostics ({}):", diagnostics.len());
    for diagnostic in diagnostics {
        println!("  {}", diagnostic);
    }
}
