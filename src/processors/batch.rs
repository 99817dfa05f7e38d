use crate::error::{ProcessingError, Result};
use crate::models::{Diagnostic, DiagnosticKind, MetadataRecord, TimeSeries};
use crate::processors::block_classifier::{BlockParser, ExtractOptions, Extraction};
use crate::readers::{read_grids, NamedGrid};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything a batch run produced, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub metadata: Vec<MetadataRecord>,
    /// Records whose sheet carried no identifier; kept apart for review.
    pub metadata_without_id: Vec<MetadataRecord>,
    pub series: Vec<(String, TimeSeries)>,
    pub diagnostics: Vec<Diagnostic>,
    pub files_processed: usize,
    pub stations_processed: usize,
}

impl BatchReport {
    fn absorb(&mut self, extraction: Extraction) {
        let Extraction {
            metadata,
            series,
            diagnostics,
        } = extraction;

        self.stations_processed += 1;
        self.diagnostics.extend(diagnostics);

        let Some(metadata) = metadata else {
            return;
        };
        match metadata.primary_id.clone() {
            Some(id) => {
                if let Some(series) = series {
                    self.series.push((id, series));
                }
                self.metadata.push(metadata);
            }
            None => self.metadata_without_id.push(metadata),
        }
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn diagnostic_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for diagnostic in &self.diagnostics {
            *counts.entry(diagnostic.kind.tag()).or_insert(0) += 1;
        }
        counts
    }

    pub fn total_records(&self) -> usize {
        self.series.iter().map(|(_, s)| s.len()).sum()
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("Batch Summary\n");
        summary.push_str("=============\n");
        summary.push_str(&format!("Files processed: {}\n", self.files_processed));
        summary.push_str(&format!("Stations processed: {}\n", self.stations_processed));
        summary.push_str(&format!("Stations with id: {}\n", self.metadata.len()));
        summary.push_str(&format!(
            "Stations without id: {}\n",
            self.metadata_without_id.len()
        ));
        summary.push_str(&format!(
            "Series: {} ({} records)\n",
            self.series.len(),
            self.total_records()
        ));

        if self.diagnostics.is_empty() {
            summary.push_str("Diagnostics: none\n");
        } else {
            summary.push_str(&format!("Diagnostics: {}\n", self.diagnostics.len()));
            for (tag, count) in self.diagnostic_counts() {
                summary.push_str(&format!("  {}: {}\n", tag, count));
            }
        }

        summary
    }
}

/// Runs the block parser over many input files on a bounded rayon pool.
pub struct BatchProcessor {
    parser: BlockParser,
    max_workers: usize,
    options: ExtractOptions,
}

impl BatchProcessor {
    pub fn new(parser: BlockParser, options: ExtractOptions) -> Self {
        Self {
            parser,
            max_workers: num_cpus::get(),
            options,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn parser(&self) -> &BlockParser {
        &self.parser
    }

    /// Process every file. A file that cannot be read becomes a format
    /// diagnostic; the rest of the batch carries on.
    pub fn process_files(
        &self,
        paths: &[PathBuf],
        progress: Option<&ProgressReporter>,
    ) -> Result<BatchReport> {
        if let Some(p) = progress {
            p.set_message(&format!("Parsing {} files...", paths.len()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let outcomes: Vec<Vec<Extraction>> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    let outcome = self.process_file(path);
                    if let Some(p) = progress {
                        p.increment(1);
                    }
                    outcome
                })
                .collect()
        });

        let mut report = BatchReport {
            files_processed: paths.len(),
            ..BatchReport::default()
        };
        for extraction in outcomes.into_iter().flatten() {
            report.absorb(extraction);
        }

        tracing::info!(
            files = report.files_processed,
            stations = report.stations_processed,
            diagnostics = report.diagnostics.len(),
            "batch finished"
        );
        if let Some(p) = progress {
            p.finish_with_message(&format!(
                "Processed {} stations",
                report.stations_processed
            ));
        }

        Ok(report)
    }

    fn process_file(&self, path: &Path) -> Vec<Extraction> {
        match read_grids(path, self.parser.config()) {
            Ok(grids) => grids.iter().map(|named| self.process_grid(named)).collect(),
            Err(e) => {
                let source = path.display().to_string();
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::FormatError,
                    format!("could not read input: {}", e),
                )
                .with_source(Some(&source));
                tracing::warn!("{}", diagnostic);
                vec![Extraction {
                    metadata: None,
                    series: None,
                    diagnostics: vec![diagnostic],
                }]
            }
        }
    }

    fn process_grid(&self, named: &NamedGrid) -> Extraction {
        tracing::debug!(source = %named.source, rows = named.grid.row_count(), "parsing grid");
        self.parser
            .parse(&named.grid, Some(&named.source), self.options)
    }
}

/// Input files under `dir` (not recursive) whose name contains `pattern`,
/// sorted so that batch output order is stable.
pub fn collect_inputs(dir: &Path, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !crate::readers::is_supported(&path) {
            continue;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if name.starts_with("~$") {
            continue;
        }
        if pattern.map_or(true, |p| name.contains(p)) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::models::Variable;
    use std::fs;
    use tempfile::TempDir;

    const STATION: &str = "\
ID;24700200
Name;Bad Ems

Gewässer;Lahn

Rechtswert;Hochwert
3412345;5567890

Datum;Wert;Status
01.01.2020;1,5;geprüft
02.01.2020;1,7;
";

    fn processor() -> BatchProcessor {
        BatchProcessor::new(
            BlockParser::new(ParserConfig::default()),
            ExtractOptions::new(Variable::Discharge),
        )
        .with_max_workers(2)
    }

    #[test]
    fn test_batch_over_directory() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("a.csv"), STATION)?;
        fs::write(dir.path().join("b.csv"), STATION.replace("ID;24700200", "Name2;x"))?;
        fs::write(dir.path().join("notes.pdf"), "ignored")?;

        let paths = collect_inputs(dir.path(), None)?;
        assert_eq!(paths.len(), 2);

        let report = processor().process_files(&paths, None)?;

        assert_eq!(report.files_processed, 2);
        assert_eq!(report.stations_processed, 2);
        assert_eq!(report.metadata.len(), 1);
        assert_eq!(report.metadata_without_id.len(), 1);
        assert_eq!(report.series.len(), 1);
        assert_eq!(report.series[0].0, "24700200");
        assert_eq!(report.series[0].1.len(), 2);
        assert_eq!(report.count(DiagnosticKind::MissingIdentifier), 1);
        assert!(report.summary().contains("Stations without id: 1"));
        Ok(())
    }

    #[test]
    fn test_unreadable_file_does_not_abort_batch() -> Result<()> {
        let dir = TempDir::new()?;
        let good = dir.path().join("good.csv");
        fs::write(&good, STATION)?;
        let broken = dir.path().join("broken.xlsx");
        fs::write(&broken, "not a workbook")?;

        let report = processor().process_files(&[broken, good], None)?;

        assert_eq!(report.metadata.len(), 1);
        assert_eq!(report.count(DiagnosticKind::FormatError), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::FormatError);
        Ok(())
    }

    #[test]
    fn test_pattern_filter() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("q_1.csv"), STATION)?;
        fs::write(dir.path().join("w_1.csv"), STATION)?;

        let paths = collect_inputs(dir.path(), Some("q_"))?;
        assert_eq!(paths.len(), 1);
        Ok(())
    }
}
