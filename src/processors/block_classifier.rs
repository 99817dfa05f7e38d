use crate::config::ParserConfig;
use crate::models::{
    Block, BlockRole, BlockView, Cell, CellGrid, ClassifiedBlock, Diagnostic, DiagnosticKind,
    DiagnosticSink, MetadataRecord, TimeSeries, Variable,
};
use crate::processors::block_splitter::split;
use crate::processors::series_normalizer::normalize;

/// Ordinal position → role. Blocks past the end of the layout are
/// [`BlockRole::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    roles: Vec<BlockRole>,
}

impl BlockLayout {
    pub fn new(roles: Vec<BlockRole>) -> Self {
        Self { roles }
    }

    pub fn expected_blocks(&self) -> usize {
        self.roles.len()
    }

    pub fn role_at(&self, index: usize) -> BlockRole {
        self.roles
            .get(index)
            .copied()
            .unwrap_or(BlockRole::Unrecognized)
    }

    pub fn classify(&self, blocks: &[Block]) -> Vec<ClassifiedBlock> {
        blocks
            .iter()
            .enumerate()
            .map(|(i, block)| ClassifiedBlock {
                role: self.role_at(i),
                block: *block,
            })
            .collect()
    }
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self::new(vec![
            BlockRole::Identity,
            BlockRole::Location,
            BlockRole::Coordinates,
            BlockRole::Data,
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub variable: Variable,
    pub extract_data: bool,
}

impl ExtractOptions {
    pub fn new(variable: Variable) -> Self {
        Self {
            variable,
            extract_data: true,
        }
    }

    pub fn metadata_only(variable: Variable) -> Self {
        Self {
            variable,
            extract_data: false,
        }
    }
}

/// Result of parsing one station sheet. Always produced, even when every
/// block was malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub metadata: Option<MetadataRecord>,
    pub series: Option<TimeSeries>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    pub fn station_id(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.primary_id.as_deref())
    }

    pub fn has_id(&self) -> bool {
        self.station_id().is_some()
    }
}

pub struct BlockParser {
    config: ParserConfig,
    layout: BlockLayout,
}

impl BlockParser {
    pub fn new(config: ParserConfig) -> Self {
        let layout = BlockLayout::new(config.layout.clone());
        Self { config, layout }
    }

    pub fn with_layout(mut self, layout: BlockLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    /// Split the grid and extract in one go.
    pub fn parse(&self, grid: &CellGrid, source: Option<&str>, options: ExtractOptions) -> Extraction {
        let blocks = split(grid);
        self.extract(grid, &blocks, source, options)
    }

    /// Extract the metadata record and, if requested, the time series from
    /// blocks previously split out of `grid`.
    pub fn extract(
        &self,
        grid: &CellGrid,
        blocks: &[Block],
        source: Option<&str>,
        options: ExtractOptions,
    ) -> Extraction {
        let mut sink = DiagnosticSink::new(None, source);

        if blocks.len() != self.layout.expected_blocks() {
            sink.report(
                DiagnosticKind::AmbiguousShape,
                format!(
                    "expected {} blocks, found {}",
                    self.layout.expected_blocks(),
                    blocks.len()
                ),
            );
        }

        let classified = self.layout.classify(blocks);
        let mut record = MetadataRecord::new();
        if let Some(source) = source {
            record = record.with_source(source);
        }
        let mut header_entries = 0usize;
        let mut data_blocks = Vec::new();

        for ClassifiedBlock { role, block } in &classified {
            let view = block.view(grid);
            match role {
                BlockRole::Identity => {
                    let pairs = self.key_value_block(&view, *role, &mut sink);
                    record.primary_id = self.find_identifier(&pairs);
                    match record.primary_id.as_deref() {
                        Some(id) => sink.set_station(Some(id)),
                        None => sink.report(
                            DiagnosticKind::MissingIdentifier,
                            format!("no identifier found in {} ({})", role, block),
                        ),
                    }
                    header_entries += pairs.len();
                    record.merge(pairs);
                }
                BlockRole::Location => {
                    let pairs = self.key_value_block(&view, *role, &mut sink);
                    header_entries += pairs.len();
                    record.merge(pairs);
                }
                BlockRole::Coordinates => {
                    let pairs = self.coordinates_block(&view, &mut sink);
                    header_entries += pairs.len();
                    record.merge(pairs);
                }
                BlockRole::Data => data_blocks.push(view),
                BlockRole::Unrecognized => {
                    tracing::debug!(%block, "ignoring block outside layout");
                }
            }
        }

        let series = if !options.extract_data {
            None
        } else if record.primary_id.is_none() {
            tracing::debug!(source = source.unwrap_or("-"), "skipping data block of unresolved station");
            None
        } else if data_blocks.is_empty() {
            None
        } else {
            let mut series = TimeSeries::new(options.variable);
            for view in &data_blocks {
                let part = normalize(view, options.variable, &self.config, &mut sink);
                series.records.extend(part.records);
            }
            Some(series)
        };

        let metadata = (header_entries > 0).then_some(record);

        Extraction {
            metadata,
            series,
            diagnostics: sink.into_diagnostics(),
        }
    }

    /// First two non-empty columns read as (key, value) rows.
    fn key_value_block(
        &self,
        view: &BlockView<'_>,
        role: BlockRole,
        sink: &mut DiagnosticSink,
    ) -> Vec<(String, Cell)> {
        let columns = view.non_empty_columns();
        let mut pairs = Vec::new();

        if columns.len() >= 2 {
            for row in 0..view.row_count() {
                let Some(key) = view.get(row, columns[0]).render() else {
                    continue;
                };
                let key = key.trim_end_matches(':').trim().to_string();
                if key.is_empty() {
                    continue;
                }
                pairs.push((key, view.get(row, columns[1]).clone()));
            }
        }

        if pairs.is_empty() {
            sink.report(
                DiagnosticKind::AmbiguousShape,
                format!(
                    "{} block did not yield expected shape: {} non-empty columns, no key/value pairs",
                    role,
                    columns.len()
                ),
            );
        }

        pairs
    }

    fn find_identifier(&self, pairs: &[(String, Cell)]) -> Option<String> {
        pairs
            .iter()
            .find(|(key, value)| self.config.is_identifier_key(key) && !value.is_blank())
            .and_then(|(_, value)| value.render())
    }

    /// Header row plus exactly one record row.
    fn coordinates_block(&self, view: &BlockView<'_>, sink: &mut DiagnosticSink) -> Vec<(String, Cell)> {
        let rows = view.non_empty_rows();
        let columns = view.non_empty_columns();

        if rows.len() < 2 {
            sink.report(
                DiagnosticKind::AmbiguousShape,
                format!(
                    "coordinates block did not yield expected shape: {} rows, need header and one record",
                    rows.len()
                ),
            );
            return Vec::new();
        }
        if rows.len() > 2 {
            sink.report(
                DiagnosticKind::AmbiguousShape,
                format!(
                    "coordinates block has {} records, keeping the first",
                    rows.len() - 1
                ),
            );
        }

        let header_row = rows[0];
        let record_row = rows[1];

        columns
            .iter()
            .enumerate()
            .map(|(i, &col)| {
                let name = if i == 0 {
                    self.config.crs_label.clone()
                } else {
                    view.get(header_row, col)
                        .render()
                        .unwrap_or_else(|| format!("column_{}", col))
                };
                (name, view.get(record_row, col).clone())
            })
            .collect()
    }
}

impl Default for BlockParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Flag;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn station_sheet() -> CellGrid {
        CellGrid::from_text_rows(vec![
            vec!["ID", "2480010"],
            vec!["Name", "Kaub"],
            vec![""],
            vec!["Gewässer:", "Rhein"],
            vec!["Name", "Kaub Pegel"],
            vec![""],
            vec!["Koordinatensystem", "Rechtswert", "Hochwert"],
            vec!["ETRS89 / UTM 32N", "411850", "5549830"],
            vec![""],
            vec!["Datum", "Abfluss", "Status", "Bemerkung"],
            vec!["01.01.2020", "1.230,5", "geprüft", ""],
            vec!["02.01.2020", "1.198,0", "vorläufig", "x"],
        ])
    }

    #[test]
    fn test_full_sheet() {
        let parser = BlockParser::default();
        let extraction = parser.parse(
            &station_sheet(),
            Some("kaub.xlsx"),
            ExtractOptions::new(Variable::Discharge),
        );

        assert!(extraction.diagnostics.is_empty(), "{:?}", extraction.diagnostics);

        let metadata = extraction.metadata.as_ref().unwrap();
        assert_eq!(metadata.primary_id.as_deref(), Some("2480010"));
        assert_eq!(metadata.source.as_deref(), Some("kaub.xlsx"));
        assert_eq!(metadata.get("Name"), Some(&Cell::text("Kaub Pegel")));
        assert_eq!(metadata.get("Gewässer"), Some(&Cell::text("Rhein")));
        assert_eq!(metadata.get("crs"), Some(&Cell::text("ETRS89 / UTM 32N")));
        assert_eq!(metadata.get("Hochwert"), Some(&Cell::text("5549830")));
        assert_eq!(metadata.get("Koordinatensystem"), None);

        let series = extraction.series.unwrap();
        assert_eq!(series.variable, Variable::Discharge);
        assert_eq!(series.len(), 2);
        assert_eq!(series.records[0].date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(series.records[0].value, Some(1230.5));
        assert_eq!(series.records[0].flag, Some(Flag::Verified(true)));
        assert_eq!(series.records[1].flag, Some(Flag::Verified(false)));
    }

    #[test]
    fn test_identity_block_yields_id() {
        let grid = CellGrid::from_text_rows(vec![
            vec!["ID", "identity_value"],
            vec![""],
            vec!["Ort", "Mainz"],
            vec![""],
            vec!["crs", "x", "y"],
            vec!["EPSG:25832", "1", "2"],
            vec![""],
            vec!["Datum", "Wert"],
            vec!["2020-01-01", "1"],
        ]);

        let extraction =
            BlockParser::default().parse(&grid, None, ExtractOptions::new(Variable::WaterLevel));

        let metadata = extraction.metadata.unwrap();
        assert_eq!(metadata.get("ID"), Some(&Cell::text("identity_value")));
        assert_eq!(metadata.primary_id.as_deref(), Some("identity_value"));
    }

    #[test]
    fn test_missing_identifier_skips_series() {
        let grid = CellGrid::from_text_rows(vec![
            vec!["Name", "Kaub"],
            vec![""],
            vec!["Gewässer", "Rhein"],
            vec![""],
            vec!["crs", "x", "y"],
            vec!["EPSG:25832", "1", "2"],
            vec![""],
            vec!["Datum", "Wert"],
            vec!["2020-01-01", "1"],
        ]);

        let extraction =
            BlockParser::default().parse(&grid, None, ExtractOptions::new(Variable::Discharge));

        assert!(extraction.series.is_none());
        assert!(!extraction.has_id());
        assert_eq!(extraction.metadata.as_ref().map(MetadataRecord::len), Some(5));
        assert_eq!(extraction.diagnostics.len(), 1);
        assert_eq!(extraction.diagnostics[0].kind, DiagnosticKind::MissingIdentifier);
    }

    #[test]
    fn test_metadata_only() {
        let extraction = BlockParser::default().parse(
            &station_sheet(),
            None,
            ExtractOptions::metadata_only(Variable::Discharge),
        );

        assert!(extraction.series.is_none());
        assert_eq!(extraction.station_id(), Some("2480010"));
    }

    #[test]
    fn test_empty_grid_yields_no_metadata() {
        let extraction = BlockParser::default().parse(
            &CellGrid::default(),
            Some("leer.csv"),
            ExtractOptions::new(Variable::Discharge),
        );

        assert!(extraction.metadata.is_none());
        assert!(extraction.series.is_none());
        assert_eq!(extraction.diagnostics.len(), 1);
        assert_eq!(extraction.diagnostics[0].kind, DiagnosticKind::AmbiguousShape);
    }

    #[test]
    fn test_malformed_blocks_are_recoverable() {
        let grid = CellGrid::from_text_rows(vec![
            vec!["nur eine Spalte"],
            vec![""],
            vec!["Gewässer", "Rhein"],
            vec![""],
            vec!["crs", "x"],
            vec![""],
            vec!["Datum", "Wert"],
            vec!["2020-01-01", "1"],
            vec![""],
            vec!["Fußnote"],
        ]);

        let extraction =
            BlockParser::default().parse(&grid, None, ExtractOptions::new(Variable::Discharge));

        let kinds: Vec<_> = extraction.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::AmbiguousShape,    // five blocks
                DiagnosticKind::AmbiguousShape,    // identity
                DiagnosticKind::MissingIdentifier, // identity
                DiagnosticKind::AmbiguousShape,    // coordinates
            ]
        );
        assert_eq!(
            extraction.metadata.map(|m| m.fields.into_keys().collect::<Vec<_>>()),
            Some(vec!["Gewässer".to_string()])
        );
    }

    #[test]
    fn test_custom_layout() {
        let grid = CellGrid::from_text_rows(vec![
            vec!["Messstellennummer", "12345"],
            vec![""],
            vec!["Datum", "Wasserstand", "Prüfstatus"],
            vec!["2020-01-01", "101", "geprüft"],
        ]);
        let parser = BlockParser::default()
            .with_layout(BlockLayout::new(vec![BlockRole::Identity, BlockRole::Data]));

        let extraction = parser.parse(&grid, None, ExtractOptions::new(Variable::WaterLevel));

        assert!(extraction.diagnostics.is_empty());
        assert_eq!(extraction.station_id(), Some("12345"));
        assert_eq!(extraction.series.map(|s| s.verified_count()), Some(1));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let grid = station_sheet();
        let blocks = split(&grid);
        let parser = BlockParser::default();
        let options = ExtractOptions::new(Variable::Discharge);

        let first = parser.extract(&grid, &blocks, Some("a"), options);
        let second = parser.extract(&grid, &blocks, Some("a"), options);

        assert_eq!(first, second);
    }

    #[test]
    fn test_classify_marks_extra_blocks() {
        let layout = BlockLayout::default();
        let blocks = vec![Block::new(0, 1); 5];
        let roles: Vec<_> = layout.classify(&blocks).into_iter().map(|c| c.role).collect();

        assert_eq!(
            roles,
            vec![
                BlockRole::Identity,
                BlockRole::Location,
                BlockRole::Coordinates,
                BlockRole::Data,
                BlockRole::Unrecognized,
            ]
        );
    }
}
