use crate::error::Result;
use crate::models::BlockRole;
use crate::processors::lenient_parser::{Separator, TextColumn, TextSchema};
use crate::utils::constants::{
    CONFIG_ENV_PREFIX, CRS_LABEL, DEFAULT_CSV_DELIMITER, DEFAULT_ENCODING,
    DEFAULT_IDENTIFIER_KEYS, FLAG_COLUMN, VERIFIED_MARKER,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Settings shared by the block parser, the text parser and the readers.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ParserConfig {
    #[validate(length(min = 1))]
    pub identifier_keys: Vec<String>,

    #[validate(length(min = 1))]
    pub verified_marker: String,

    #[validate(length(min = 1))]
    pub crs_label: String,

    #[validate(range(min = 2, max = 64))]
    pub flag_column: usize,

    #[validate(length(min = 1))]
    pub layout: Vec<BlockRole>,

    pub text: TextSchema,

    pub csv_delimiter: char,

    /// Workbook sheets that hold no station (legends, overviews).
    pub skip_sheets: Vec<String>,

    #[validate(length(min = 1))]
    pub encoding: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            identifier_keys: DEFAULT_IDENTIFIER_KEYS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            verified_marker: VERIFIED_MARKER.to_string(),
            crs_label: CRS_LABEL.to_string(),
            flag_column: FLAG_COLUMN,
            layout: vec![
                BlockRole::Identity,
                BlockRole::Location,
                BlockRole::Coordinates,
                BlockRole::Data,
            ],
            text: TextSchema::default(),
            csv_delimiter: DEFAULT_CSV_DELIMITER,
            skip_sheets: Vec::new(),
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl ParserConfig {
    /// Load settings from an optional TOML file, overlaid by `HYDRO_*`
    /// environment variables (`HYDRO_VERIFIED_MARKER`, `HYDRO_TEXT__SEPARATOR`, ...).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(CONFIG_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: ParserConfig = builder.build()?.try_deserialize()?;
        settings.validate()?;
        settings.check_text_schema()?;
        Ok(settings)
    }

    fn check_text_schema(&self) -> Result<()> {
        let values = self
            .text
            .columns
            .iter()
            .filter(|c| matches!(c, TextColumn::Value))
            .count();
        if values != 1 || !self.text.columns.contains(&TextColumn::Date) {
            return Err(crate::error::ProcessingError::Config(format!(
                "text schema needs one date and exactly one value column, got {:?}",
                self.text.columns
            )));
        }
        if let Some(optional) = self.text.optional_column {
            if optional >= self.text.columns.len() {
                return Err(crate::error::ProcessingError::Config(format!(
                    "optional column {} outside text schema of {} columns",
                    optional,
                    self.text.columns.len()
                )));
            }
        }
        if matches!(self.text.separator, Separator::Char(c) if c.is_alphanumeric()) {
            return Err(crate::error::ProcessingError::Config(
                "text separator must not be alphanumeric".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_identifier_key(&self, key: &str) -> bool {
        let key = key.trim();
        self.identifier_keys
            .iter()
            .any(|k| k.eq_ignore_ascii_case(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_default_config_is_valid() {
        let config = ParserConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.check_text_schema().is_ok());
        assert!(config.is_identifier_key("id"));
        assert!(config.is_identifier_key(" Messstellennummer "));
        assert!(!config.is_identifier_key("Name"));
    }

    #[test]
    fn test_load_from_toml_file() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "verified_marker = \"freigegeben\"")?;
        writeln!(file, "identifier_keys = [\"Pegelkennziffer\"]")?;
        writeln!(file, "flag_column = 3")?;
        writeln!(file, "skip_sheets = [\"Legende\"]")?;

        let config = ParserConfig::load(Some(file.path()))?;

        assert_eq!(config.verified_marker, "freigegeben");
        assert_eq!(config.identifier_keys, vec!["Pegelkennziffer".to_string()]);
        assert_eq!(config.flag_column, 3);
        assert_eq!(config.skip_sheets, vec!["Legende".to_string()]);
        assert_eq!(config.crs_label, CRS_LABEL);
        Ok(())
    }

    #[test]
    fn test_environment_overrides() -> Result<()> {
        std::env::set_var("HYDRO_ENCODING", "latin1");
        std::env::set_var("HYDRO_TEXT__DATE_FORMAT", "%Y-%m-%d");

        let loaded = ParserConfig::load(None);

        std::env::remove_var("HYDRO_ENCODING");
        std::env::remove_var("HYDRO_TEXT__DATE_FORMAT");

        let config = loaded?;
        assert_eq!(config.encoding, "latin1");
        assert_eq!(config.text.date_format, "%Y-%m-%d");
        assert_eq!(config.text.columns, TextSchema::default().columns);
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_rejected() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "verified_marker = \"\"")?;

        assert!(ParserConfig::load(Some(file.path())).is_err());
        Ok(())
    }
}
