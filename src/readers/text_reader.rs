use crate::error::{ProcessingError, Result};
use crate::readers::decoding::decode;
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_ENCODING, DEFAULT_HEADER_LINES};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

/// Reads per-station text exports, either loose on disk or inside a zip
/// archive, and hands back the data lines with the header skipped.
pub struct TextExportReader {
    header_lines: usize,
    encoding: String,
    use_mmap: bool,
}

impl TextExportReader {
    pub fn new() -> Self {
        Self {
            header_lines: DEFAULT_HEADER_LINES,
            encoding: DEFAULT_ENCODING.to_string(),
            use_mmap: false,
        }
    }

    pub fn with_header_lines(mut self, header_lines: usize) -> Self {
        self.header_lines = header_lines;
        self
    }

    pub fn with_encoding(mut self, encoding: &str) -> Self {
        self.encoding = encoding.to_string();
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub fn header_lines(&self) -> usize {
        self.header_lines
    }

    pub fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        let text = if self.use_mmap {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            decode(&mmap, &self.encoding)?
        } else {
            let file = File::open(path)?;
            let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            decode(&bytes, &self.encoding)?
        };

        Ok(self.data_lines(&text))
    }

    /// Read one entry of a zip archive. The archive is opened for this call
    /// only and closed before returning, also on error.
    pub fn read_zip_entry(&self, zip_path: &Path, entry: &str) -> Result<Vec<String>> {
        let file = File::open(zip_path)?;
        let mut archive = ZipArchive::new(file)?;

        let mut zip_file = archive.by_name(entry).map_err(|_| {
            ProcessingError::InvalidFormat(format!(
                "File '{}' not found in archive '{}'",
                entry,
                zip_path.display()
            ))
        })?;

        let mut bytes = Vec::with_capacity(zip_file.size() as usize);
        zip_file.read_to_end(&mut bytes)?;
        let text = decode(&bytes, &self.encoding)?;

        Ok(self.data_lines(&text))
    }

    /// File entries of an archive whose name contains `pattern`.
    pub fn list_zip_entries(&self, zip_path: &Path, pattern: Option<&str>) -> Result<Vec<String>> {
        let file = File::open(zip_path)?;
        let archive = ZipArchive::new(file)?;

        let mut names: Vec<String> = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .filter(|name| pattern.map_or(true, |p| name.contains(p)))
            .map(|name| name.to_string())
            .collect();
        names.sort();

        Ok(names)
    }

    fn data_lines(&self, text: &str) -> Vec<String> {
        text.lines()
            .skip(self.header_lines)
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect()
    }
}

impl Default for TextExportReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Station identifier of a per-station export: the file stem, without any
/// directory inside an archive.
pub fn station_from_name(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .trim()
        .to_string()
}
