use crate::error::{ProcessingError, Result};
use crate::models::cell::render_number;
use crate::utils::constants::DATA_FILE_EXTENSIONS;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A station identifier as a caller supplies it.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestedId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RequestedId {
    /// Text form used for matching: integral floats lose their fraction,
    /// text is trimmed.
    pub fn normalized(&self) -> String {
        match self {
            RequestedId::Int(i) => i.to_string(),
            RequestedId::Float(f) => render_number(*f),
            RequestedId::Text(s) => s.trim().to_string(),
        }
    }
}

impl fmt::Display for RequestedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized())
    }
}

impl From<i64> for RequestedId {
    fn from(value: i64) -> Self {
        RequestedId::Int(value)
    }
}

impl From<u32> for RequestedId {
    fn from(value: u32) -> Self {
        RequestedId::Int(value as i64)
    }
}

impl From<f64> for RequestedId {
    fn from(value: f64) -> Self {
        RequestedId::Float(value)
    }
}

impl From<&str> for RequestedId {
    fn from(value: &str) -> Self {
        RequestedId::Text(value.to_string())
    }
}

impl From<String> for RequestedId {
    fn from(value: String) -> Self {
        RequestedId::Text(value)
    }
}

/// What to do when a requested identifier is not in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    #[default]
    Fail,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    /// Not in the index; the caller substitutes a placeholder series.
    Missing,
}

impl Resolution {
    pub fn key(&self) -> Option<&str> {
        match self {
            Resolution::Found(key) => Some(key.as_str()),
            Resolution::Missing => None,
        }
    }
}

/// Identifier → file or sheet name, as a source export lists its stations.
pub type SourceIndex = BTreeMap<String, String>;

fn stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Stem of a requested name that carries a data file extension. Ids such
/// as `1.5` or `A.B` have no file stem.
fn file_stem(name: &str) -> Option<&str> {
    let path = Path::new(name);
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    if !DATA_FILE_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    path.file_stem().and_then(|s| s.to_str())
}

/// Find the canonical index key for `requested`.
///
/// Matches keys, key file stems, values and value file stems, in that
/// order, so callers may pass either the short id or a file name. A
/// requested file name is also matched by its stem, so `1.txt` finds
/// `1.csv`.
pub fn resolve(
    requested: impl Into<RequestedId>,
    index: &SourceIndex,
    policy: MissingPolicy,
) -> Result<Resolution> {
    let requested = requested.into();
    let wanted = requested.normalized();

    let found = index
        .keys()
        .find(|k| k.as_str() == wanted)
        .or_else(|| index.keys().find(|k| stem(k) == wanted))
        .or_else(|| index.iter().find(|(_, v)| v.as_str() == wanted).map(|(k, _)| k))
        .or_else(|| index.iter().find(|(_, v)| stem(v) == wanted).map(|(k, _)| k))
        .or_else(|| {
            let wanted_stem = file_stem(&wanted)?;
            index
                .keys()
                .find(|k| stem(k) == wanted_stem)
                .or_else(|| index.iter().find(|(_, v)| stem(v) == wanted_stem).map(|(k, _)| k))
        });

    match (found, policy) {
        (Some(key), _) => Ok(Resolution::Found(key.clone())),
        (None, MissingPolicy::Placeholder) => {
            tracing::debug!(requested = %wanted, "identifier not in index, using placeholder");
            Ok(Resolution::Missing)
        }
        (None, MissingPolicy::Fail) => Err(ProcessingError::IdentifierNotFound { requested: wanted }),
    }
}
