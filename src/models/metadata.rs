use crate::models::Cell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat station metadata merged from the header blocks of one sheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub source: Option<String>,
    pub primary_id: Option<String>,
    pub fields: BTreeMap<String, Cell>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Insert all pairs, overriding existing keys.
    pub fn merge<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, Cell)>,
    {
        for (key, value) in pairs {
            self.fields.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.fields.get(key)
    }

    pub fn has_id(&self) -> bool {
        self.primary_id.is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides_earlier_keys() {
        let mut record = MetadataRecord::new();
        record.merge(vec![
            ("Name".to_string(), Cell::text("Kaub")),
            ("Gewässer".to_string(), Cell::text("Rhein")),
        ]);
        record.merge(vec![("Name".to_string(), Cell::text("Kaub (neu)"))]);

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("Name"), Some(&Cell::text("Kaub (neu)")));
        assert!(!record.has_id());
    }
}
