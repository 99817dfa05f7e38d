use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measured quantity of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    Discharge,  // q
    WaterLevel, // w
}

impl Variable {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "q" => Some(Variable::Discharge),
            "w" => Some(Variable::WaterLevel),
            _ => None,
        }
    }

    /// Short code used as the value column name.
    pub fn code(&self) -> &'static str {
        match self {
            Variable::Discharge => "q",
            Variable::WaterLevel => "w",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Variable::Discharge => "Discharge",
            Variable::WaterLevel => "Water level",
        }
    }

    pub fn units(&self) -> &'static str {
        match self {
            Variable::Discharge => "m³/s",
            Variable::WaterLevel => "cm",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Variable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::from_code(s).ok_or_else(|| format!("unknown variable code '{}', expected q or w", s))
    }
}

/// Quality indicator attached to an observation.
///
/// Provider qualifiers whose meaning is unknown are kept verbatim in
/// `Category`; nothing downstream interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Verified(bool),
    Category(String),
}

impl Flag {
    pub fn is_verified(&self) -> bool {
        matches!(self, Flag::Verified(true))
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Verified(v) => write!(f, "{}", v),
            Flag::Category(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub flag: Option<Flag>,
}

impl ObservationRecord {
    pub fn new(date: NaiveDate, value: Option<f64>, flag: Option<Flag>) -> Self {
        Self { date, value, flag }
    }

    /// Value as a float with absent readings mapped to NaN.
    pub fn value_or_nan(&self) -> f64 {
        self.value.unwrap_or(f64::NAN)
    }
}

/// Observations of one variable at one station, in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub variable: Variable,
    pub records: Vec<ObservationRecord>,
}

impl TimeSeries {
    pub fn new(variable: Variable) -> Self {
        Self {
            variable,
            records: Vec::new(),
        }
    }

    pub fn with_records(variable: Variable, records: Vec<ObservationRecord>) -> Self {
        Self { variable, records }
    }

    /// Stand-in for a station whose source could not be located: no rows,
    /// but the same column layout as a real series.
    pub fn placeholder(variable: Variable) -> Self {
        Self::new(variable)
    }

    /// Column names of the normalized table: `date`, the variable code, `flag`.
    pub fn column_names(&self) -> [&'static str; 3] {
        ["date", self.variable.code(), "flag"]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: ObservationRecord) {
        self.records.push(record);
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    pub fn verified_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.flag.as_ref().is_some_and(Flag::is_verified))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_codes() {
        assert_eq!(Variable::from_code("Q"), Some(Variable::Discharge));
        assert_eq!(Variable::from_code(" w "), Some(Variable::WaterLevel));
        assert_eq!(Variable::from_code("x"), None);
        assert_eq!(Variable::Discharge.code(), "q");
        assert_eq!(Variable::Discharge.units(), "m³/s");
        assert_eq!(Variable::WaterLevel.units(), "cm");
        assert!("z".parse::<Variable>().is_err());
    }

    #[test]
    fn test_placeholder_keeps_schema() {
        let series = TimeSeries::placeholder(Variable::WaterLevel);

        assert!(series.is_empty());
        assert_eq!(series.column_names(), ["date", "w", "flag"]);
        assert_eq!(series.date_range(), None);
    }

    #[test]
    fn test_date_range_and_verified_count() {
        let d1 = NaiveDate::from_ymd_opt(2021, 3, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let series = TimeSeries::with_records(
            Variable::Discharge,
            vec![
                ObservationRecord::new(d1, Some(1.0), Some(Flag::Verified(true))),
                ObservationRecord::new(d2, None, Some(Flag::Category("B".into()))),
            ],
        );

        assert_eq!(series.date_range(), Some((d2, d1)));
        assert_eq!(series.verified_count(), 1);
        assert!(series.records[1].value_or_nan().is_nan());
    }
}
