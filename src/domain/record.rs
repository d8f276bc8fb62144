// Raw record domain models
use chrono::NaiveDateTime;
use serde::Serialize;

/// One sensor value. `None` is the missing marker, distinct from a parsed zero.
pub type Reading = Option<f64>;

/// The fixed set of numeric variable columns, declared once per ingestion.
///
/// Records and datasets hold their readings positionally in schema order, so a
/// variable name is resolved to an index once instead of on every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    variables: Vec<String>,
}

impl Schema {
    pub fn new(variables: Vec<String>) -> Self {
        Self { variables }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == name)
    }

    pub fn names(&self) -> &[String] {
        &self.variables
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub timestamp: NaiveDateTime,
    pub values: Vec<Reading>,
}

impl RawRecord {
    pub fn new(timestamp: NaiveDateTime, values: Vec<Reading>) -> Self {
        Self { timestamp, values }
    }

    /// A row with every variable missing, used to fill gaps on the time axis.
    pub fn empty(timestamp: NaiveDateTime, width: usize) -> Self {
        Self {
            timestamp,
            values: vec![None; width],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_index_of() {
        let schema = Schema::new(vec!["FC".to_string(), "LE".to_string()]);
        assert_eq!(schema.index_of("LE"), Some(1));
        assert_eq!(schema.index_of("H"), None);
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_empty_record_is_all_missing() {
        let ts = NaiveDateTime::parse_from_str("2025-05-01 00:00", "%Y-%m-%d %H:%M").unwrap();
        let record = RawRecord::empty(ts, 3);
        assert_eq!(record.values, vec![None, None, None]);
    }
}
