use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single search result in domain-neutral shape. Flights, hotels,
/// restaurants and attractions all normalize into this; anything
/// domain-specific lives under `details`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    /// Stable identifier from the upstream provider (offer id, place id)
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl ResultRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: None,
            rating: None,
            address: None,
            schedule: None,
            details: Value::Null,
        }
    }
}

/// Append-only accumulation of results across the searches of one agent
/// session. Insertion order is preserved; records are de-duplicated by id,
/// keeping the first occurrence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    records: Vec<ResultRecord>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of results, skipping ids already present.
    /// Returns how many records were actually added.
    pub fn absorb(&mut self, batch: Vec<ResultRecord>) -> usize {
        let mut added = 0;
        for record in batch {
            if !self.records.iter().any(|r| r.id == record.id) {
                self.records.push(record);
                added += 1;
            }
        }
        added
    }

    pub fn get(&self, id: &str) -> Option<&ResultRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn top(&self, n: usize) -> Vec<ResultRecord> {
        self.records.iter().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ResultRecord {
        ResultRecord::new(id, format!("name-{id}"))
    }

    #[test]
    fn absorb_deduplicates_by_id() {
        let mut set = ResultSet::new();
        assert_eq!(set.absorb(vec![record("a"), record("b")]), 2);
        assert_eq!(set.absorb(vec![record("b"), record("c")]), 1);
        assert_eq!(set.len(), 3);
        assert!(set.get("c").is_some());
    }

    #[test]
    fn absorb_preserves_insertion_order() {
        let mut set = ResultSet::new();
        set.absorb(vec![record("x"), record("y")]);
        set.absorb(vec![record("y"), record("z"), record("x")]);
        let ids: Vec<_> = set.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }
}
