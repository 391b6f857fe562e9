use serde_json::Value;

use crate::service::{BulkOutcome, Rejected};

/// Fields never written to a response unless configured otherwise.
pub const DEFAULT_SENSITIVE_FIELDS: [&str; 3] = ["code", "password", "deleted"];

/// Strips sensitive fields from outgoing documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitizer {
    fields: Vec<String>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_FIELDS)
    }
}

impl Sanitizer {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fields: fields.into_iter().map(Into::into).collect() }
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Removes the sensitive top-level keys of one document.
    #[must_use]
    pub fn clean(&self, mut doc: Value) -> Value {
        if let Value::Object(map) = &mut doc {
            for field in &self.fields {
                map.remove(field);
            }
        }
        doc
    }

    #[must_use]
    pub fn clean_all(&self, docs: Vec<Value>) -> Vec<Value> {
        docs.into_iter().map(|d| self.clean(d)).collect()
    }

    /// Cleans both sides of a batch outcome.
    #[must_use]
    pub fn clean_outcome(&self, outcome: BulkOutcome<Value>) -> BulkOutcome<Value> {
        BulkOutcome {
            affected: self.clean_all(outcome.affected),
            unaffected: outcome
                .unaffected
                .into_iter()
                .map(|r| Rejected { document: self.clean(r.document), reason: r.reason })
                .collect(),
        }
    }
}
