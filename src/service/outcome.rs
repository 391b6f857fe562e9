use serde::Serialize;

/// A document left untouched by a batch operation, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejected<T> {
    pub document: T,
    pub reason: String,
}

/// Affected/unaffected partition of a batch operation.
///
/// For update and delete the two sides together hold every matched document.
/// For inserts a single store fault may account for a run of inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkOutcome<T> {
    pub affected: Vec<T>,
    pub unaffected: Vec<Rejected<T>>,
}

impl<T> Default for BulkOutcome<T> {
    fn default() -> Self {
        Self { affected: Vec::new(), unaffected: Vec::new() }
    }
}

impl<T> BulkOutcome<T> {
    #[must_use]
    pub const fn affected_count(&self) -> usize {
        self.affected.len()
    }

    #[must_use]
    pub const fn unaffected_count(&self) -> usize {
        self.unaffected.len()
    }

    /// `(affectedCount, unaffectedCount)`
    #[must_use]
    pub const fn counts(&self) -> (usize, usize) {
        (self.affected.len(), self.unaffected.len())
    }

    pub fn reject(&mut self, document: T, reason: impl Into<String>) {
        self.unaffected.push(Rejected { document, reason: reason.into() });
    }

    /// Maps every document, keeping the partition.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> BulkOutcome<U> {
        BulkOutcome {
            affected: self.affected.into_iter().map(&mut f).collect(),
            unaffected: self
                .unaffected
                .into_iter()
                .map(|r| Rejected { document: f(r.document), reason: r.reason })
                .collect(),
        }
    }
}
