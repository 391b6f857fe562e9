use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Ceiling for `limit` when none is configured
pub const DEFAULT_MAX_LIMIT: usize = 10_000;

// Safety limits carried over to the evaluator
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_PROJECTION_FIELDS: usize = 64;

/// String-encoded bounds for one field. Absent bounds impose nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<String>,
}

impl Range {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.gt.is_none()
            && self.gte.is_none()
            && self.lt.is_none()
            && self.lte.is_none()
            && self.not.is_none()
    }
}

/// Constraint on one field of a compiled query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterValue {
    Equal(String),
    Range(Range),
}

impl FilterValue {
    #[must_use]
    pub fn equal(&self) -> Option<&str> {
        match self {
            Self::Equal(v) => Some(v.as_str()),
            Self::Range(_) => None,
        }
    }

    #[must_use]
    pub const fn range(&self) -> Option<&Range> {
        match self {
            Self::Equal(_) => None,
            Self::Range(r) => Some(r),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    Include,
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Desc }
    }
}

/// Field selection handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelection {
    pub mode: Projection,
    pub fields: Vec<String>,
}

/// A compiled filter/projection/sort/paging request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub filter: BTreeMap<String, FilterValue>,
    pub select: BTreeMap<String, Projection>,
    pub sort: Vec<SortSpec>,
    pub limit: usize,
    pub skip: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            filter: BTreeMap::new(),
            select: BTreeMap::new(),
            sort: Vec::new(),
            limit: DEFAULT_MAX_LIMIT,
            skip: 0,
        }
    }
}

impl Query {
    /// The selection as the store sees it.
    ///
    /// A query mixing include and exclude entries keeps only its included fields.
    #[must_use]
    pub fn selection(&self) -> Option<FieldSelection> {
        if self.select.is_empty() {
            return None;
        }
        let included: Vec<String> = self
            .select
            .iter()
            .filter(|(_, p)| **p == Projection::Include)
            .map(|(f, _)| f.clone())
            .collect();
        if included.is_empty() {
            Some(FieldSelection { mode: Projection::Exclude, fields: self.select.keys().cloned().collect() })
        } else {
            Some(FieldSelection { mode: Projection::Include, fields: included })
        }
    }
}

/// Options for `DocumentStore::find`.
///
/// Sorting is applied before paging, paging before projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub projection: Option<FieldSelection>,
    pub sort: Vec<SortSpec>,
    pub limit: Option<usize>,
    pub skip: usize,
}
