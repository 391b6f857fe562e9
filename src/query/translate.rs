use bson::{Bson, oid::ObjectId};
use std::collections::BTreeMap;

use super::convert::{to_boolean, to_datetime, to_number};
use super::filter::{CmpOp, Filter};
use super::types::{FilterValue, MAX_IN_SET};
use crate::types::ID_FIELD;

/// Turns the compiler's generic filter map into one resource's store filter.
///
/// Each resource decides which fields it understands; unknown fields are ignored.
pub trait FilterTranslator: Send + Sync {
    fn translate(&self, filter: &BTreeMap<String, FilterValue>) -> Filter;
}

impl<F> FilterTranslator for F
where
    F: Fn(&BTreeMap<String, FilterValue>) -> Filter + Send + Sync,
{
    fn translate(&self, filter: &BTreeMap<String, FilterValue>) -> Filter {
        self(filter)
    }
}

/// Translator that matches every live document.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatchAll;

impl FilterTranslator for MatchAll {
    fn translate(&self, _filter: &BTreeMap<String, FilterValue>) -> Filter {
        Filter::True
    }
}

/// Accumulates the recurring per-field translations.
///
/// An `_ids` list, when present, replaces every other clause.
#[derive(Debug)]
pub struct FilterBuilder<'a> {
    source: &'a BTreeMap<String, FilterValue>,
    ids: Option<Filter>,
    clauses: Vec<Filter>,
}

impl<'a> FilterBuilder<'a> {
    #[must_use]
    pub const fn new(source: &'a BTreeMap<String, FilterValue>) -> Self {
        Self { source, ids: None, clauses: Vec::new() }
    }

    fn equal(&self, key: &str) -> Option<&'a str> {
        self.source.get(key).and_then(FilterValue::equal)
    }

    /// `_ids=a,b,c` selects exactly those documents. Malformed ids match nothing.
    #[must_use]
    pub fn ids(mut self, key: &str) -> Self {
        if let Some(list) = self.equal(key) {
            let values: Vec<Bson> = list
                .split(',')
                .map(str::trim)
                .filter_map(|s| ObjectId::parse_str(s).ok())
                .take(MAX_IN_SET)
                .map(Bson::ObjectId)
                .collect();
            self.ids = Some(Filter::In { path: ID_FIELD.to_string(), values });
        }
        self
    }

    #[must_use]
    pub fn exact(mut self, key: &str) -> Self {
        if let Some(v) = self.equal(key) {
            self.clauses.push(Filter::eq(key, v));
        }
        self
    }

    /// Substring match; the value is matched literally.
    #[must_use]
    pub fn contains(mut self, key: &str, case_insensitive: bool) -> Self {
        if let Some(v) = self.equal(key) {
            self.clauses.push(contains(key, v, case_insensitive));
        }
        self
    }

    /// Substring match against any of `fields`.
    #[must_use]
    pub fn any_contains(mut self, key: &str, fields: &[&str], case_insensitive: bool) -> Self {
        if let Some(v) = self.equal(key).filter(|v| !v.is_empty()) {
            self.clauses.push(Filter::Or(
                fields.iter().map(|f| contains(f, v, case_insensitive)).collect(),
            ));
        }
        self
    }

    #[must_use]
    pub fn boolean(mut self, key: &str) -> Self {
        if let Some(b) = self.equal(key).and_then(to_boolean) {
            self.clauses.push(Filter::eq(key, b));
        }
        self
    }

    /// Numeric equality or range. Values without a numeric prefix are skipped.
    #[must_use]
    pub fn number(mut self, key: &str) -> Self {
        let clauses = match self.source.get(key) {
            Some(FilterValue::Equal(v)) => {
                to_number(v).map(|n| Filter::eq(key, n)).into_iter().collect()
            }
            Some(FilterValue::Range(r)) => range_clauses(
                key,
                [&r.gte, &r.gt, &r.lte, &r.lt, &r.not],
                |v| to_number(v).map(Bson::Double),
            ),
            None => Vec::new(),
        };
        self.clauses.extend(clauses);
        self
    }

    /// Date equality or range on a timestamp field.
    #[must_use]
    pub fn date(mut self, key: &str) -> Self {
        let as_bson = |v: &str| {
            to_datetime(v).map(|d| Bson::DateTime(bson::DateTime::from_millis(d.timestamp_millis())))
        };
        let clauses = match self.source.get(key) {
            Some(FilterValue::Equal(v)) => {
                as_bson(v).map(|d| Filter::eq(key, d)).into_iter().collect()
            }
            Some(FilterValue::Range(r)) => {
                range_clauses(key, [&r.gte, &r.gt, &r.lte, &r.lt, &r.not], as_bson)
            }
            None => Vec::new(),
        };
        self.clauses.extend(clauses);
        self
    }

    #[must_use]
    pub fn build(self) -> Filter {
        match self.ids {
            Some(ids) => ids,
            None => Filter::all(self.clauses),
        }
    }
}

fn contains(path: &str, needle: &str, case_insensitive: bool) -> Filter {
    Filter::Regex { path: path.to_string(), pattern: regex::escape(needle), case_insensitive }
}

fn range_clauses(
    key: &str,
    [gte, gt, lte, lt, not]: [&Option<String>; 5],
    convert: impl Fn(&str) -> Option<Bson>,
) -> Vec<Filter> {
    let bound = |v: &Option<String>| v.as_deref().and_then(&convert);
    let mut out = Vec::new();
    let cmp = |op, value| Filter::Cmp { path: key.to_string(), op, value };
    if let Some(v) = bound(gte) {
        out.push(cmp(CmpOp::Gte, v));
    } else if let Some(v) = bound(gt) {
        out.push(cmp(CmpOp::Gt, v));
    }
    if let Some(v) = bound(lte) {
        out.push(cmp(CmpOp::Lte, v));
    } else if let Some(v) = bound(lt) {
        out.push(cmp(CmpOp::Lt, v));
    }
    if let Some(v) = bound(not) {
        out.push(Filter::Not(Box::new(cmp(CmpOp::Eq, v))));
    }
    out
}
