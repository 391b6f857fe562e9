//! Query-string compiler.
//!
//! Reserved keys select projection (`select`, `fields`, `project`, `show`), sort
//! (`sort`, `order`, `sortBy`, `orderBy`) and paging (`limit`, `skip`). Every other
//! key is a filter field. Operators may trail the key and take the value
//! (`amount>=100` arrives as key `amount>` with value `100`) or be embedded in the
//! key with the literal after them (`amount>100` arrives as key `amount>100`
//! with an empty value):
//!
//! | key form    | bound          |
//! |-------------|----------------|
//! | `k`         | equal          |
//! | `k>` = v    | gte v          |
//! | `k<` = v    | lte v          |
//! | `k!` = v    | not v          |
//! | `k>v`       | gt v           |
//! | `k<v`       | lt v           |
//! | `k!v`       | not v          |
//!
//! Equality supersedes every range for the same field. Within a range the
//! inclusive bounds win over the exclusive ones.

use std::collections::BTreeMap;

use super::convert::to_count;
use super::types::{DEFAULT_MAX_LIMIT, FilterValue, Order, Projection, Query, Range, SortSpec};

const SELECT_KEYS: [&str; 4] = ["select", "fields", "project", "show"];
const SORT_KEYS: [&str; 4] = ["sort", "order", "sortBy", "orderBy"];
const LIMIT_KEY: &str = "limit";
const SKIP_KEY: &str = "skip";

/// Splits a raw query string the way the HTTP layer would hand it over.
///
/// Pairs are split on `&`, then on the first `=`; a missing `=` yields an
/// empty value. Both halves are percent-decoded with `+` read as a space. Later
/// duplicates overwrite earlier ones.
#[must_use]
pub fn parse_query_string(raw: &str) -> BTreeMap<String, String> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut out = BTreeMap::new();
    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode(k);
        if key.is_empty() {
            continue;
        }
        out.insert(key, decode(v));
    }
    out
}

fn decode(part: &str) -> String {
    let spaced = part.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(s) => s.into_owned(),
        Err(_) => spaced,
    }
}

/// Compiles with the default `limit` ceiling.
#[must_use]
pub fn compile(raw: &BTreeMap<String, String>) -> Query {
    QueryCompiler::default().compile(raw)
}

#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler {
    max_limit: usize,
}

impl Default for QueryCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LIMIT)
    }
}

#[derive(Default)]
struct Bounds {
    equal: Option<String>,
    inclusive: Range,
    exclusive: Range,
}

impl Bounds {
    fn finish(self) -> Option<FilterValue> {
        if let Some(v) = self.equal {
            return Some(FilterValue::Equal(v));
        }
        let Self { inclusive: inc, exclusive: exc, .. } = self;
        let range = Range {
            gt: if inc.gte.is_some() { None } else { exc.gt },
            gte: inc.gte,
            lt: if inc.lte.is_some() { None } else { exc.lt },
            lte: inc.lte,
            not: inc.not.or(exc.not),
        };
        (!range.is_empty()).then_some(FilterValue::Range(range))
    }
}

impl QueryCompiler {
    #[must_use]
    pub const fn new(max_limit: usize) -> Self {
        Self { max_limit: if max_limit == 0 { DEFAULT_MAX_LIMIT } else { max_limit } }
    }

    #[must_use]
    pub const fn max_limit(&self) -> usize {
        self.max_limit
    }

    /// Never fails: malformed input imposes no constraint.
    #[must_use]
    pub fn compile(&self, raw: &BTreeMap<String, String>) -> Query {
        let mut query = Query { limit: self.max_limit, ..Query::default() };

        if let Some(v) = first_present(raw, &SELECT_KEYS) {
            query.select = compile_select(v);
        }
        if let Some(v) = first_present(raw, &SORT_KEYS) {
            query.sort = compile_sort(v);
        }
        if let Some(n) = raw.get(LIMIT_KEY).and_then(|v| to_count(v)).filter(|n| *n > 0) {
            query.limit = n.min(self.max_limit);
        }
        if let Some(n) = raw.get(SKIP_KEY).and_then(|v| to_count(v)) {
            query.skip = n;
        }

        let mut bounds: BTreeMap<String, Bounds> = BTreeMap::new();
        for (key, value) in raw {
            if is_reserved(key) {
                continue;
            }
            let Some(pos) = key.find(['>', '<', '!']) else {
                bounds.entry(key.clone()).or_default().equal = Some(value.clone());
                continue;
            };
            let field = &key[..pos];
            if field.is_empty() {
                continue;
            }
            let op = key.as_bytes()[pos];
            let literal = &key[pos + 1..];
            let entry = bounds.entry(field.to_string()).or_default();
            if literal.is_empty() {
                let slot = match op {
                    b'>' => &mut entry.inclusive.gte,
                    b'<' => &mut entry.inclusive.lte,
                    _ => &mut entry.inclusive.not,
                };
                *slot = Some(value.clone());
            } else {
                let slot = match op {
                    b'>' => &mut entry.exclusive.gt,
                    b'<' => &mut entry.exclusive.lt,
                    _ => &mut entry.exclusive.not,
                };
                *slot = Some(literal.to_string());
            }
        }
        query.filter =
            bounds.into_iter().filter_map(|(field, b)| b.finish().map(|fv| (field, fv))).collect();
        query
    }
}

fn is_reserved(key: &str) -> bool {
    SELECT_KEYS.contains(&key) || SORT_KEYS.contains(&key) || key == LIMIT_KEY || key == SKIP_KEY
}

fn first_present<'a>(raw: &'a BTreeMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().filter_map(|k| raw.get(*k)).map(|v| v.trim()).find(|v| !v.is_empty())
}

fn split_list(v: &str) -> impl Iterator<Item = &str> {
    v.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn compile_select(value: &str) -> BTreeMap<String, Projection> {
    let (mode, list) = if let Some(rest) = value.strip_prefix('-') {
        (Projection::Exclude, rest)
    } else {
        (Projection::Include, value.strip_prefix('+').unwrap_or(value))
    };
    split_list(list)
        .map(|f| f.trim_start_matches(['-', '+']))
        .filter(|f| !f.is_empty())
        .map(|f| (f.to_string(), mode))
        .collect()
}

fn compile_sort(value: &str) -> Vec<SortSpec> {
    let mut out: Vec<SortSpec> = Vec::new();
    for item in split_list(value) {
        let (order, field) = if let Some(f) = item.strip_prefix('-') {
            (Order::Desc, f)
        } else {
            (Order::Asc, item.strip_prefix('+').unwrap_or(item))
        };
        if field.is_empty() {
            continue;
        }
        match out.iter_mut().find(|s| s.field == field) {
            Some(existing) => existing.order = order,
            None => out.push(SortSpec { field: field.to_string(), order }),
        }
    }
    out
}
