use bson::{Bson, Document as BsonDocument};
use regex::RegexBuilder;
use std::cmp::Ordering;

use super::types::{
    FieldSelection, MAX_IN_SET, MAX_PATH_DEPTH, MAX_PROJECTION_FIELDS, MAX_SORT_FIELDS, Order,
    Projection, SortSpec,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Store-native predicate tree produced by a `FilterTranslator`.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Exists { path: String, exists: bool },
    In { path: String, values: Vec<Bson> },
    Nin { path: String, values: Vec<Bson> },
    Cmp { path: String, op: CmpOp, value: Bson },
    Regex { path: String, pattern: String, case_insensitive: bool },
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::Cmp { path: path.into(), op: CmpOp::Eq, value: value.into() }
    }

    pub fn ne(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::Not(Box::new(Self::eq(path, value)))
    }

    /// Collapses an empty conjunction to `True` and a single clause to itself.
    #[must_use]
    pub fn all(mut clauses: Vec<Self>) -> Self {
        clauses.retain(|c| *c != Self::True);
        match clauses.len() {
            0 => Self::True,
            1 => clauses.remove(0),
            _ => Self::And(clauses),
        }
    }
}

#[must_use]
pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Or(fs) => fs.iter().any(|f| eval_filter(doc, f)),
        Filter::Not(f) => !eval_filter(doc, f),
        Filter::Exists { path, exists } => get_path(doc, path).is_some() == *exists,
        Filter::In { path, values } => get_path(doc, path).is_some_and(|v| is_in_set(v, values)),
        Filter::Nin { path, values } => !get_path(doc, path).is_some_and(|v| is_in_set(v, values)),
        Filter::Cmp { path, op, value } => get_path(doc, path).is_some_and(|v| match v {
            // array fields match when any element does
            Bson::Array(items) if !matches!(value, Bson::Array(_)) => {
                items.iter().any(|item| cmp_matches(item, *op, value))
            }
            _ => cmp_matches(v, *op, value),
        }),
        Filter::Regex { path, pattern, case_insensitive } => match get_path(doc, path) {
            Some(Bson::String(s)) => RegexBuilder::new(pattern)
                .case_insensitive(*case_insensitive)
                .build()
                .is_ok_and(|r| r.is_match(s)),
            _ => false,
        },
    }
}

fn cmp_matches(v: &Bson, op: CmpOp, value: &Bson) -> bool {
    match op {
        CmpOp::Eq => bson_equal(v, value),
        // ordering only holds between comparable types
        _ if type_rank(v) != type_rank(value) && !(is_num(v) && is_num(value)) => false,
        CmpOp::Gt => compare_bson(v, value) == Ordering::Greater,
        CmpOp::Gte => compare_bson(v, value) != Ordering::Less,
        CmpOp::Lt => compare_bson(v, value) == Ordering::Less,
        CmpOp::Lte => compare_bson(v, value) != Ordering::Greater,
    }
}

pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &[SortSpec]) -> Ordering {
    for s in sort.iter().take(MAX_SORT_FIELDS) {
        let ord = match (get_path(a, &s.field), get_path(b, &s.field)) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if s.order == Order::Asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

fn is_in_set(v: &Bson, set: &[Bson]) -> bool {
    set.iter().take(MAX_IN_SET).any(|x| bson_equal(x, v))
}

/// Resolves a dotted path inside a document.
#[must_use]
pub fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut cur = doc;
    let mut iter = path.split('.').enumerate().peekable();
    while let Some((depth, seg)) = iter.next() {
        if depth >= MAX_PATH_DEPTH {
            return None;
        }
        if iter.peek().is_none() {
            return cur.get(seg);
        }
        match cur.get(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return None,
        }
    }
    None
}

/// Writes `value` at a dotted path, creating intermediate documents.
/// Returns whether the stored value changed.
pub fn set_path(root: &mut BsonDocument, path: &str, value: Bson) -> bool {
    let mut cur = root;
    let mut iter = path.split('.').peekable();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            let old = cur.insert(seg.to_string(), value.clone());
            return !old.as_ref().is_some_and(|o| bson_equal(o, &value));
        }
        if !matches!(cur.get(seg), Some(Bson::Document(_))) {
            cur.insert(seg.to_string(), Bson::Document(BsonDocument::new()));
        }
        match cur.get_mut(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return false,
        }
    }
    false
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_))
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn as_f64(x: &Bson) -> Option<f64> {
    match x {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        Bson::Decimal128(d) => d.to_string().parse::<f64>().ok(),
        _ => None,
    }
}

/// Equality with numeric widening (`Int32(3) == Double(3.0)`).
#[must_use]
pub fn bson_equal(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        };
    }
    match (a, b) {
        (Bson::Array(x), Bson::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| bson_equal(l, r))
        }
        (Bson::Document(x), Bson::Document(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| bson_equal(v, w)))
        }
        _ => a == b,
    }
}

#[must_use]
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    if is_num(a) && is_num(b) {
        let x = as_f64(a).unwrap_or(f64::NAN);
        let y = as_f64(b).unwrap_or(f64::NAN);
        return x.total_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Bson) -> u8 {
    use bson::Bson as T;
    match v {
        T::MinKey => 0,
        T::Null | T::Undefined => 1,
        T::Int32(_) | T::Int64(_) | T::Double(_) | T::Decimal128(_) => 2,
        T::String(_) | T::Symbol(_) => 3,
        T::Document(_) => 4,
        T::Array(_) => 5,
        T::Binary(_) => 6,
        T::ObjectId(_) => 7,
        T::Boolean(_) => 8,
        T::DateTime(_) => 9,
        T::Timestamp(_) => 10,
        T::RegularExpression(_) => 11,
        T::DbPointer(_) => 12,
        T::JavaScriptCode(_) | T::JavaScriptCodeWithScope(_) => 13,
        T::MaxKey => 255,
    }
}

/// Applies a field selection. `_id` survives an include list unless excluded explicitly.
#[must_use]
pub fn project(doc: &BsonDocument, selection: &FieldSelection) -> BsonDocument {
    let fields = selection.fields.iter().take(MAX_PROJECTION_FIELDS);
    match selection.mode {
        Projection::Include => {
            let mut out = BsonDocument::new();
            if let Some(id) = doc.get(crate::types::ID_FIELD) {
                out.insert(crate::types::ID_FIELD, id.clone());
            }
            for f in fields {
                if let Some(v) = get_path(doc, f) {
                    set_path(&mut out, f, v.clone());
                }
            }
            out
        }
        Projection::Exclude => {
            let mut out = doc.clone();
            for f in fields {
                remove_path(&mut out, f);
            }
            out
        }
    }
}

fn remove_path(root: &mut BsonDocument, path: &str) {
    match path.split_once('.') {
        None => {
            root.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(d)) = root.get_mut(head) {
                remove_path(d, rest);
            }
        }
    }
}
