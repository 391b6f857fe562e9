use bson::{Bson, Document as BsonDocument, oid::ObjectId};
use regex::Regex;

use crate::errors::{FieldViolation, StoreError};
use crate::query::convert::{to_datetime, to_number};
use crate::types::{
    DELETED_AT_FIELD, DELETED_BY_FIELD, DELETED_FIELD, ID_FIELD, UPDATED_AT_FIELD,
    UPDATED_BY_FIELD, VERSION_FIELD,
};
use crate::utils::json::bson_to_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
    Number,
    Date,
    ObjectId,
    StringArray,
    Any,
}

/// Declaration of one stored field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    pub lowercase: bool,
    pub allowed: Vec<String>,
    pub pattern: Option<Regex>,
    pub default: Option<Bson>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            unique: false,
            lowercase: false,
            allowed: Vec::new(),
            pattern: None,
            default: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn object_id(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::ObjectId)
    }

    pub fn string_array(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::StringArray)
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub const fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    #[must_use]
    pub fn one_of<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        self.allowed = values.iter().map(|v| v.as_ref().to_string()).collect();
        self
    }

    #[must_use]
    pub fn pattern(mut self, re: Regex) -> Self {
        self.pattern = Some(re);
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Bson>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn cast(&self, value: Bson) -> Result<Bson, String> {
        let cast = match (self.kind, value) {
            (_, Bson::Null) => Bson::Null,
            (FieldKind::Any, v) => v,
            (FieldKind::String, v) => Bson::String(self.cast_string(v)?),
            (FieldKind::Boolean, Bson::Boolean(b)) => Bson::Boolean(b),
            (FieldKind::Boolean, Bson::String(s)) => match s.as_str() {
                "true" | "1" | "yes" => Bson::Boolean(true),
                "false" | "0" | "no" => Bson::Boolean(false),
                _ => return Err(format!("Cast to Boolean failed for value \"{s}\"")),
            },
            (FieldKind::Boolean, Bson::Int32(i)) if i == 0 || i == 1 => Bson::Boolean(i == 1),
            (FieldKind::Number, v @ (Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))) => v,
            (FieldKind::Number, Bson::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() && to_number(&s).is_some() => Bson::Double(n),
                _ => return Err(format!("Cast to Number failed for value \"{s}\"")),
            },
            (FieldKind::Date, Bson::DateTime(d)) => Bson::DateTime(d),
            (FieldKind::Date, Bson::Int64(ms)) => Bson::DateTime(bson::DateTime::from_millis(ms)),
            (FieldKind::Date, Bson::String(s)) => match to_datetime(&s) {
                Some(d) => Bson::DateTime(bson::DateTime::from_millis(d.timestamp_millis())),
                None => return Err(format!("Cast to date failed for value \"{s}\"")),
            },
            (FieldKind::ObjectId, Bson::ObjectId(o)) => Bson::ObjectId(o),
            (FieldKind::ObjectId, Bson::String(s)) => match ObjectId::parse_str(&s) {
                Ok(o) => Bson::ObjectId(o),
                Err(_) => return Err(format!("Cast to ObjectId failed for value \"{s}\"")),
            },
            (FieldKind::StringArray, Bson::Array(items)) => Bson::Array(
                items
                    .into_iter()
                    .map(|v| self.cast_string(v).map(Bson::String))
                    .collect::<Result<_, _>>()?,
            ),
            (FieldKind::StringArray, v) => Bson::Array(vec![Bson::String(self.cast_string(v)?)]),
            (kind, v) => return Err(format!("Cast to {kind:?} failed for value \"{v}\"")),
        };
        Ok(cast)
    }

    fn cast_string(&self, value: Bson) -> Result<String, String> {
        let s = match value {
            Bson::String(s) => s,
            Bson::Int32(i) => i.to_string(),
            Bson::Int64(i) => i.to_string(),
            Bson::Double(f) => f.to_string(),
            Bson::Boolean(b) => b.to_string(),
            Bson::ObjectId(o) => o.to_hex(),
            other => return Err(format!("Cast to string failed for value \"{other}\"")),
        };
        Ok(if self.lowercase { s.to_lowercase() } else { s })
    }

    fn check(&self, value: Option<&Bson>) -> Option<String> {
        let present = match value {
            None | Some(Bson::Null) => None,
            Some(Bson::String(s)) if s.is_empty() => None,
            Some(v) => Some(v),
        };
        let Some(v) = present else {
            return self.required.then(|| format!("Path `{}` is required.", self.name));
        };
        let strings: Vec<&str> = match v {
            Bson::String(s) => vec![s.as_str()],
            Bson::Array(items) => items.iter().filter_map(Bson::as_str).collect(),
            _ => Vec::new(),
        };
        for s in strings {
            if !self.allowed.is_empty() && !self.allowed.iter().any(|a| a == s) {
                return Some(format!("`{s}` is not a valid enum value for path `{}`.", self.name));
            }
            if let Some(re) = &self.pattern
                && !re.is_match(s)
            {
                return Some(format!("Path `{}` is invalid ({s}).", self.name));
            }
        }
        None
    }
}

/// Field declarations for one collection.
///
/// Unknown fields are dropped on write. Lifecycle fields are declared implicitly.
#[derive(Debug, Clone)]
pub struct Schema {
    collection: String,
    created_alias: String,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// `created_alias` names the creation stamp pair (`created` gives `createdAt`/`createdBy`).
    pub fn new(collection: impl Into<String>, created_alias: &str) -> Self {
        let fields = vec![
            FieldSpec::date(format!("{created_alias}At")),
            FieldSpec::object_id(format!("{created_alias}By")),
            FieldSpec::date(UPDATED_AT_FIELD),
            FieldSpec::object_id(UPDATED_BY_FIELD),
            FieldSpec::boolean(DELETED_FIELD).default_value(false),
            FieldSpec::date(DELETED_AT_FIELD),
            FieldSpec::object_id(DELETED_BY_FIELD),
        ];
        Self { collection: collection.into(), created_alias: created_alias.to_string(), fields }
    }

    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.retain(|f| f.name != spec.name);
        self.fields.push(spec);
        self
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn created_alias(&self) -> &str {
        &self.created_alias
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.unique)
    }

    /// Lifecycle fields no patch may write: the creation pair and the soft-delete marks.
    #[must_use]
    pub fn is_protected(&self, key: &str) -> bool {
        [DELETED_FIELD, DELETED_AT_FIELD, DELETED_BY_FIELD].contains(&key)
            || key.strip_prefix(self.created_alias.as_str()).is_some_and(|rest| rest == "At" || rest == "By")
    }

    /// Shapes a new document: defaults, identity, version, casting and validation.
    ///
    /// # Errors
    /// `StoreError::Validation` listing every offending field.
    pub fn prepare_insert(&self, doc: BsonDocument) -> Result<BsonDocument, StoreError> {
        let mut violations = Vec::new();
        let id = match doc.get(ID_FIELD) {
            None | Some(Bson::Null) => ObjectId::new(),
            Some(Bson::ObjectId(o)) => *o,
            Some(Bson::String(s)) => ObjectId::parse_str(s).unwrap_or_else(|_| {
                violations.push(FieldViolation::new(
                    ID_FIELD,
                    serde_json::Value::String(s.clone()),
                    format!("Cast to ObjectId failed for value \"{s}\""),
                ));
                ObjectId::new()
            }),
            Some(other) => {
                violations.push(FieldViolation::new(ID_FIELD, bson_to_json(other), "Cast to ObjectId failed"));
                ObjectId::new()
            }
        };
        let mut out = BsonDocument::new();
        out.insert(ID_FIELD, id);
        for spec in &self.fields {
            if let Some(v) = doc.get(&spec.name).cloned().or_else(|| spec.default.clone()) {
                out.insert(spec.name.clone(), v);
            }
        }
        out.insert(VERSION_FIELD, 0_i64);
        self.cast_and_check(out, violations)
    }

    /// Re-validates an existing document before it is saved.
    ///
    /// # Errors
    /// `StoreError::Validation` listing every offending field.
    pub fn prepare_save(&self, doc: BsonDocument) -> Result<BsonDocument, StoreError> {
        let mut out = BsonDocument::new();
        for key in [ID_FIELD, VERSION_FIELD] {
            if let Some(v) = doc.get(key) {
                out.insert(key, v.clone());
            }
        }
        for spec in &self.fields {
            if let Some(v) = doc.get(&spec.name) {
                out.insert(spec.name.clone(), v.clone());
            }
        }
        self.cast_and_check(out, Vec::new())
    }

    /// Casts the declared fields of a partial update; undeclared and protected fields are dropped.
    ///
    /// # Errors
    /// `StoreError::Validation` when a value cannot be cast.
    pub fn cast_patch(&self, patch: &BsonDocument) -> Result<BsonDocument, StoreError> {
        let mut out = BsonDocument::new();
        let mut violations = Vec::new();
        for (key, value) in patch {
            if self.is_protected(key) {
                continue;
            }
            let Some(spec) = self.fields.iter().find(|f| f.name == *key) else {
                continue;
            };
            match spec.cast(value.clone()) {
                Ok(v) => {
                    out.insert(key.clone(), v);
                }
                Err(msg) => violations.push(FieldViolation::new(key.clone(), bson_to_json(value), msg)),
            }
        }
        if violations.is_empty() { Ok(out) } else { Err(StoreError::Validation(violations)) }
    }

    fn cast_and_check(
        &self,
        mut doc: BsonDocument,
        mut violations: Vec<FieldViolation>,
    ) -> Result<BsonDocument, StoreError> {
        for spec in &self.fields {
            if let Some(raw) = doc.remove(&spec.name) {
                match spec.cast(raw.clone()) {
                    Ok(v) => {
                        doc.insert(spec.name.clone(), v);
                    }
                    Err(msg) => {
                        violations.push(FieldViolation::new(spec.name.clone(), bson_to_json(&raw), msg));
                        continue;
                    }
                }
            }
            if let Some(msg) = spec.check(doc.get(&spec.name)) {
                let value = doc.get(&spec.name).map_or(serde_json::Value::Null, bson_to_json);
                violations.push(FieldViolation::new(spec.name.clone(), value, msg));
            }
        }
        if violations.is_empty() { Ok(doc) } else { Err(StoreError::Validation(violations)) }
    }
}
