use bson::{Bson, Document as BsonDocument};
use parking_lot::RwLock;

use super::{DocumentStore, Schema};
use crate::errors::StoreError;
use crate::query::{Filter, FindOptions, bson_equal, compare_docs, eval_filter, project};
use crate::types::{DELETED_FIELD, DocumentId, ID_FIELD, VERSION_FIELD, id_of};

/// In-process store. Documents keep insertion order.
#[derive(Debug)]
pub struct MemoryStore {
    schema: Schema,
    docs: RwLock<Vec<BsonDocument>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self { schema, docs: RwLock::new(Vec::new()) }
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Stored documents, soft-deleted ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    fn is_live(doc: &BsonDocument) -> bool {
        !matches!(doc.get(DELETED_FIELD), Some(Bson::Boolean(true)))
    }

    fn position(docs: &[BsonDocument], id: &DocumentId) -> Option<usize> {
        docs.iter().position(|d| id_of(d).as_ref() == Some(id))
    }

    fn check_unique(&self, docs: &[BsonDocument], candidate: &BsonDocument) -> Result<(), StoreError> {
        let own_id = candidate.get(ID_FIELD);
        for spec in self.schema.unique_fields() {
            let Some(value) = candidate.get(&spec.name).filter(|v| !matches!(v, Bson::Null)) else {
                continue;
            };
            let clash = docs.iter().any(|d| {
                d.get(ID_FIELD) != own_id && d.get(&spec.name).is_some_and(|v| bson_equal(v, value))
            });
            if clash {
                return Err(StoreError::Duplicate {
                    collection: self.schema.collection().to_string(),
                    field: spec.name.clone(),
                    value: match value {
                        Bson::String(s) => s.clone(),
                        other => other.to_string(),
                    },
                });
            }
        }
        Ok(())
    }

    fn insert_locked(&self, docs: &mut Vec<BsonDocument>, doc: BsonDocument) -> Result<BsonDocument, StoreError> {
        let prepared = self.schema.prepare_insert(doc)?;
        if docs.iter().any(|d| d.get(ID_FIELD) == prepared.get(ID_FIELD)) {
            return Err(StoreError::Duplicate {
                collection: self.schema.collection().to_string(),
                field: ID_FIELD.to_string(),
                value: id_of(&prepared).map(|id| id.to_hex()).unwrap_or_default(),
            });
        }
        self.check_unique(docs, &prepared)?;
        docs.push(prepared.clone());
        Ok(prepared)
    }
}

impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        self.schema.collection()
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<BsonDocument>, StoreError> {
        let mut matched: Vec<BsonDocument> = self
            .docs
            .read()
            .iter()
            .filter(|d| Self::is_live(d) && eval_filter(d, filter))
            .cloned()
            .collect();
        if !options.sort.is_empty() {
            matched.sort_by(|a, b| compare_docs(a, b, &options.sort));
        }
        let limit = options.limit.unwrap_or(usize::MAX);
        let page = matched.into_iter().skip(options.skip).take(limit);
        Ok(match &options.projection {
            Some(selection) => page.map(|d| project(&d, selection)).collect(),
            None => page.collect(),
        })
    }

    fn find_by_id(&self, id: &DocumentId) -> Result<Option<BsonDocument>, StoreError> {
        Ok(self.find_raw_by_id(id)?.filter(Self::is_live))
    }

    fn find_raw_by_id(&self, id: &DocumentId) -> Result<Option<BsonDocument>, StoreError> {
        let docs = self.docs.read();
        Ok(Self::position(&docs, id).map(|i| docs[i].clone()))
    }

    fn insert_one(&self, doc: BsonDocument) -> Result<BsonDocument, StoreError> {
        let mut docs = self.docs.write();
        self.insert_locked(&mut docs, doc)
    }

    fn insert_many(&self, batch: Vec<BsonDocument>) -> Result<Vec<BsonDocument>, StoreError> {
        let mut docs = self.docs.write();
        let mut inserted = Vec::with_capacity(batch.len());
        for (i, doc) in batch.into_iter().enumerate() {
            match self.insert_locked(&mut docs, doc) {
                Ok(d) => inserted.push(d),
                Err(cause) => {
                    log::debug!("{}: ordered insert stopped at {i}: {cause}", self.name());
                    return Err(StoreError::BulkWrite { inserted, failed_index: i, cause: Box::new(cause) });
                }
            }
        }
        Ok(inserted)
    }

    fn save(&self, doc: BsonDocument) -> Result<BsonDocument, StoreError> {
        let id = id_of(&doc).ok_or_else(|| StoreError::NotFound(String::from("<no id>")))?;
        let mut docs = self.docs.write();
        let pos = Self::position(&docs, &id).ok_or_else(|| StoreError::NotFound(id.to_hex()))?;
        let found = docs[pos].get_i64(VERSION_FIELD).unwrap_or(0);
        let expected = doc.get_i64(VERSION_FIELD).unwrap_or(found);
        if expected != found {
            return Err(StoreError::VersionConflict { id: id.to_hex(), expected, found });
        }
        let mut prepared = self.schema.prepare_save(doc)?;
        self.check_unique(&docs, &prepared)?;
        prepared.insert(VERSION_FIELD, found + 1);
        docs[pos] = prepared.clone();
        Ok(prepared)
    }

    fn cast_patch(&self, patch: &BsonDocument) -> Result<BsonDocument, StoreError> {
        self.schema.cast_patch(patch)
    }
}
