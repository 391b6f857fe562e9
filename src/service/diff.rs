use bson::Document as BsonDocument;

use crate::query::set_path;
use crate::types::BOOKKEEPING_FIELDS;

/// Applies `patch` to `doc` and returns the entries that changed a stored value.
pub fn apply_patch(doc: &mut BsonDocument, patch: &BsonDocument) -> BsonDocument {
    let mut changes = BsonDocument::new();
    for (path, value) in patch {
        if set_path(doc, path, value.clone()) {
            changes.insert(path.clone(), value.clone());
        }
    }
    changes
}

/// A change set made only of bookkeeping stamps is no change.
#[must_use]
pub fn has_effective_change(changes: &BsonDocument) -> bool {
    changes.keys().any(|k| !BOOKKEEPING_FIELDS.contains(&k.as_str()))
}
