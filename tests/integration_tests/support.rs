#![allow(dead_code)]

use bson::Document as BsonDocument;
use innkeep::Backend;
use innkeep::audit::MemoryAuditSink;
use innkeep::config::Config;
use innkeep::errors::StoreError;
use innkeep::query::{Filter, FindOptions};
use innkeep::resources::{employee, guest, room};
use innkeep::store::{DocumentStore, MemoryStore, Schema};
use innkeep::types::DocumentId;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Memory store that counts every call and can be told to refuse saves.
pub struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    fail_saves: AtomicBool,
    refusals: AtomicUsize,
}

impl CountingStore {
    pub fn new(schema: Schema) -> Self {
        Self {
            inner: MemoryStore::new(schema),
            calls: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
            refusals: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Refuses only the next `n` saves.
    pub fn refuse_next_saves(&self, n: usize) {
        self.refusals.store(n, Ordering::SeqCst);
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl DocumentStore for CountingStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<BsonDocument>, StoreError> {
        self.tick();
        self.inner.find(filter, options)
    }

    fn find_by_id(&self, id: &DocumentId) -> Result<Option<BsonDocument>, StoreError> {
        self.tick();
        self.inner.find_by_id(id)
    }

    fn find_raw_by_id(&self, id: &DocumentId) -> Result<Option<BsonDocument>, StoreError> {
        self.tick();
        self.inner.find_raw_by_id(id)
    }

    fn insert_one(&self, doc: BsonDocument) -> Result<BsonDocument, StoreError> {
        self.tick();
        self.inner.insert_one(doc)
    }

    fn insert_many(&self, docs: Vec<BsonDocument>) -> Result<Vec<BsonDocument>, StoreError> {
        self.tick();
        self.inner.insert_many(docs)
    }

    fn save(&self, doc: BsonDocument) -> Result<BsonDocument, StoreError> {
        self.tick();
        let refused = self.fail_saves.load(Ordering::SeqCst)
            || self.refusals.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
        if refused {
            return Err(StoreError::Backend("write refused".into()));
        }
        self.inner.save(doc)
    }

    fn cast_patch(&self, patch: &BsonDocument) -> Result<BsonDocument, StoreError> {
        self.tick();
        self.inner.cast_patch(patch)
    }
}

/// A backend whose stores and audit sink the test can inspect.
pub struct Harness {
    pub backend: Backend,
    pub audit: Arc<MemoryAuditSink>,
    pub rooms: Arc<CountingStore>,
    pub guests: Arc<CountingStore>,
    pub employees: Arc<CountingStore>,
}

pub fn harness() -> Harness {
    harness_with(Config::default())
}

pub fn harness_with(config: Config) -> Harness {
    let audit = Arc::new(MemoryAuditSink::new());
    let rooms = Arc::new(CountingStore::new(room::schema()));
    let guests = Arc::new(CountingStore::new(guest::schema()));
    let employees = Arc::new(CountingStore::new(employee::schema()));
    let backend = Backend::with_stores(config, audit.clone(), rooms.clone(), guests.clone(), employees.clone())
        .expect("config is valid");
    Harness { backend, audit, rooms, guests, employees }
}

pub fn room(number: &str) -> Value {
    json!({ "number": number, "type": "single", "floor": "1", "occupancy": "vacant" })
}

pub fn guest(first: &str, id_number: &str, phone: &str) -> Value {
    json!({
        "firstName": first,
        "lastName": "Kebede",
        "IDNumber": id_number,
        "phone": phone,
        "nationality": "Ethiopian",
    })
}

pub fn employee(first: &str, phone: &str, code: &str, title: &str) -> Value {
    json!({
        "firstName": first,
        "lastName": "Alemu",
        "phone": phone,
        "jobTitle": title,
        "code": code,
        "password": "hunter2",
    })
}

/// The `_id` of a created document as returned in `data.inserted`.
pub fn inserted_id(data: &Value) -> String {
    data["inserted"]["_id"].as_str().expect("inserted document has an id").to_string()
}
