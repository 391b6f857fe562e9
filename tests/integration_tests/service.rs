use bson::{Bson, doc};
use innkeep::audit::AuditAction;
use innkeep::errors::ServiceError;
use innkeep::query::{Query, compile, parse_query_string};
use innkeep::resources::Resource;
use innkeep::service::NO_CHANGE_REASON;
use innkeep::types::{DocumentId, SYSTEM_ACTOR, id_of};

use super::support::harness;

fn room_doc(number: &str) -> bson::Document {
    doc! { "number": number, "type": "single", "floor": "1", "occupancy": "vacant" }
}

#[test]
fn create_many_sets_aside_duplicates_and_resumes() {
    let h = harness();
    let service = h.backend.rooms().handlers().service();
    let docs = ["101", "102", "101", "104", "105"].map(room_doc).to_vec();
    let outcome = service.create_many(docs);
    assert_eq!(outcome.counts(), (4, 1));
    let numbers: Vec<&str> = outcome.affected.iter().map(|d| d.get_str("number").unwrap()).collect();
    assert_eq!(numbers, ["101", "102", "104", "105"]);
    let rejected = &outcome.unaffected[0];
    assert_eq!(rejected.document.get_str("number").unwrap(), "101");
    assert_eq!(rejected.reason, "duplicate key error dup key: { number: \"101\" }");
    assert_eq!(h.audit.count(AuditAction::Create), 4);
}

#[test]
fn create_many_reports_validation_reasons() {
    let h = harness();
    let service = h.backend.rooms().handlers().service();
    let outcome = service.create_many(vec![room_doc("1"), doc! { "number": "2", "type": "attic" }, room_doc("3")]);
    assert_eq!(outcome.counts(), (2, 1));
    assert!(outcome.unaffected[0].reason.contains("type"));
}

#[test]
fn empty_batch_touches_nothing() {
    let h = harness();
    let outcome = h.backend.rooms().handlers().service().create_many(Vec::new());
    assert_eq!(outcome.counts(), (0, 0));
    assert_eq!(h.rooms.calls(), 0);
}

#[test]
fn update_by_id_without_effective_change_is_silent() {
    let h = harness();
    let service = h.backend.rooms().handlers().service();
    let created = service.create(room_doc("201")).unwrap();
    let id = id_of(&created).unwrap();
    h.audit.clear();

    let patch = doc! { "floor": "1", "updatedAt": bson::DateTime::now(), "updatedBy": DocumentId::new().0 };
    let outcome = service.update_by_id(&id, &patch).unwrap();
    assert_eq!(outcome.counts(), (0, 1));
    assert_eq!(outcome.unaffected[0].reason, NO_CHANGE_REASON);
    assert_eq!(h.audit.count(AuditAction::Update), 0);

    let stored = service.store().find_raw_by_id(&id).unwrap().unwrap();
    assert!(stored.get("updatedAt").is_none());
    assert_eq!(stored.get_i64("__v").unwrap(), 0);
}

#[test]
fn update_records_only_changed_fields() {
    let h = harness();
    let service = h.backend.rooms().handlers().service();
    let id = id_of(&service.create(room_doc("202")).unwrap()).unwrap();
    let outcome = service.update_by_id(&id, &doc! { "floor": "3", "number": "202" }).unwrap();
    assert_eq!(outcome.counts(), (1, 0));
    let events = h.audit.events();
    let update = events.iter().find(|e| e.action == AuditAction::Update).unwrap();
    assert_eq!(update.data["floor"], "3");
    assert!(update.data.get("number").is_none());
    assert_eq!(update.document_id.as_deref(), Some(id.to_hex().as_str()));
}

#[test]
fn undeclared_patch_fields_are_dropped() {
    let h = harness();
    let service = h.backend.rooms().handlers().service();
    let id = id_of(&service.create(room_doc("203")).unwrap()).unwrap();
    let outcome = service.update_by_id(&id, &doc! { "view": "sea" }).unwrap();
    assert_eq!(outcome.counts(), (0, 1));
    assert!(service.read_by_id(&id).unwrap().get("view").is_none());
}

#[test]
fn duplicate_on_update_aborts_with_conflict() {
    let h = harness();
    let service = h.backend.rooms().handlers().service();
    service.create(room_doc("301")).unwrap();
    let id = id_of(&service.create(room_doc("302")).unwrap()).unwrap();
    let err = service.update_by_id(&id, &doc! { "number": "301" }).unwrap_err();
    assert!(matches!(err, ServiceError::Conflict { ref field, ref value } if field == "number" && value == "301"));
}

#[test]
fn update_folds_store_refusals_into_unaffected() {
    let h = harness();
    let service = h.backend.rooms().handlers().service();
    for number in ["311", "312", "313"] {
        service.create(room_doc(number)).unwrap();
    }
    h.rooms.fail_saves(true);
    let outcome = service.update(&Query::default(), &doc! { "floor": "7" }).unwrap();
    assert_eq!(outcome.counts(), (0, 3));
    assert!(outcome.unaffected.iter().all(|r| r.reason == "store backend error: write refused"));
    assert_eq!(h.audit.count(AuditAction::Update), 0);

    h.rooms.fail_saves(false);
    h.rooms.refuse_next_saves(1);
    let outcome = service.update(&Query::default(), &doc! { "floor": "7" }).unwrap();
    assert_eq!(outcome.counts(), (2, 1));
    assert_eq!(h.audit.count(AuditAction::Update), 2);
}

#[test]
fn invalid_value_aborts_a_bulk_update() {
    let h = harness();
    let service = h.backend.rooms().handlers().service();
    service.create(room_doc("321")).unwrap();
    service.create(room_doc("322")).unwrap();
    let err = service.update(&Query::default(), &doc! { "occupancy": "haunted" }).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref v) if v.iter().any(|f| f.field == "occupancy")));
    let rooms = service.read(&Query::default(), false).unwrap();
    assert!(rooms.iter().all(|d| d.get_str("occupancy").unwrap() == "vacant"));
    assert!(rooms.iter().all(|d| d.get_i64("__v").unwrap() == 0));
    assert_eq!(h.audit.count(AuditAction::Update), 0);
}

#[test]
fn soft_delete_hides_the_document() {
    let h = harness();
    let service = h.backend.rooms().handlers().service();
    let id = id_of(&service.create(room_doc("401")).unwrap()).unwrap();
    let actor = DocumentId::parse(SYSTEM_ACTOR).unwrap();
    let outcome = service.delete_by_id(&id, &actor).unwrap();
    assert_eq!(outcome.counts(), (1, 0));

    assert!(matches!(service.read_by_id(&id), Err(ServiceError::NotFound(ref n)) if n == "room"));
    assert!(service.read(&Query::default(), true).unwrap().is_empty());
    let raw = service.store().find_raw_by_id(&id).unwrap().unwrap();
    assert_eq!(raw.get_bool("deleted").unwrap(), true);
    assert_eq!(raw.get("deletedBy"), Some(&Bson::ObjectId(actor.0)));
    assert!(raw.get("deletedAt").is_some());
    assert_eq!(raw.get("updatedBy"), Some(&Bson::ObjectId(actor.0)));
    assert_eq!(raw.get("updatedAt"), raw.get("deletedAt"));
    assert_eq!(h.audit.count(AuditAction::Delete), 1);

    assert!(matches!(service.delete_by_id(&id, &actor), Err(ServiceError::NotFound(_))));
}

#[test]
fn delete_partitions_store_refusals() {
    let h = harness();
    let service = h.backend.rooms().handlers().service();
    service.create(room_doc("501")).unwrap();
    service.create(room_doc("502")).unwrap();
    h.rooms.fail_saves(true);
    let outcome = service.delete(&Query::default(), &DocumentId::new()).unwrap();
    assert_eq!(outcome.counts(), (0, 2));
    assert_eq!(h.audit.count(AuditAction::Delete), 0);
}

#[test]
fn read_applies_paging_only_when_limited() {
    let h = harness();
    let service = h.backend.rooms().handlers().service();
    for n in ["601", "602", "603"] {
        service.create(room_doc(n)).unwrap();
    }
    let q = compile(&parse_query_string("sort=-number&limit=2&skip=1"));
    let page = service.read(&q, true).unwrap();
    let numbers: Vec<&str> = page.iter().map(|d| d.get_str("number").unwrap()).collect();
    assert_eq!(numbers, ["602", "601"]);
    assert_eq!(service.read(&q, false).unwrap().len(), 3);
}

#[test]
fn audit_failures_do_not_fail_writes() {
    let h = harness();
    h.audit.set_failing(true);
    let service = h.backend.rooms().handlers().service();
    assert!(service.create(room_doc("701")).is_ok());
    assert!(h.audit.events().is_empty());
}
