use innkeep::controller::{Operation, Request};
use innkeep::envelope::{ErrorType, StatusCode};
use innkeep::resources::Resource;
use innkeep::types::SYSTEM_ACTOR;
use serde_json::{Value, json};

use super::support::{harness, inserted_id, room};

#[test]
fn create_many_with_a_duplicate_reports_both_sides() {
    let h = harness();
    let body = json!([room("101"), room("102"), room("101"), room("104"), room("105")]);
    let resp = h.backend.rooms().handlers().create_many(&Request::new().with_body(body));
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body.message, "Some rooms were inserted, while others were rejected.");
    let data = resp.data();
    assert_eq!(data["insertedCount"], 4);
    assert_eq!(data["notInsertedCount"], 1);
    assert_eq!(data["notInserted"][0]["document"]["number"], "101");
    assert_eq!(data["notInserted"][0]["reason"], "duplicate key error dup key: { number: \"101\" }");
}

#[test]
fn create_many_outcome_messages() {
    let h = harness();
    let handlers = h.backend.rooms().handlers();

    let all = handlers.create_many(&Request::new().with_body(json!([room("1"), room("2")])));
    assert_eq!(all.body.message, "All rooms were inserted successfully.");

    let none = handlers.create_many(&Request::new().with_body(json!([room("1")])));
    assert_eq!(none.status, StatusCode::OK);
    assert_eq!(none.body.message, "None of the rooms could be inserted.");

    let empty = handlers.create_many(&Request::new().with_body(json!([])));
    assert_eq!(empty.body.message, "No rooms were provided for insertion.");
}

#[test]
fn create_stamps_actor_and_hides_sensitive_fields() {
    let h = harness();
    let actor = "65ba85fd7e2eb77ce3f67a0d";
    let mut body = room("110");
    body["requesterId"] = json!(actor);
    let resp = h.backend.rooms().handlers().create(&Request::new().with_body(body));
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body.message, "Room inserted successfully.");
    let inserted = &resp.data()["inserted"];
    assert_eq!(inserted["createdBy"], actor);
    assert!(inserted["createdAt"].is_string());
    assert!(inserted.get("requesterId").is_none());
    assert!(inserted.get("deleted").is_none());
}

#[test]
fn malformed_actor_is_an_invalid_identifier() {
    let h = harness();
    let mut body = room("111");
    body["requesterId"] = json!("nope");
    let resp = h.backend.rooms().handlers().create(&Request::new().with_body(body));
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(h.rooms.calls(), 0);
}

#[test]
fn invalid_path_id_never_reaches_the_store() {
    let h = harness();
    let handlers = h.backend.rooms().handlers();
    for op in [Operation::Get, Operation::PatchById, Operation::DeleteById] {
        let req = Request::new().with_id("abc").with_body(json!({ "floor": "2" }));
        let resp = handlers.handle(op, &req);
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{op}");
        let errors = resp.body.errors.as_ref().unwrap();
        assert_eq!(errors[0].kind, ErrorType::BadRequest);
        assert_eq!(errors[0].details.as_ref().unwrap()["value"], "abc");
    }
    assert_eq!(h.rooms.calls(), 0);
}

#[test]
fn validation_errors_list_fields() {
    let h = harness();
    let resp = h.backend.rooms().handlers().create(&Request::new().with_body(json!({ "number": "9", "type": "attic" })));
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> =
        resp.body.errors.as_ref().unwrap().iter().filter_map(|e| e.field.as_deref()).collect();
    assert!(fields.contains(&"type"));
    assert!(fields.contains(&"floor"));
    assert!(fields.contains(&"occupancy"));
}

#[test]
fn duplicate_create_is_a_conflict() {
    let h = harness();
    let handlers = h.backend.rooms().handlers();
    handlers.create(&Request::new().with_body(room("120")));
    let resp = handlers.create(&Request::new().with_body(room("120")));
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body.message, "The specified value for the field number: 120 already exists.");
}

#[test]
fn list_and_get() {
    let h = harness();
    let handlers = h.backend.rooms().handlers();
    let created = handlers.create(&Request::new().with_body(room("130")));
    handlers.create(&Request::new().with_body(room("131")));
    let id = inserted_id(created.data());

    let list = handlers.list(&Request::new().with_query("sort=-number&select=number"));
    assert_eq!(list.body.message, "Rooms retrieved successfully.");
    assert_eq!(list.data()["matchCount"], 2);
    assert_eq!(list.data()["retrieved"][0], json!({ "_id": list.data()["retrieved"][0]["_id"], "number": "131" }));

    let one = handlers.get(&Request::new().with_id(id.clone()));
    assert_eq!(one.body.message, "Room retrieved successfully.");
    assert_eq!(one.data()["retrieved"]["_id"], Value::String(id));
}

#[test]
fn missing_document_is_not_found() {
    let h = harness();
    let resp = h.backend.rooms().handlers().get(&Request::new().with_id("65ba85fd7e2eb77ce3f67a0e"));
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body.errors.unwrap()[0].message, "The requested room could not be found.");
}

#[test]
fn patch_messages_cover_each_outcome() {
    let h = harness();
    let handlers = h.backend.rooms().handlers();
    handlers.create_many(&Request::new().with_body(json!([room("140"), room("141")])));
    let patch = |query: &str, body: Value| handlers.patch(&Request::new().with_query(query).with_body(body));

    let none = patch("floor=9", json!({ "isClean": false }));
    assert_eq!(none.body.message, "No rooms matched for the update.");

    let all = patch("floor=1", json!({ "isClean": false }));
    assert_eq!(all.body.message, "All matched rooms were updated successfully.");
    assert_eq!(all.data()["updatedCount"], 2);

    let same = patch("floor=1", json!({ "isClean": false }));
    assert_eq!(same.body.message, "All matched rooms already contain the same data as the new data. No changes were made.");
    assert_eq!(same.data()["notUpdatedCount"], 2);

    patch("number=140", json!({ "isClean": true }));
    let mixed = patch("floor=1", json!({ "isClean": false }));
    assert_eq!(
        mixed.body.message,
        "Some matched rooms were updated, while others already contain the same data as the new data."
    );
    assert_eq!(mixed.data()["updatedCount"], 1);
    assert_eq!(mixed.data()["notUpdatedCount"], 1);
}

#[test]
fn patch_by_id_messages_and_stamps() {
    let h = harness();
    let handlers = h.backend.rooms().handlers();
    let id = inserted_id(handlers.create(&Request::new().with_body(room("150"))).data());

    let changed = handlers.patch_by_id(&Request::new().with_id(id.clone()).with_body(json!({ "floor": "4" })));
    assert_eq!(changed.body.message, "Room updated successfully.");
    let updated = &changed.data()["updated"][0];
    assert_eq!(updated["floor"], "4");
    assert_eq!(updated["updatedBy"], SYSTEM_ACTOR);

    let same = handlers.patch_by_id(&Request::new().with_id(id).with_body(json!({ "floor": "4" })));
    assert_eq!(same.body.message, "No changes were made because the provided data is the same as the current data.");
}

#[test]
fn patches_leave_creation_stamps_alone() {
    let h = harness();
    let handlers = h.backend.rooms().handlers();
    let created = handlers.create(&Request::new().with_body(room("900")));
    let original = created.data()["inserted"].clone();
    let id = inserted_id(created.data());

    let forged = json!({
        "createdBy": "65ba85fd7e2eb77ce3f67aff",
        "createdAt": "1999-01-01",
        "deletedAt": "1999-01-01",
        "floor": "6",
    });
    let resp = handlers.patch_by_id(&Request::new().with_id(id.clone()).with_body(forged));
    assert_eq!(resp.body.message, "Room updated successfully.");
    let updated = &resp.data()["updated"][0];
    assert_eq!(updated["floor"], "6");
    assert_eq!(updated["createdBy"], SYSTEM_ACTOR);
    assert_eq!(updated["createdAt"], original["createdAt"]);
    assert!(updated.get("deletedAt").is_none());

    h.rooms.reset();
    let only_stamps = json!({ "createdBy": "65ba85fd7e2eb77ce3f67aff", "createdAt": "1999-01-01" });
    let rejected = handlers.patch_by_id(&Request::new().with_id(id).with_body(only_stamps));
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(h.rooms.calls(), 0);
}

#[test]
fn empty_patches_are_rejected_before_the_store() {
    let h = harness();
    let handlers = h.backend.rooms().handlers();
    let body = json!({ "requesterId": SYSTEM_ACTOR, "deleted": true });
    let bulk = handlers.patch(&Request::new().with_body(body.clone()));
    assert_eq!(bulk.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        bulk.body.errors.unwrap()[0].message,
        "No update data was provided. Please provide data to update the rooms."
    );
    let one = handlers.patch_by_id(&Request::new().with_id(SYSTEM_ACTOR).with_body(body));
    assert_eq!(
        one.body.errors.unwrap()[0].message,
        "No update data was provided. Please provide data to update the room."
    );
    assert_eq!(h.rooms.calls(), 0);
}

#[test]
fn delete_messages_cover_each_outcome() {
    let h = harness();
    let handlers = h.backend.rooms().handlers();
    handlers.create_many(&Request::new().with_body(json!([room("160"), room("161")])));

    let none = handlers.delete(&Request::new().with_query("floor=9"));
    assert_eq!(none.body.message, "No rooms matched for the deletion.");

    h.rooms.fail_saves(true);
    let refused = handlers.delete(&Request::new().with_query("floor=1"));
    assert_eq!(refused.body.message, "None of the matched rooms could be deleted.");
    assert_eq!(refused.data()["notDeletedCount"], 2);
    h.rooms.fail_saves(false);

    h.rooms.refuse_next_saves(1);
    let some = handlers.delete(&Request::new().with_query("floor=1"));
    assert_eq!(some.body.message, "Some matched rooms were deleted, but not all, due to some reason.");
    assert_eq!(some.data()["deletedCount"], 1);
    assert_eq!(some.data()["notDeletedCount"], 1);

    let all = handlers.delete(&Request::new().with_query("floor=1"));
    assert_eq!(all.body.message, "All matched rooms were deleted successfully.");
    assert_eq!(all.data()["deletedCount"], 1);
    assert!(all.data()["deleted"][0].get("deleted").is_none());
}

#[test]
fn delete_by_id_then_lookup_fails() {
    let h = harness();
    let handlers = h.backend.rooms().handlers();
    let id = inserted_id(handlers.create(&Request::new().with_body(room("170"))).data());
    let resp = handlers.delete_by_id(&Request::new().with_id(id.clone()));
    assert_eq!(resp.body.message, "Room deleted successfully.");
    assert_eq!(handlers.get(&Request::new().with_id(id.clone())).status, StatusCode::NOT_FOUND);
    assert_eq!(handlers.delete_by_id(&Request::new().with_id(id)).status, StatusCode::NOT_FOUND);
}
