use innkeep::controller::{Operation, Request};
use innkeep::envelope::StatusCode;
use innkeep::permissions::{JobTitle, Permission};
use innkeep::resources::Resource;
use serde_json::json;

use super::support::{employee, guest, harness, inserted_id, room};

fn reception() -> Vec<Permission> {
    vec![
        Permission::RegisterGuest,
        Permission::UpdateGuestInfo,
        Permission::CreateRoom,
        Permission::UpdateRoomInfo,
        Permission::UpdateRoomStatus,
        Permission::BookingARoom,
    ]
}

#[test]
fn resources_are_found_by_name() {
    let h = harness();
    for name in ["room", "guest", "employee"] {
        let r = h.backend.resource(name).unwrap();
        assert_eq!(r.handlers().service().name(), name);
    }
    assert!(h.backend.resource("booking").is_none());
}

#[test]
fn protected_routes_demand_a_caller() {
    let h = harness();
    let rooms = h.backend.resource("room").unwrap();
    let anonymous = rooms.dispatch(Operation::Create, &Request::new().with_body(room("1")));
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let guestless = Request::new().with_body(room("1")).granted([Permission::PostOrder]);
    assert_eq!(rooms.dispatch(Operation::Create, &guestless).status, StatusCode::FORBIDDEN);
    assert_eq!(h.rooms.calls(), 0);

    let allowed = Request::new().with_body(room("1")).granted([Permission::CreateRoom]);
    assert_eq!(rooms.dispatch(Operation::Create, &allowed).status, StatusCode::CREATED);
}

#[test]
fn reads_need_only_authentication() {
    let h = harness();
    let guests = h.backend.resource("guest").unwrap();
    assert_eq!(guests.dispatch(Operation::List, &Request::new()).status, StatusCode::UNAUTHORIZED);
    assert_eq!(guests.dispatch(Operation::List, &Request::new().granted([])).status, StatusCode::OK);
}

#[test]
fn room_info_patch_leaves_housekeeping_alone() {
    let h = harness();
    let rooms = h.backend.rooms();
    let id = inserted_id(rooms.handlers().create(&Request::new().with_body(room("210"))).data());

    let body = json!({ "floor": "3", "isClean": false, "occupancy": "occupied" });
    let handyman = Request::new().with_id(id.clone()).with_body(body).granted([Permission::UpdateRoomInfo]);
    assert_eq!(rooms.dispatch(Operation::PatchById, &handyman).status, StatusCode::FORBIDDEN);

    let resp = rooms.dispatch_info_patch(true, &handyman);
    assert_eq!(resp.status, StatusCode::OK);
    let updated = &resp.data()["updated"][0];
    assert_eq!(updated["floor"], "3");
    assert_eq!(updated["isClean"], true);
    assert_eq!(updated["occupancy"], "vacant");
}

#[test]
fn room_bulk_info_patch_uses_the_query() {
    let h = harness();
    let rooms = h.backend.rooms();
    rooms.handlers().create_many(&Request::new().with_body(json!([room("220"), room("221")])));
    let req = Request::new()
        .with_query("number=220")
        .with_body(json!({ "floor": "5", "isClean": false }))
        .granted([Permission::UpdateRoomInfo]);
    let resp = rooms.dispatch_info_patch(false, &req);
    assert_eq!(resp.body.message, "All matched rooms were updated successfully.");
    assert_eq!(resp.data()["updatedCount"], 1);
}

#[test]
fn guest_info_patch_cannot_touch_balance() {
    let h = harness();
    let guests = h.backend.guests();
    let created = guests.dispatch(
        Operation::Create,
        &Request::new().with_body(guest("Abebe", "ID-1", "0911000001")).granted(reception()),
    );
    assert_eq!(created.status, StatusCode::CREATED);
    let inserted = &created.data()["inserted"];
    assert_eq!(inserted["firstName"], "abebe");
    assert_eq!(inserted["balance"], 0.0);
    assert!(inserted["registeredAt"].is_string());

    let id = inserted_id(created.data());
    let req = Request::new()
        .with_id(id)
        .with_body(json!({ "balance": 500, "email": "ABEBE@example.com" }))
        .granted([Permission::UpdateGuestInfo]);
    let resp = guests.dispatch_info_patch(true, &req);
    let updated = &resp.data()["updated"][0];
    assert_eq!(updated["email"], "abebe@example.com");
    assert_eq!(updated["balance"], 0.0);
}

#[test]
fn guest_names_match_case_insensitively() {
    let h = harness();
    let handlers = h.backend.guests().handlers();
    handlers.create_many(&Request::new().with_body(json!([
        guest("Abebe", "ID-1", "0911000001"),
        guest("Sara", "ID-2", "0911000002"),
    ])));
    let resp = handlers.list(&Request::new().with_query("name=ABE"));
    assert_eq!(resp.data()["matchCount"], 1);
    assert_eq!(resp.data()["retrieved"][0]["firstName"], "abebe");
}

#[test]
fn employees_inherit_job_title_permissions() {
    let h = harness();
    let employees = h.backend.resource("employee").unwrap();
    let resp = employees.dispatch(Operation::Create, &Request::new().with_body(employee("Hana", "0922", "1234", "Cashier")));
    assert_eq!(resp.status, StatusCode::CREATED);
    let inserted = &resp.data()["inserted"];
    assert_eq!(inserted["jobTitle"], "cashier");
    let expected = h.backend.permissions().for_title(JobTitle::Cashier);
    assert_eq!(inserted["permissions"], json!(expected));
    assert!(inserted.get("code").is_none());
    assert!(inserted.get("password").is_none());
}

#[test]
fn explicit_employee_permissions_are_kept() {
    let h = harness();
    let mut body = employee("Dawit", "0933", "5678", "waiter");
    body["permissions"] = json!(["postOrder"]);
    let resp = h.backend.employees().create(&Request::new().with_body(body));
    assert_eq!(resp.data()["inserted"]["permissions"], json!(["postOrder"]));
}

#[test]
fn employee_bulk_create_fills_each_entry() {
    let h = harness();
    let body = json!([employee("A", "1", "1111", "chef"), employee("B", "2", "2222", "handyman")]);
    let resp = h.backend.employees().dispatch(Operation::CreateMany, &Request::new().with_body(body));
    assert_eq!(resp.data()["insertedCount"], 2);
    assert_eq!(resp.data()["inserted"][1]["permissions"], json!(["updateRoomInfo", "generateMyReport"]));
}

#[test]
fn permission_table_route() {
    let h = harness();
    let resp = h.backend.employees().permissions_by_job_title();
    assert_eq!(resp.body.message, "Permissions by job title retrieved successfully.");
    assert_eq!(resp.data()["retrieved"]["handyman"], json!(["updateRoomInfo", "generateMyReport"]));
    assert_eq!(resp.data()["retrieved"]["general manager"].as_array().unwrap().len(), Permission::ALL.len());
}
