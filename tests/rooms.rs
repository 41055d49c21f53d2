//! `join_room` / `leave_room` / `create_room` / `list_rooms` / `room_info`
//! (spec.md §4.4, §8 properties 8 and the room-name race rule).

mod common;

use std::sync::Mutex;

use serde_json::json;

#[tokio::test]
async fn default_room_cannot_be_left() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    common::insert_default_room(&db.store, "roo_default", "general");
    common::join(&db.store, "usr_a", "roo_default");
    let hub = roomcast::Hub::spawn();

    let err = common::call_err(
        &db.store,
        &hub,
        "usr_a",
        "leave_room",
        json!({"room_id": "roo_default"}),
    )
    .await;
    assert!(matches!(err, roomcast::error::AppError::Validation(_)));

    let still_member = roomcast::auth::is_room_member(&db.store, "usr_a", "roo_default")
        .await
        .unwrap();
    assert!(still_member);
}

#[tokio::test]
async fn create_room_rejects_duplicate_names() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    common::insert_user(&db.store, "usr_b", "bob");
    let hub = roomcast::Hub::spawn();

    common::call(&db.store, &hub, "usr_a", "create_room", json!({"name": "eng", "is_private": false}))
        .await;

    let err = common::call_err(
        &db.store,
        &hub,
        "usr_b",
        "create_room",
        json!({"name": "  eng  ", "is_private": false}),
    )
    .await;
    match err {
        roomcast::error::AppError::Conflict(_) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn create_room_trims_name_and_sets_current_room() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    let hub = roomcast::Hub::spawn();

    let outcome = common::call(
        &db.store,
        &hub,
        "usr_a",
        "create_room",
        json!({"name": "  design  ", "is_private": false}),
    )
    .await;
    let reply = outcome.reply.unwrap();
    assert_eq!(reply.data["room"]["name"], "design");
    assert!(outcome.set_current_room.is_some());
}

#[tokio::test]
async fn join_room_is_rejected_for_private_rooms_without_invitation() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    common::insert_channel(&db.store, "roo_secret", "secret", true);
    let hub = roomcast::Hub::spawn();

    let err = common::call_err(&db.store, &hub, "usr_a", "join_room", json!({"room_id": "roo_secret"}))
        .await;
    assert!(matches!(err, roomcast::error::AppError::Authorization(_)));
}

#[tokio::test]
async fn join_room_is_idempotent_for_public_rooms() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    common::insert_channel(&db.store, "roo_general", "general", false);
    let hub = roomcast::Hub::spawn();

    let first = common::call(&db.store, &hub, "usr_a", "join_room", json!({"room_id": "roo_general"}))
        .await
        .reply
        .unwrap();
    assert_eq!(first.data["joined"], true);

    let second = common::call(&db.store, &hub, "usr_a", "join_room", json!({"room_id": "roo_general"}))
        .await
        .reply
        .unwrap();
    assert_eq!(second.data["joined"], false);
}

#[tokio::test]
async fn list_rooms_filters_by_substring_and_excludes_private() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    common::insert_channel(&db.store, "roo_eng", "engineering", false);
    common::insert_channel(&db.store, "roo_design", "design", false);
    common::insert_channel(&db.store, "roo_secret", "secret-engineering", true);
    let hub = roomcast::Hub::spawn();

    let result = common::call(&db.store, &hub, "usr_a", "list_rooms", json!({"query": "eng"}))
        .await
        .reply
        .unwrap();
    let names: Vec<String> = result.data["rooms"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["engineering"]);
}

#[tokio::test]
async fn leaving_the_currently_viewed_room_resets_it_to_the_default_room() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    common::insert_default_room(&db.store, "roo_default", "general");
    common::insert_channel(&db.store, "roo_eng", "engineering", false);
    common::join(&db.store, "usr_a", "roo_default");
    common::join(&db.store, "usr_a", "roo_eng");
    let hub = roomcast::Hub::spawn();

    let current_room = Mutex::new(Some("roo_eng".to_string()));
    let outcome = common::call_in_room(
        &db.store,
        &hub,
        "usr_a",
        "leave_room",
        json!({"room_id": "roo_eng"}),
        &current_room,
    )
    .await;
    assert_eq!(outcome.set_current_room, Some(Some("roo_default".to_string())));
}

#[tokio::test]
async fn leaving_a_room_other_than_the_one_being_viewed_leaves_current_room_untouched() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    common::insert_default_room(&db.store, "roo_default", "general");
    common::insert_channel(&db.store, "roo_eng", "engineering", false);
    common::join(&db.store, "usr_a", "roo_default");
    common::join(&db.store, "usr_a", "roo_eng");
    let hub = roomcast::Hub::spawn();

    let current_room = Mutex::new(Some("roo_default".to_string()));
    let outcome = common::call_in_room(
        &db.store,
        &hub,
        "usr_a",
        "leave_room",
        json!({"room_id": "roo_eng"}),
        &current_room,
    )
    .await;
    assert_eq!(outcome.set_current_room, None);
}

#[tokio::test]
async fn room_info_requires_membership_and_lists_members() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    common::insert_user(&db.store, "usr_b", "bob");
    common::insert_channel(&db.store, "roo_general", "general", false);
    common::join(&db.store, "usr_a", "roo_general");
    common::join(&db.store, "usr_b", "roo_general");
    let hub = roomcast::Hub::spawn();

    let info = common::call(&db.store, &hub, "usr_a", "room_info", json!({"room_id": "roo_general"}))
        .await
        .reply
        .unwrap();
    assert_eq!(info.data["member_count"], 2);

    common::insert_user(&db.store, "usr_outsider", "mallory");
    let err = common::call_err(
        &db.store,
        &hub,
        "usr_outsider",
        "room_info",
        json!({"room_id": "roo_general"}),
    )
    .await;
    assert!(matches!(err, roomcast::error::AppError::Authorization(_)));
}
