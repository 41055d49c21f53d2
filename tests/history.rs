//! `history` pagination (spec.md §4.4, §8 property 6, scenario S4).

mod common;

use serde_json::json;

#[tokio::test]
async fn pages_without_overlap_or_gaps() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    common::insert_channel(&db.store, "roo_general", "general", false);
    common::join(&db.store, "usr_a", "roo_general");
    let hub = roomcast::Hub::spawn();

    // Ten messages t0..t9, sent in order so created_at is strictly
    // increasing (nanosecond-precision timestamps per spec.md §3).
    let mut bodies = Vec::new();
    for i in 0..10 {
        let body = format!("msg-{i}");
        common::call(
            &db.store,
            &hub,
            "usr_a",
            "message",
            json!({"body": body, "room_id": "roo_general"}),
        )
        .await;
        bodies.push(format!("msg-{i}"));
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let page1 = common::call(
        &db.store,
        &hub,
        "usr_a",
        "history",
        json!({"room_id": "roo_general", "limit": 3}),
    )
    .await
    .reply
    .unwrap();
    let msgs1: Vec<String> = page1.data["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(msgs1, vec!["msg-9", "msg-8", "msg-7"]);
    assert_eq!(page1.data["has_more"], true);
    let cursor = page1.data["next_cursor"].as_str().unwrap().to_string();

    let page2 = common::call(
        &db.store,
        &hub,
        "usr_a",
        "history",
        json!({"room_id": "roo_general", "limit": 3, "cursor": cursor}),
    )
    .await
    .reply
    .unwrap();
    let msgs2: Vec<String> = page2.data["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(msgs2, vec!["msg-6", "msg-5", "msg-4"]);

    let seen: std::collections::HashSet<_> = msgs1.iter().chain(msgs2.iter()).collect();
    assert_eq!(seen.len(), 6, "no message should appear on both pages");
}

#[tokio::test]
async fn excludes_deleted_messages() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    common::insert_channel(&db.store, "roo_general", "general", false);
    common::join(&db.store, "usr_a", "roo_general");
    let hub = roomcast::Hub::spawn();

    let sent = common::call(
        &db.store,
        &hub,
        "usr_a",
        "message",
        json!({"body": "will be deleted", "room_id": "roo_general"}),
    )
    .await;
    let message_id = sent.reply.unwrap().data["message"]["id"].as_str().unwrap().to_string();
    common::call(&db.store, &hub, "usr_a", "delete_message", json!({"message_id": message_id}))
        .await;

    let history = common::call(
        &db.store,
        &hub,
        "usr_a",
        "history",
        json!({"room_id": "roo_general", "limit": 10}),
    )
    .await
    .reply
    .unwrap();
    assert_eq!(history.data["messages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn rejects_out_of_range_limit() {
    let db = common::test_db();
    common::insert_user(&db.store, "usr_a", "alice");
    common::insert_channel(&db.store, "roo_general", "general", false);
    common::join(&db.store, "usr_a", "roo_general");
    let hub = roomcast::Hub::spawn();

    let err = common::call_err(
        &db.store,
        &hub,
        "usr_a",
        "history",
        json!({"room_id": "roo_general", "limit": 0}),
    )
    .await;
    assert!(matches!(err, roomcast::error::AppError::Validation(_)));

    let err = common::call_err(
        &db.store,
        &hub,
        "usr_a",
        "history",
        json!({"room_id": "roo_general", "limit": 101}),
    )
    .await;
    assert!(matches!(err, roomcast::error::AppError::Validation(_)));
}
