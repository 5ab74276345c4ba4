use chrono::{TimeZone, Utc};
use visualtodo_core::{ImageRef, Todo, TodoId, TodoPatch, TodoValidationError};

#[test]
fn new_todo_sets_defaults() {
    let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
    let todo = Todo::new("  Buy milk ", now).unwrap();

    assert!(!todo.id.as_str().is_empty());
    assert_eq!(todo.text, "Buy milk");
    assert!(!todo.completed);
    assert_eq!(todo.completed_at, None);
    assert_eq!(todo.created_at, now);
    assert_eq!(todo.image, None);
    assert_eq!(todo.category, None);
}

#[test]
fn serialization_uses_camel_case_wire_fields() {
    let created = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
    let mut todo = Todo::with_id(TodoId::from("1700000000000"), "Hike", created).unwrap();
    todo.apply_patch(
        TodoPatch {
            image: Some(Some(ImageRef::from("https://images.test/hike.jpg"))),
            category: Some(Some("outdoors".to_string())),
            ..todo.toggle_patch(created)
        },
        created,
    );

    let json = serde_json::to_value(&todo).unwrap();
    assert_eq!(json["id"], "1700000000000");
    assert_eq!(json["text"], "Hike");
    assert_eq!(json["completed"], true);
    assert_eq!(json["image"], "https://images.test/hike.jpg");
    assert_eq!(json["createdAt"], "2026-02-01T12:00:00Z");
    assert_eq!(json["completedAt"], "2026-02-01T12:00:00Z");
    assert_eq!(json["category"], "outdoors");

    let decoded: Todo = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, todo);
}

#[test]
fn absent_optionals_are_omitted() {
    let todo = Todo::new("Buy milk", Utc::now()).unwrap();
    let json = serde_json::to_value(&todo).unwrap();
    let object = json.as_object().unwrap();

    assert!(!object.contains_key("image"));
    assert!(!object.contains_key("completedAt"));
    assert!(!object.contains_key("category"));
}

#[test]
fn decodes_records_written_by_browser_clients() {
    let value = serde_json::json!({
        "id": "1699999999999",
        "text": "Old",
        "completed": true,
        "createdAt": "2023-11-14T22:13:19.999Z",
        "completedAt": "2023-11-15T08:00:00.000Z",
        "image": "data:image/jpeg;base64,aGVsbG8="
    });

    let todo: Todo = serde_json::from_value(value).unwrap();
    assert_eq!(todo.id, TodoId::from("1699999999999"));
    assert!(todo.completed);
    assert!(todo.image.unwrap().is_inline());
}

#[test]
fn decode_rejects_completed_without_timestamp() {
    let value = serde_json::json!({
        "id": "x",
        "text": "Broken",
        "completed": true,
        "createdAt": "2026-01-01T00:00:00Z"
    });

    let err = serde_json::from_value::<Todo>(value).unwrap_err();
    assert!(
        err.to_string().contains("completed todo must carry completedAt"),
        "unexpected error: {err}"
    );
}

#[test]
fn decode_rejects_blank_text() {
    let value = serde_json::json!({
        "id": "x",
        "text": "  ",
        "completed": false,
        "createdAt": "2026-01-01T00:00:00Z"
    });

    assert!(serde_json::from_value::<Todo>(value).is_err());
}

#[test]
fn validate_rejects_stray_completion_timestamp() {
    let mut todo = Todo::new("Buy milk", Utc::now()).unwrap();
    todo.completed_at = Some(Utc::now());

    assert_eq!(
        todo.validate().unwrap_err(),
        TodoValidationError::UnexpectedCompletedAt
    );
}

#[test]
fn toggle_patch_round_trip_restores_open_state() {
    let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
    let mut todo = Todo::new("Buy milk", now).unwrap();

    todo.apply_patch(todo.toggle_patch(now), now);
    assert_eq!(todo.completed_at, Some(now));
    todo.apply_patch(todo.toggle_patch(now), now);

    assert!(!todo.completed);
    assert_eq!(todo.completed_at, None);
}
