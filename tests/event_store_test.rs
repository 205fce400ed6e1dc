//! Интеграционные тесты хранилища событий и фасада выборок.
//!
//! Используют временный файл SQLite для изоляции тестов.

use chrono::NaiveDateTime;
use tempfile::TempDir;

use fsvigil::{EventSink, EventStore, EventType, FileEvent, QueryManager, StoreSink, TIMESTAMP_FORMAT};

fn temp_store() -> (TempDir, EventStore) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = EventStore::new(temp_dir.path().join("file_events.db"));
    (temp_dir, store)
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).expect("valid test timestamp")
}

fn event(name: &str, path: &str, event_type: EventType, timestamp: &str) -> FileEvent {
    FileEvent::new(name, path, event_type, ts(timestamp))
}

// ============================================================================
// Тесты записи и чтения
// ============================================================================

#[test]
fn test_save_then_query_all_roundtrips_exactly() {
    let (_guard, store) = temp_store();
    let original = event(
        "report.txt",
        "/home/user/docs/report.txt",
        EventType::Created,
        "2025-06-13 08:01:09",
    );

    store.save(&original).expect("save failed");
    let loaded = store.query_all().expect("query_all failed");

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], original);
    // Timestamp обязан воспроизводиться байт в байт.
    assert_eq!(loaded[0].formatted_timestamp(), "2025-06-13 08:01:09");
}

#[test]
fn test_query_all_preserves_insertion_order() {
    let (_guard, store) = temp_store();
    for name in ["first.txt", "second.txt", "third.txt"] {
        store
            .save(&event(name, "/w/a", EventType::Created, "2025-01-01 00:00:00"))
            .expect("save failed");
    }

    let names: Vec<String> = store
        .query_all()
        .expect("query_all failed")
        .iter()
        .map(|e| e.file_name().to_string())
        .collect();
    assert_eq!(names, ["first.txt", "second.txt", "third.txt"]);
}

#[test]
fn test_duplicates_are_kept_as_is() {
    let (_guard, store) = temp_store();
    let e = event("dup.txt", "/w/dup.txt", EventType::Modified, "2025-01-01 10:00:00");
    store.save(&e).expect("save failed");
    store.save(&e).expect("save failed");

    assert_eq!(store.query_all().expect("query_all failed").len(), 2);
}

#[test]
fn test_query_on_fresh_database_creates_schema() {
    let (_guard, store) = temp_store();
    // Файла БД ещё нет: первое же обращение создаёт схему.
    let events = store.query_all().expect("query_all failed");
    assert!(events.is_empty());
}

// ============================================================================
// Тесты фильтров
// ============================================================================

#[test]
fn test_query_by_extension_exact_match_only() {
    let (_guard, store) = temp_store();
    store
        .save(&event("a.txt", "/w/a.txt", EventType::Created, "2025-01-01 10:00:00"))
        .unwrap();
    store
        .save(&event("B.java", "/w/B.java", EventType::Created, "2025-01-01 10:00:01"))
        .unwrap();
    store
        .save(&event("c.txt", "/w/c.txt", EventType::Deleted, "2025-01-01 10:00:02"))
        .unwrap();

    let txt = store.query_by_extension(".txt").expect("query failed");
    assert_eq!(txt.len(), 2);
    assert!(txt.iter().all(|e| e.file_extension() == ".txt"));
}

#[test]
fn test_query_by_empty_extension_returns_everything() {
    let (_guard, store) = temp_store();
    store
        .save(&event("a.txt", "/w/a.txt", EventType::Created, "2025-01-01 10:00:00"))
        .unwrap();
    store
        .save(&event("Makefile", "/w/Makefile", EventType::Modified, "2025-01-01 10:00:01"))
        .unwrap();

    // Пустая строка — «все файлы», а не поиск пустого расширения.
    let all = store.query_all().expect("query_all failed");
    let by_empty = store.query_by_extension("").expect("query failed");
    assert_eq!(by_empty, all);
    assert_eq!(by_empty.len(), 2);
}

#[test]
fn test_query_by_event_type() {
    let (_guard, store) = temp_store();
    store
        .save(&event("a.txt", "/w/a.txt", EventType::Created, "2025-01-01 10:00:00"))
        .unwrap();
    store
        .save(&event("a.txt", "/w/a.txt", EventType::Deleted, "2025-01-01 10:00:05"))
        .unwrap();

    let deleted = store
        .query_by_event_type(EventType::Deleted)
        .expect("query failed");
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].event_type(), EventType::Deleted);
}

#[test]
fn test_query_by_date_range_bounds_are_inclusive() {
    let (_guard, store) = temp_store();
    for (name, stamp) in [
        ("early.txt", "2025-01-01 09:59:59"),
        ("lower.txt", "2025-01-01 10:00:00"),
        ("mid.txt", "2025-01-01 10:00:30"),
        ("upper.txt", "2025-01-01 10:01:00"),
        ("late.txt", "2025-01-01 10:01:01"),
    ] {
        store
            .save(&event(name, "/w/x", EventType::Created, stamp))
            .unwrap();
    }

    let hits = store
        .query_by_date_range(ts("2025-01-01 10:00:00"), ts("2025-01-01 10:01:00"))
        .expect("query failed");
    let names: Vec<&str> = hits.iter().map(|e| e.file_name()).collect();
    assert_eq!(names, ["lower.txt", "mid.txt", "upper.txt"]);
}

#[test]
fn test_query_by_directory_is_literal_prefix() {
    let (_guard, store) = temp_store();
    store
        .save(&event(
            "x.txt",
            "/home/user/sub/x.txt",
            EventType::Created,
            "2025-01-01 10:00:00",
        ))
        .unwrap();
    store
        .save(&event(
            "y.txt",
            "/home/userx/y.txt",
            EventType::Created,
            "2025-01-01 10:00:01",
        ))
        .unwrap();

    let hits = store.query_by_directory("/home/user").expect("query failed");
    // "/home/userx/..." тоже начинается с "/home/user" как строки — это
    // буквальный префикс, не разбиение по компонентам пути.
    assert_eq!(hits.len(), 2);

    let narrowed = store
        .query_by_directory("/home/user/")
        .expect("query failed");
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].path(), "/home/user/sub/x.txt");
}

#[test]
fn test_query_by_directory_treats_metacharacters_literally() {
    let (_guard, store) = temp_store();
    store
        .save(&event(
            "a.txt",
            "/data/100%done/a.txt",
            EventType::Created,
            "2025-01-01 10:00:00",
        ))
        .unwrap();
    store
        .save(&event(
            "b.txt",
            "/data/100Xdone/b.txt",
            EventType::Created,
            "2025-01-01 10:00:01",
        ))
        .unwrap();

    // '%' — не wildcard: совпасть должен только буквальный путь.
    let hits = store
        .query_by_directory("/data/100%")
        .expect("query failed");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path(), "/data/100%done/a.txt");
}

// ============================================================================
// Тесты очистки
// ============================================================================

#[test]
fn test_clear_is_idempotent() {
    let (_guard, store) = temp_store();
    store
        .save(&event("a.txt", "/w/a.txt", EventType::Created, "2025-01-01 10:00:00"))
        .unwrap();

    store.clear().expect("clear failed");
    assert!(store.query_all().expect("query_all failed").is_empty());

    // Повторная очистка пустой таблицы — no-op без ошибки.
    store.clear().expect("clear failed");
    assert!(store.query_all().expect("query_all failed").is_empty());

    // Схема не удалена: запись после очистки работает.
    store
        .save(&event("b.txt", "/w/b.txt", EventType::Created, "2025-01-01 11:00:00"))
        .expect("save after clear failed");
    assert_eq!(store.query_all().expect("query_all failed").len(), 1);
}

// ============================================================================
// Тесты фасада выборок
// ============================================================================

fn seeded_manager() -> (TempDir, QueryManager) {
    let (guard, store) = temp_store();
    let rows = [
        ("report.txt", "/w/report.txt", EventType::Created, "2025-01-01 10:00:00"),
        ("REPORT_final.txt", "/w/REPORT_final.txt", EventType::Modified, "2025-01-01 10:00:01"),
        ("notes.txt", "/w/notes.txt", EventType::Created, "2025-01-01 10:00:02"),
        ("Main.java", "/w/Main.java", EventType::Created, "2025-01-01 10:00:03"),
    ];
    for (name, path, ty, stamp) in rows {
        store.save(&event(name, path, ty, stamp)).unwrap();
    }
    (guard, QueryManager::new(store))
}

#[test]
fn test_search_without_criteria_returns_all() {
    let (_guard, manager) = seeded_manager();
    let hits = manager.search(None, None, None).expect("search failed");
    assert_eq!(hits.len(), 4);
}

#[test]
fn test_search_composes_all_criteria_with_and() {
    let (_guard, manager) = seeded_manager();
    let hits = manager
        .search(Some(".txt"), Some(EventType::Created), Some("report"))
        .expect("search failed");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file_name(), "report.txt");
}

#[test]
fn test_search_substring_is_case_insensitive() {
    let (_guard, manager) = seeded_manager();
    let hits = manager
        .search(Some(".txt"), None, Some("report"))
        .expect("search failed");
    let names: Vec<&str> = hits.iter().map(|e| e.file_name()).collect();
    // Порядок стабильный: как в выборке хранилища.
    assert_eq!(names, ["report.txt", "REPORT_final.txt"]);
}

#[test]
fn test_search_by_kind_only() {
    let (_guard, manager) = seeded_manager();
    let hits = manager
        .search(None, Some(EventType::Modified), None)
        .expect("search failed");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file_name(), "REPORT_final.txt");
}

// ============================================================================
// Тесты персистентного sink'а
// ============================================================================

#[test]
fn test_store_sink_persists_through_queue() {
    let (_guard, store) = temp_store();
    let sink = StoreSink::new(store.clone());

    let first = event("a.txt", "/w/a.txt", EventType::Created, "2025-01-01 10:00:00");
    let second = event("b.txt", "/w/b.txt", EventType::Deleted, "2025-01-01 10:00:01");
    sink.accept(&first);
    sink.accept(&second);

    // shutdown дописывает очередь и завершает writer — после него
    // содержимое БД детерминировано.
    sink.shutdown();

    let stored = store.query_all().expect("query_all failed");
    assert_eq!(stored, vec![first, second]);
}
