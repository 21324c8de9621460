use dayledger_core::db::open_db_in_memory;
use dayledger_core::{
    ActivityEventType, EntryService, EntryType, FixedClock, ProfileService, ProfileServiceError,
    ProfileValidationError, TaskPriority, TaskStatus,
};
use rusqlite::Connection;
use uuid::Uuid;

const T0: i64 = 1_760_000_000_000;

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn active_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM profiles WHERE is_active = 1;",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn bootstrap_seeds_prototype_data() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(T0);
    let profiles = ProfileService::with_clock(&conn, &clock).unwrap();

    let active = profiles.bootstrap_prototype().unwrap();

    let listed = profiles.list().unwrap();
    let keys: Vec<_> = listed.iter().map(|profile| profile.key.as_str()).collect();
    assert_eq!(keys, vec!["work", "personal"]);
    assert_eq!(listed[0].id, active);
    assert!(listed[0].is_active);
    assert!(!listed[1].is_active);
    assert_eq!(listed[0].description, "Client projects and team delivery");
    assert_eq!(listed[1].description, "Life admin and personal routines");
    assert_eq!(profiles.get_active().unwrap().unwrap().id, active);

    assert_eq!(count(&conn, "entries"), 5);
    assert_eq!(count(&conn, "entry_activity"), 5);

    let entries = EntryService::with_clock(&conn, &clock).unwrap();
    let work_tasks = entries.list_by_type(active, EntryType::Task).unwrap();
    assert_eq!(work_tasks.len(), 2);
    let jwt = work_tasks
        .iter()
        .find(|entry| entry.title == "Investigate JWT issue in auth module")
        .unwrap();
    let task = jwt.task().unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.priority, Some(TaskPriority::High));
    assert!(task.blocked);
    assert_eq!(task.blocked_reason.as_deref(), Some("Token signature mismatch"));
    assert_eq!(task.due_at, Some(T0 + 6 * 60 * 60 * 1000));
    assert!(jwt.carry_over);
    assert_eq!(jwt.tags, vec!["auth".to_string(), "team".to_string()]);
    assert_eq!(
        jwt.content.as_deref(),
        Some("Pair with Priya and unblock team deadline.")
    );

    let personal = profiles.get_by_key("personal").unwrap().unwrap();
    let personal_entries = entries.list_by_profile(personal.id, false).unwrap();
    let book = personal_entries
        .iter()
        .find(|entry| entry.entry_type() == EntryType::Task)
        .unwrap();
    assert_eq!(book.content, None);
    let itinerary = personal_entries
        .iter()
        .find(|entry| entry.entry_type() == EntryType::Note)
        .unwrap();
    assert_eq!(
        itinerary.content.as_deref(),
        Some("Saturday morning trail, lunch at Cedar Cafe, evening movie.")
    );

    let feed = entries.profile_activity(active, None).unwrap();
    assert_eq!(feed.len(), 3);
    assert!(feed
        .iter()
        .all(|event| event.event_type == ActivityEventType::Created));
}

#[test]
fn bootstrap_twice_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let profiles = ProfileService::try_new(&conn).unwrap();

    let first = profiles.bootstrap_prototype().unwrap();
    let counts = (
        count(&conn, "profiles"),
        count(&conn, "entries"),
        count(&conn, "entry_activity"),
    );

    let second = profiles.bootstrap_prototype().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        counts,
        (
            count(&conn, "profiles"),
            count(&conn, "entries"),
            count(&conn, "entry_activity"),
        )
    );
}

#[test]
fn bootstrap_returns_current_active_profile() {
    let conn = open_db_in_memory().unwrap();
    let profiles = ProfileService::try_new(&conn).unwrap();
    profiles.bootstrap_prototype().unwrap();
    let personal = profiles.get_by_key("personal").unwrap().unwrap();

    profiles.set_active(personal.id).unwrap();
    assert_eq!(profiles.bootstrap_prototype().unwrap(), personal.id);
}

#[test]
fn bootstrap_heals_store_without_active_profile() {
    let conn = open_db_in_memory().unwrap();
    let profiles = ProfileService::try_new(&conn).unwrap();
    let later = profiles.create_profile("Later", None, "").unwrap();
    let first = profiles.create_profile("First", None, "").unwrap();
    conn.execute(
        "UPDATE profiles SET sort_order = -1 WHERE uuid = ?1;",
        [first.id.to_string()],
    )
    .unwrap();
    assert!(profiles.get_active().unwrap().is_none());

    let healed = profiles.bootstrap_prototype().unwrap();
    assert_eq!(healed, first.id);
    assert_ne!(healed, later.id);
    assert_eq!(active_count(&conn), 1);
    assert_eq!(count(&conn, "entries"), 0);
}

#[test]
fn set_active_keeps_exactly_one_active_profile() {
    let conn = open_db_in_memory().unwrap();
    let profiles = ProfileService::try_new(&conn).unwrap();
    profiles.bootstrap_prototype().unwrap();
    let extra = profiles.create_profile("Side Projects", None, "").unwrap();
    let ids: Vec<_> = profiles.list().unwrap().into_iter().map(|p| p.id).collect();

    for id in ids.iter().chain(ids.iter().rev()).chain([&extra.id, &extra.id]) {
        profiles.set_active(*id).unwrap();
        assert_eq!(active_count(&conn), 1);
        assert_eq!(profiles.get_active().unwrap().unwrap().id, *id);
    }
}

#[test]
fn set_active_unknown_profile_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let profiles = ProfileService::try_new(&conn).unwrap();
    let active = profiles.bootstrap_prototype().unwrap();

    let missing = Uuid::new_v4();
    let err = profiles.set_active(missing).unwrap_err();
    assert!(matches!(err, ProfileServiceError::ProfileNotFound(id) if id == missing));
    assert_eq!(profiles.get_active().unwrap().unwrap().id, active);
}

#[test]
fn create_profile_derives_key_and_ranks_last() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(T0);
    let profiles = ProfileService::with_clock(&conn, &clock).unwrap();
    profiles.bootstrap_prototype().unwrap();

    let created = profiles
        .create_profile("  Side Projects  ", None, " weekend hacking ")
        .unwrap();
    assert_eq!(created.name, "Side Projects");
    assert_eq!(created.key, "side-projects");
    assert_eq!(created.description, "weekend hacking");
    assert_eq!(created.sort_order, 2);
    assert_eq!(created.created_at, T0);
    assert!(!created.is_active);
    assert_eq!(profiles.get(created.id).unwrap(), created);
}

#[test]
fn create_profile_rejects_duplicate_and_invalid_keys() {
    let conn = open_db_in_memory().unwrap();
    let profiles = ProfileService::try_new(&conn).unwrap();
    profiles.bootstrap_prototype().unwrap();

    assert!(matches!(
        profiles.create_profile("Work again", Some("work"), ""),
        Err(ProfileServiceError::DuplicateKey(key)) if key == "work"
    ));
    assert!(matches!(
        profiles.create_profile("Bad", Some("Not A Slug"), ""),
        Err(ProfileServiceError::Validation(ProfileValidationError::InvalidKey(_)))
    ));
    assert!(matches!(
        profiles.create_profile("   ", None, ""),
        Err(ProfileServiceError::Validation(ProfileValidationError::EmptyName))
    ));
    assert!(matches!(
        profiles.create_profile("???", None, ""),
        Err(ProfileServiceError::Validation(ProfileValidationError::InvalidKey(_)))
    ));
    assert_eq!(count(&conn, "profiles"), 2);
}
