use dayledger_core::db::open_db_in_memory;
use dayledger_core::repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
use dayledger_core::{
    ActivityEventType, EntryPatch, EntryService, EntryServiceError, EntryType,
    EntryValidationError, FixedClock, NewEntry, ProfileId, ProfileService, TaskPriority,
    TaskStatus, DAY_MS,
};
use rusqlite::Connection;
use uuid::Uuid;

const T0: i64 = 1_760_000_000_000;

fn setup() -> (Connection, FixedClock, ProfileId) {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(T0);
    let profile_id = ProfileService::with_clock(&conn, &clock)
        .unwrap()
        .create_profile("Work", None, "")
        .unwrap()
        .id;
    (conn, clock, profile_id)
}

fn activity_count(conn: &Connection, entry_id: Uuid) -> u64 {
    SqliteActivityRepository::try_new(conn)
        .unwrap()
        .count_for_entry(entry_id)
        .unwrap()
}

#[test]
fn create_task_defaults_and_logs_created() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();

    let id = service
        .create(NewEntry::new(profile_id, EntryType::Task, "  Ship release  "))
        .unwrap();

    let entry = service.get(id).unwrap();
    assert_eq!(entry.title, "Ship release");
    assert_eq!(entry.created_at, T0);
    assert_eq!(entry.updated_at, T0);
    let task = entry.task().unwrap();
    assert_eq!(task.status, TaskStatus::Todo);
    assert!(!task.blocked);
    assert_eq!(task.completed_at, None);
    assert!(entry.tags.is_empty());

    let events = service.activity(id, None).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, ActivityEventType::Created);
    assert_eq!(events[0].profile_id, profile_id);
}

#[test]
fn create_non_task_drops_task_fields() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();

    let mut request = NewEntry::new(profile_id, EntryType::Link, "Docs");
    request.status = Some(TaskStatus::Done);
    request.priority = Some(TaskPriority::High);
    request.blocked = Some(true);
    request.tags = Some(vec!["ref".to_string(), "api".to_string()]);
    let id = service.create(request).unwrap();

    let entry = service.get(id).unwrap();
    assert_eq!(entry.entry_type(), EntryType::Link);
    assert!(entry.task().is_none());
    assert_eq!(entry.tags, vec!["ref".to_string(), "api".to_string()]);

    let stored_status: Option<String> = conn
        .query_row(
            "SELECT task_status FROM entries WHERE uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored_status, None);
}

#[test]
fn create_done_task_stamps_completion() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();

    let mut request = NewEntry::new(profile_id, EntryType::Task, "Already done");
    request.status = Some(TaskStatus::Done);
    request.blocked_reason = Some("ignored without block".to_string());
    let id = service.create(request).unwrap();

    let task = service.get(id).unwrap().task().cloned().unwrap();
    assert_eq!(task.completed_at, Some(T0));
    assert_eq!(task.blocked_reason, None);
}

#[test]
fn create_rejects_blank_title_and_unknown_profile() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();

    let err = service
        .create(NewEntry::new(profile_id, EntryType::Note, "   "))
        .unwrap_err();
    assert!(matches!(
        err,
        EntryServiceError::Validation(EntryValidationError::EmptyTitle)
    ));

    let missing = Uuid::new_v4();
    let err = service
        .create(NewEntry::new(missing, EntryType::Note, "orphan"))
        .unwrap_err();
    assert!(matches!(err, EntryServiceError::ProfileNotFound(id) if id == missing));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn complete_then_reopen_resets_task_state() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();
    let mut request = NewEntry::new(profile_id, EntryType::Task, "Review PR");
    request.carry_over = true;
    request.blocked = Some(true);
    request.blocked_reason = Some("waiting".to_string());
    let id = service.create(request).unwrap();

    clock.advance(1_000);
    service.complete_task(id, true).unwrap();
    let done = service.get(id).unwrap();
    let task = done.task().unwrap();
    assert_eq!(task.status, TaskStatus::Done);
    assert_eq!(task.completed_at, Some(T0 + 1_000));
    assert!(!task.blocked);
    assert!(!done.carry_over);

    clock.advance(1_000);
    service.complete_task(id, false).unwrap();
    let reopened = service.get(id).unwrap();
    let task = reopened.task().unwrap();
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.completed_at, None);
    assert!(!task.blocked);
    assert_eq!(task.blocked_reason, None);
    assert!(!reopened.carry_over);
    assert_eq!(reopened.updated_at, T0 + 2_000);

    let events: Vec<_> = service
        .activity(id, None)
        .unwrap()
        .into_iter()
        .map(|event| event.event_type)
        .collect();
    assert_eq!(
        events,
        vec![
            ActivityEventType::Reopened,
            ActivityEventType::Completed,
            ActivityEventType::Created,
        ]
    );
}

#[test]
fn defer_pushes_due_date_and_sets_carry_over() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();
    let id = service
        .create(NewEntry::new(profile_id, EntryType::Task, "Write report"))
        .unwrap();

    assert_eq!(service.defer_task(id, Some(5)).unwrap(), 5);
    let entry = service.get(id).unwrap();
    assert_eq!(entry.task().unwrap().due_at, Some(T0 + 5 * DAY_MS));
    assert!(entry.carry_over);

    let latest = &service.activity(id, Some(1)).unwrap()[0];
    assert_eq!(latest.event_type, ActivityEventType::Deferred);
    assert_eq!(latest.note.as_deref(), Some("5 day defer"));
}

#[test]
fn defer_treats_zero_or_missing_days_as_one() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();
    let id = service
        .create(NewEntry::new(profile_id, EntryType::Task, "Call back"))
        .unwrap();

    assert_eq!(service.defer_task(id, Some(0)).unwrap(), 1);
    assert_eq!(
        service.get(id).unwrap().task().unwrap().due_at,
        Some(T0 + DAY_MS)
    );
    assert_eq!(service.defer_task(id, None).unwrap(), 1);
}

#[test]
fn defer_reopens_finished_task() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();
    let id = service
        .create(NewEntry::new(profile_id, EntryType::Task, "Renew domain"))
        .unwrap();
    service.complete_task(id, true).unwrap();

    service.defer_task(id, Some(2)).unwrap();
    let task = service.get(id).unwrap().task().cloned().unwrap();
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.completed_at, None);
}

#[test]
fn block_forces_in_progress_and_unblock_keeps_status() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();
    let id = service
        .create(NewEntry::new(profile_id, EntryType::Task, "Deploy"))
        .unwrap();

    service
        .set_blocked(id, true, Some("waiting".to_string()))
        .unwrap();
    let task = service.get(id).unwrap().task().cloned().unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
    assert!(task.blocked);
    assert_eq!(task.blocked_reason.as_deref(), Some("waiting"));
    let latest = &service.activity(id, Some(1)).unwrap()[0];
    assert_eq!(latest.event_type, ActivityEventType::Blocked);
    assert_eq!(latest.note.as_deref(), Some("waiting"));

    service.set_blocked(id, false, None).unwrap();
    let task = service.get(id).unwrap().task().cloned().unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
    assert!(!task.blocked);
    assert_eq!(task.blocked_reason, None);
}

#[test]
fn archive_round_trip_hides_entry_from_default_listing() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();
    let id = service
        .create(NewEntry::new(profile_id, EntryType::Snippet, "jq one-liner"))
        .unwrap();

    clock.advance(10);
    service.archive(id, true).unwrap();
    assert_eq!(service.get(id).unwrap().archived_at, Some(T0 + 10));
    assert!(service.list_by_profile(profile_id, false).unwrap().is_empty());
    assert_eq!(service.list_by_profile(profile_id, true).unwrap().len(), 1);

    service.archive(id, false).unwrap();
    assert_eq!(service.get(id).unwrap().archived_at, None);
    assert_eq!(service.list_by_profile(profile_id, false).unwrap().len(), 1);
    assert_eq!(activity_count(&conn, id), 3);
}

#[test]
fn task_only_operations_reject_non_task_without_writing() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();
    let id = service
        .create(NewEntry::new(profile_id, EntryType::Note, "Meeting notes"))
        .unwrap();
    let before = service.get(id).unwrap();

    let failures = [
        service.complete_task(id, true).unwrap_err(),
        service.complete_task(id, false).unwrap_err(),
        service.defer_task(id, Some(3)).unwrap_err(),
        service.set_blocked(id, true, None).unwrap_err(),
        service
            .update(
                id,
                EntryPatch {
                    priority: Some(TaskPriority::Low),
                    ..EntryPatch::default()
                },
            )
            .unwrap_err(),
    ];
    for err in failures {
        assert!(
            matches!(err, EntryServiceError::NotATask { entry_type: EntryType::Note, .. }),
            "unexpected error: {err}"
        );
    }

    assert_eq!(service.get(id).unwrap(), before);
    assert_eq!(activity_count(&conn, id), 1);
}

#[test]
fn failed_activity_append_rolls_back_the_entry_write() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();
    let mut request = NewEntry::new(profile_id, EntryType::Task, "Renew passport");
    request.due_at = Some(T0 + DAY_MS);
    let id = service.create(request).unwrap();
    let before = service.get(id).unwrap();

    conn.execute_batch(
        "CREATE TRIGGER reject_activity BEFORE INSERT ON entry_activity
         BEGIN SELECT RAISE(ABORT, 'activity log unavailable'); END;",
    )
    .unwrap();
    clock.set(T0 + 2 * DAY_MS);

    assert!(service.defer_task(id, Some(3)).is_err());
    assert!(service.complete_task(id, true).is_err());
    assert!(service.set_blocked(id, true, Some("waiting".into())).is_err());
    assert!(service.archive(id, true).is_err());
    assert!(service
        .update(
            id,
            EntryPatch {
                title: Some("Renew passport today".into()),
                ..EntryPatch::default()
            },
        )
        .is_err());
    assert!(service
        .create(NewEntry::new(profile_id, EntryType::Task, "Never stored"))
        .is_err());

    assert_eq!(service.get(id).unwrap(), before);
    assert_eq!(activity_count(&conn, id), 1);
    assert_eq!(service.list_by_profile(profile_id, true).unwrap().len(), 1);
}

#[test]
fn unknown_entry_is_not_found() {
    let (conn, clock, _) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.archive(missing, true),
        Err(EntryServiceError::EntryNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.get(missing),
        Err(EntryServiceError::EntryNotFound(_))
    ));
}

#[test]
fn update_patches_fields_and_keeps_completion_in_step() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();
    let id = service
        .create(NewEntry::new(profile_id, EntryType::Task, "Draft"))
        .unwrap();

    clock.advance(500);
    service
        .update(
            id,
            EntryPatch {
                title: Some(" Final ".to_string()),
                project: Some("q3".to_string()),
                status: Some(TaskStatus::Done),
                tags: Some(vec!["writing".to_string()]),
                ..EntryPatch::default()
            },
        )
        .unwrap();

    let entry = service.get(id).unwrap();
    assert_eq!(entry.title, "Final");
    assert_eq!(entry.project.as_deref(), Some("q3"));
    assert_eq!(entry.tags, vec!["writing".to_string()]);
    assert_eq!(entry.task().unwrap().completed_at, Some(T0 + 500));
    assert_eq!(entry.created_at, T0);
    assert_eq!(entry.updated_at, T0 + 500);

    service
        .update(
            id,
            EntryPatch {
                blocked_reason: Some("stale".to_string()),
                status: Some(TaskStatus::Todo),
                ..EntryPatch::default()
            },
        )
        .unwrap();
    let task = service.get(id).unwrap().task().cloned().unwrap();
    assert_eq!(task.completed_at, None);
    assert_eq!(task.blocked_reason, None);

    let err = service
        .update(
            id,
            EntryPatch {
                title: Some("  ".to_string()),
                ..EntryPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, EntryServiceError::Validation(_)));
    assert_eq!(activity_count(&conn, id), 3);
}

#[test]
fn list_by_type_is_newest_first_and_profile_scoped() {
    let (conn, clock, work) = setup();
    let home = ProfileService::with_clock(&conn, &clock)
        .unwrap()
        .create_profile("Home", None, "")
        .unwrap()
        .id;
    let service = EntryService::with_clock(&conn, &clock).unwrap();

    let first = service
        .create(NewEntry::new(work, EntryType::Task, "first"))
        .unwrap();
    clock.advance(1);
    service
        .create(NewEntry::new(work, EntryType::Note, "note"))
        .unwrap();
    let second = service
        .create(NewEntry::new(work, EntryType::Task, "second"))
        .unwrap();
    service
        .create(NewEntry::new(home, EntryType::Task, "elsewhere"))
        .unwrap();

    let ids: Vec<_> = service
        .list_by_type(work, EntryType::Task)
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(ids, vec![second, first]);
}

#[test]
fn every_successful_mutation_appends_exactly_one_event() {
    let (conn, clock, profile_id) = setup();
    let service = EntryService::with_clock(&conn, &clock).unwrap();
    let id = service
        .create(NewEntry::new(profile_id, EntryType::Task, "Count me"))
        .unwrap();

    service.update(id, EntryPatch::default()).unwrap();
    service.defer_task(id, Some(1)).unwrap();
    service.set_blocked(id, true, None).unwrap();
    service.set_blocked(id, false, None).unwrap();
    service.complete_task(id, true).unwrap();
    service.complete_task(id, false).unwrap();
    service.archive(id, true).unwrap();
    service.archive(id, false).unwrap();

    assert_eq!(activity_count(&conn, id), 9);
    let events = service.activity(id, None).unwrap();
    assert!(events.iter().all(|event| event.entry_id == id));
    assert!(events.iter().all(|event| event.profile_id == profile_id));
}
