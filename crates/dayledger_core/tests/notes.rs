use dayledger_core::db::open_db_in_memory;
use dayledger_core::repo::note_repo::SqliteNoteRepository;
use dayledger_core::{FixedClock, NoteService, NoteServiceError};
use uuid::Uuid;

#[test]
fn create_defaults_content_and_stamps_both_times() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(1_000);
    let notes = NoteService::with_clock(SqliteNoteRepository::try_new(&conn).unwrap(), &clock);

    let note = notes.create(None).unwrap();
    assert_eq!(note.content, "");
    assert_eq!(note.created_at, 1_000);
    assert_eq!(note.updated_at, 1_000);
    assert_eq!(notes.get(note.id).unwrap(), note);
}

#[test]
fn update_replaces_content_and_reorders_list() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(1_000);
    let notes = NoteService::with_clock(SqliteNoteRepository::try_new(&conn).unwrap(), &clock);

    let first = notes.create(Some("first".to_string())).unwrap();
    clock.advance(10);
    let second = notes.create(Some("second".to_string())).unwrap();

    let listed: Vec<_> = notes.list().unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(listed, vec![second.id, first.id]);

    clock.advance(10);
    let updated = notes.update(first.id, "first, revised").unwrap();
    assert_eq!(updated.content, "first, revised");
    assert_eq!(updated.created_at, 1_000);
    assert_eq!(updated.updated_at, 1_020);

    let listed: Vec<_> = notes.list().unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(listed, vec![first.id, second.id]);
}

#[test]
fn unknown_note_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let missing = Uuid::new_v4();

    assert!(matches!(
        notes.update(missing, "x"),
        Err(NoteServiceError::NoteNotFound(id)) if id == missing
    ));
    assert!(matches!(
        notes.get(missing),
        Err(NoteServiceError::NoteNotFound(_))
    ));
}
