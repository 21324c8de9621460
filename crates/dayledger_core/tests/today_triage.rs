use chrono::{FixedOffset, TimeZone, Utc};
use dayledger_core::db::open_db_in_memory;
use dayledger_core::{
    triage_tasks, DayWindow, Entry, EntryBody, EntryService, EntryServiceError, EntryType,
    FixedClock, NewEntry, ProfileService, TaskPriority, TaskState, TaskStatus, TodayService,
    DAY_MS,
};
use uuid::Uuid;

const HOUR_MS: i64 = 60 * 60 * 1000;

fn today_at(hour: u32) -> i64 {
    Utc.with_ymd_and_hms(2026, 3, 10, hour, 0, 0)
        .unwrap()
        .timestamp_millis()
}

fn task(title: &str, created_at: i64, configure: impl FnOnce(&mut Entry)) -> Entry {
    let mut entry = Entry::new(
        Uuid::new_v4(),
        EntryBody::Task(TaskState::new(TaskStatus::Todo)),
        title,
        created_at,
    )
    .unwrap();
    configure(&mut entry);
    entry
}

fn titles(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.title.as_str()).collect()
}

#[test]
fn scenario_lands_each_task_in_its_bucket() {
    let now = today_at(9);
    let yesterday = now - DAY_MS;
    let tasks = vec![
        task("A", 4, |e| e.task_mut().unwrap().due_at = Some(yesterday)),
        task("B", 3, |e| {
            e.task_mut().unwrap().due_at = Some(yesterday);
            e.carry_over = true;
        }),
        task("C", 2, |e| e.task_mut().unwrap().due_at = Some(today_at(10))),
        task("D", 1, |e| e.task_mut().unwrap().priority = Some(TaskPriority::Low)),
    ];

    let triage = triage_tasks(&tasks, DayWindow::containing(now, &Utc));

    assert_eq!(titles(&triage.overdue), vec!["A"]);
    assert_eq!(titles(&triage.carry_over), vec!["B"]);
    assert_eq!(titles(&triage.due_today), vec!["C"]);
    assert_eq!(titles(&triage.quick_wins), vec!["D"]);
}

#[test]
fn done_archived_and_non_task_entries_are_ignored() {
    let now = today_at(12);
    let mut note = Entry::new(Uuid::new_v4(), EntryBody::Note, "note", 0).unwrap();
    note.carry_over = true;
    let tasks = vec![
        task("done", 0, |e| {
            e.task_mut().unwrap().complete(1);
            e.carry_over = true;
        }),
        task("archived", 0, |e| {
            e.carry_over = true;
            e.archived_at = Some(5);
        }),
        note,
    ];

    let triage = triage_tasks(&tasks, DayWindow::containing(now, &Utc));
    assert!(triage.carry_over.is_empty());
    assert!(triage.overdue.is_empty());
    assert!(triage.due_today.is_empty());
    assert!(triage.quick_wins.is_empty());
}

#[test]
fn due_today_window_is_half_open_and_ignores_carry_over() {
    let now = today_at(9);
    let window = DayWindow::containing(now, &Utc);
    let tasks = vec![
        task("at-midnight", 0, |e| e.task_mut().unwrap().due_at = Some(window.start_ms)),
        task("carried", 0, |e| {
            e.task_mut().unwrap().due_at = Some(window.start_ms + HOUR_MS);
            e.carry_over = true;
        }),
        task("tomorrow", 0, |e| e.task_mut().unwrap().due_at = Some(window.end_ms)),
        task("no-due", 0, |_| {}),
    ];

    let triage = triage_tasks(&tasks, window);
    assert_eq!(titles(&triage.due_today), vec!["at-midnight", "carried"]);
    assert!(triage.overdue.is_empty());
}

#[test]
fn quick_wins_skip_blocked_and_cap_at_three() {
    let now = today_at(9);
    let low = |title: &str, blocked: bool| {
        task(title, 0, move |e| {
            let task = e.task_mut().unwrap();
            task.priority = Some(TaskPriority::Low);
            task.blocked = blocked;
        })
    };
    let tasks = vec![
        low("w1", false),
        low("blocked", true),
        low("w2", false),
        task("medium", 0, |e| e.task_mut().unwrap().priority = Some(TaskPriority::Medium)),
        low("w3", false),
        low("w4", false),
    ];

    let triage = triage_tasks(&tasks, DayWindow::containing(now, &Utc));
    assert_eq!(titles(&triage.quick_wins), vec!["w1", "w2", "w3"]);
}

#[test]
fn start_of_day_follows_the_supplied_time_zone() {
    // 01:00 UTC is still the previous day at UTC-05:00.
    let now = today_at(1);
    let eastern = FixedOffset::west_opt(5 * 3600).unwrap();
    let window = DayWindow::containing(now, &eastern);

    let expected = eastern
        .with_ymd_and_hms(2026, 3, 9, 0, 0, 0)
        .unwrap()
        .timestamp_millis();
    assert_eq!(window.start_ms, expected);
    assert_eq!(window.end_ms, expected + DAY_MS);

    let due = task("late", 0, |e| e.task_mut().unwrap().due_at = Some(today_at(0)));
    let in_utc = triage_tasks(std::slice::from_ref(&due), DayWindow::containing(now, &Utc));
    let in_eastern = triage_tasks(std::slice::from_ref(&due), window);
    assert_eq!(titles(&in_utc.due_today), vec!["late"]);
    assert_eq!(titles(&in_eastern.due_today), vec!["late"]);
    assert!(in_eastern.overdue.is_empty());
}

#[test]
fn store_backed_triage_enumerates_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(today_at(8));
    let profile_id = ProfileService::with_clock(&conn, &clock)
        .unwrap()
        .create_profile("Work", None, "")
        .unwrap()
        .id;
    let entries = EntryService::with_clock(&conn, &clock).unwrap();

    for title in ["oldest", "middle", "newest", "newest-same-ms"] {
        let mut request = NewEntry::new(profile_id, EntryType::Task, title);
        request.priority = Some(TaskPriority::Low);
        entries.create(request).unwrap();
        if title != "newest" {
            clock.advance(1_000);
        }
    }
    let archived = entries
        .create({
            let mut request = NewEntry::new(profile_id, EntryType::Task, "archived");
            request.priority = Some(TaskPriority::Low);
            request
        })
        .unwrap();
    entries.archive(archived, true).unwrap();

    let today = TodayService::with_clock(&conn, &clock).unwrap();
    let triage = today.today_in(profile_id, today_at(9), &Utc).unwrap();
    assert_eq!(
        titles(&triage.quick_wins),
        vec!["newest-same-ms", "newest", "middle"]
    );

    let err = today.today_in(Uuid::new_v4(), today_at(9), &Utc).unwrap_err();
    assert!(matches!(err, EntryServiceError::ProfileNotFound(_)));
}
