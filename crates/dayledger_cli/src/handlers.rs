//! Command dispatch: one handler per subcommand, JSON on stdout.

use crate::commands::{
    ActivityArgs, AddArgs, AddProfileArgs, BlockArgs, Commands, DeferArgs, ListArgs,
    ProfileArgs, UpdateArgs,
};
use dayledger_core::repo::note_repo::SqliteNoteRepository;
use dayledger_core::{
    EntryPatch, EntryService, NewEntry, NoteService, ProfileId, ProfileService, TodayService,
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::error::Error;

type CmdResult = Result<(), Box<dyn Error>>;

pub fn dispatch(conn: &Connection, command: Commands) -> CmdResult {
    match command {
        Commands::Bootstrap => {
            let profiles = ProfileService::try_new(conn)?;
            let active = profiles.bootstrap_prototype()?;
            print_json(&json!({ "active_profile_id": active }))
        }
        Commands::Profiles => print_json(&ProfileService::try_new(conn)?.list()?),
        Commands::Use(args) => {
            let profiles = ProfileService::try_new(conn)?;
            let profile = profiles
                .get_by_key(&args.key)?
                .ok_or_else(|| format!("no profile with key '{}'", args.key))?;
            profiles.set_active(profile.id)?;
            print_json(&profiles.get(profile.id)?)
        }
        Commands::AddProfile(args) => cmd_add_profile(conn, args),
        Commands::Add(args) => cmd_add(conn, args),
        Commands::Update(args) => cmd_update(conn, args),
        Commands::List(args) => cmd_list(conn, args),
        Commands::Today(args) => {
            let profile_id = resolve_profile(conn, &args)?;
            print_json(&TodayService::try_new(conn)?.today(profile_id)?)
        }
        Commands::Done(args) => {
            let entries = EntryService::try_new(conn)?;
            entries.complete_task(args.id, true)?;
            print_json(&entries.get(args.id)?)
        }
        Commands::Reopen(args) => {
            let entries = EntryService::try_new(conn)?;
            entries.complete_task(args.id, false)?;
            print_json(&entries.get(args.id)?)
        }
        Commands::Defer(args) => cmd_defer(conn, args),
        Commands::Block(args) => cmd_block(conn, args, true),
        Commands::Unblock(args) => cmd_block(conn, args, false),
        Commands::Archive(args) => {
            let entries = EntryService::try_new(conn)?;
            entries.archive(args.id, true)?;
            print_json(&entries.get(args.id)?)
        }
        Commands::Unarchive(args) => {
            let entries = EntryService::try_new(conn)?;
            entries.archive(args.id, false)?;
            print_json(&entries.get(args.id)?)
        }
        Commands::Activity(args) => cmd_activity(conn, args),
        Commands::Notes => print_json(&notes(conn)?.list()?),
        Commands::NoteAdd(args) => print_json(&notes(conn)?.create(args.content)?),
        Commands::NoteEdit(args) => print_json(&notes(conn)?.update(args.id, args.content)?),
    }
}

fn cmd_add_profile(conn: &Connection, args: AddProfileArgs) -> CmdResult {
    let profiles = ProfileService::try_new(conn)?;
    let profile = profiles.create_profile(&args.name, args.key.as_deref(), &args.description)?;
    print_json(&profile)
}

fn cmd_add(conn: &Connection, args: AddArgs) -> CmdResult {
    let profile_id = resolve_profile(conn, &args.profile)?;
    let mut request = NewEntry::new(profile_id, args.kind, args.title);
    request.content = args.content;
    request.project = args.project;
    request.carry_over = args.carry_over;
    request.tags = Some(args.tags);
    request.status = args.task.status;
    request.priority = args.task.priority;
    request.due_at = args.task.due_at;
    request.blocked = args.task.blocked;
    request.blocked_reason = args.task.blocked_reason;

    let entries = EntryService::try_new(conn)?;
    let id = entries.create(request)?;
    print_json(&entries.get(id)?)
}

fn cmd_update(conn: &Connection, args: UpdateArgs) -> CmdResult {
    let patch = EntryPatch {
        title: args.title,
        content: args.content,
        project: args.project,
        status: args.task.status,
        priority: args.task.priority,
        due_at: args.task.due_at,
        blocked: args.task.blocked,
        blocked_reason: args.task.blocked_reason,
        carry_over: args.carry_over,
        tags: args.tags,
    };
    let entries = EntryService::try_new(conn)?;
    entries.update(args.id, patch)?;
    print_json(&entries.get(args.id)?)
}

fn cmd_list(conn: &Connection, args: ListArgs) -> CmdResult {
    let profile_id = resolve_profile(conn, &args.profile)?;
    let entries = EntryService::try_new(conn)?;
    let items = match args.kind {
        Some(kind) if !args.all => entries.list_by_type(profile_id, kind)?,
        Some(kind) => entries
            .list_by_profile(profile_id, true)?
            .into_iter()
            .filter(|entry| entry.entry_type() == kind)
            .collect(),
        None => entries.list_by_profile(profile_id, args.all)?,
    };
    print_json(&items)
}

fn cmd_defer(conn: &Connection, args: DeferArgs) -> CmdResult {
    let entries = EntryService::try_new(conn)?;
    let days = entries.defer_task(args.id, args.days)?;
    print_json(&json!({ "days": days, "entry": entries.get(args.id)? }))
}

fn cmd_block(conn: &Connection, args: BlockArgs, blocked: bool) -> CmdResult {
    let entries = EntryService::try_new(conn)?;
    entries.set_blocked(args.id, blocked, args.reason)?;
    print_json(&entries.get(args.id)?)
}

fn cmd_activity(conn: &Connection, args: ActivityArgs) -> CmdResult {
    let entries = EntryService::try_new(conn)?;
    let events = match args.id {
        Some(entry_id) => entries.activity(entry_id, args.limit)?,
        None => {
            let profile_id = resolve_profile(conn, &args.profile)?;
            entries.profile_activity(profile_id, args.limit)?
        }
    };
    print_json(&events)
}

/// Explicit `--profile` key, else the active profile.
fn resolve_profile(conn: &Connection, args: &ProfileArgs) -> Result<ProfileId, Box<dyn Error>> {
    let profiles = ProfileService::try_new(conn)?;
    let profile = match args.profile.as_deref() {
        Some(key) => profiles
            .get_by_key(key)?
            .ok_or_else(|| format!("no profile with key '{key}'"))?,
        None => profiles
            .get_active()?
            .ok_or("no active profile; run `dayledger bootstrap` or `dayledger use <key>`")?,
    };
    Ok(profile.id)
}

fn notes(conn: &Connection) -> Result<NoteService<SqliteNoteRepository<'_>>, Box<dyn Error>> {
    Ok(NoteService::new(SqliteNoteRepository::try_new(conn)?))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
