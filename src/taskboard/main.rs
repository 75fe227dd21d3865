use clap::Parser;
use directories::ProjectDirs;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::PathBuf;
use taskboard::api::BoardApi;
use taskboard::config::BoardConfig;
use taskboard::error::{BoardError, Result};
use taskboard::model::{Priority, TaskDraft};
use taskboard::persist::fs::FsBackend;
use taskboard::sanitize::{
    sanitize_column_data, sanitize_email, sanitize_input, sanitize_label_data,
    sanitize_task_data, SanitizeOptions, MAX_TITLE_LEN,
};
use taskboard::store::ColumnDisposal;
use taskboard::view::{FilterPatch, LabelFilter, SortKey};
use tracing_subscriber::EnvFilter;

mod args;
mod print;
use args::{Cli, ColumnCommand, Commands, LabelCommand, TaskCommand, TaskFields};
use print::{print_board, print_config, print_info, print_success, short_id};

const MAX_USER_LEN: usize = 64;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    api: BoardApi<FsBackend>,
    data_dir: PathBuf,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::Show {
            search,
            labels,
            priority,
            sort,
        }) => handle_show(&mut ctx, search, labels, priority, sort),
        Some(Commands::Column { action }) => handle_column(&mut ctx, action),
        Some(Commands::Task { action }) => handle_task(&mut ctx, action),
        Some(Commands::Label { action }) => handle_label(&mut ctx, action),
        Some(Commands::Export { output }) => handle_export(&ctx, output),
        Some(Commands::Import { file }) => handle_import(&mut ctx, file),
        Some(Commands::Reset) => handle_reset(&mut ctx),
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value),
        None => handle_show(&mut ctx, None, Vec::new(), None, None),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("taskboard=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => ProjectDirs::from("com", "taskboard", "taskboard")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| BoardError::Store("Could not determine data directory".into()))?,
    };

    let user = resolve_user(&cli.user)?;
    let config = BoardConfig::load(&data_dir)?;
    let backend = FsBackend::new(data_dir.clone());
    // Reset and import replace the whole board, so they must work on a damaged file.
    let api = if matches!(cli.command, Some(Commands::Reset | Commands::Import { .. })) {
        BoardApi::open_recovering(backend, &user, config)?
    } else {
        BoardApi::open(backend, &user, config)?
    };

    Ok(AppContext { api, data_dir })
}

/// Email addresses are normalized; anything else is treated as a display name.
fn resolve_user(raw: &str) -> Result<String> {
    if raw.contains('@') {
        return sanitize_email(raw).ok_or_else(|| {
            BoardError::validation("user", format!("'{}' is not a valid email address", raw))
        });
    }
    let name = sanitize_input(raw, &SanitizeOptions::max(MAX_USER_LEN));
    Ok(if name.is_empty() {
        "local".to_string()
    } else {
        name
    })
}

fn handle_show(
    ctx: &mut AppContext,
    search: Option<String>,
    labels: Vec<String>,
    priority: Option<Priority>,
    sort: Option<SortKey>,
) -> Result<()> {
    let label_ids: Vec<String> = labels.iter().map(|l| resolve_label(ctx, l)).collect();
    ctx.api.set_filter(FilterPatch {
        search: search.map(|s| sanitize_input(&s, &SanitizeOptions::max(MAX_TITLE_LEN))),
        label: (!label_ids.is_empty()).then(|| LabelFilter::from_ids(label_ids)),
        priority: priority.map(Some),
        sort,
    });
    print_board(&ctx.api.visible(), ctx.api.filter());
    Ok(())
}

fn handle_column(ctx: &mut AppContext, action: ColumnCommand) -> Result<()> {
    match action {
        ColumnCommand::Add { title } => {
            let patch = sanitize_column_data(&json!({ "title": title }));
            let title = patch.title.ok_or_else(|| empty_field("title"))?;
            let id = ctx.api.add_column(&title)?;
            print_success(&format!("Added column {} ({})", title, id));
        }
        ColumnCommand::Edit { id, title, order } => {
            let mut raw = Map::new();
            if let Some(title) = &title {
                raw.insert("title".into(), json!(title));
            }
            if let Some(order) = order {
                raw.insert("order".into(), json!(order));
            }
            let patch = sanitize_column_data(&Value::Object(raw));
            if title.is_some() && patch.title.is_none() {
                return Err(empty_field("title"));
            }
            if patch == Default::default() {
                return Err(nothing_to_change("column"));
            }
            let id = resolve_column(ctx, &id);
            let column = ctx.api.edit_column(&id, &patch)?;
            print_success(&format!(
                "Updated column {} ({}), position {}",
                column.title, column.id, column.order
            ));
        }
        ColumnCommand::Rm { id, move_to, .. } => {
            let id = resolve_column(ctx, &id);
            let disposal = match move_to {
                Some(target) => ColumnDisposal::RelocateTo(resolve_column(ctx, &target)),
                None => ColumnDisposal::DeleteTasks,
            };
            let count = ctx.api.delete_column(&id, &disposal)?;
            let detail = match &disposal {
                ColumnDisposal::RelocateTo(target) => {
                    format!("moved {} tasks to {}", count, target)
                }
                ColumnDisposal::DeleteTasks => format!("deleted {} tasks", count),
            };
            print_success(&format!("Deleted column {} ({})", id, detail));
        }
    }
    Ok(())
}

fn handle_task(ctx: &mut AppContext, action: TaskCommand) -> Result<()> {
    match action {
        TaskCommand::Add {
            column,
            title,
            fields,
        } => {
            let draft = task_draft(ctx, Some(title), fields)?;
            let column = resolve_column(ctx, &column);
            let id = ctx.api.add_task(&column, draft)?;
            print_success(&format!("Added task {} to {}", short_id(id.as_str()), column));
        }
        TaskCommand::Edit { id, title, fields } => {
            let id = resolve_task(ctx, &id)?;
            let draft = task_draft(ctx, title, fields)?;
            if draft.is_empty() {
                return Err(nothing_to_change("task"));
            }
            let task = ctx.api.edit_task(&id, &draft)?;
            print_success(&format!("Updated task {} {}", short_id(&id), task.title));
        }
        TaskCommand::Rm { id } => {
            let id = resolve_task(ctx, &id)?;
            let task = ctx.api.delete_task(&id)?;
            print_success(&format!("Deleted task {} {}", short_id(&id), task.title));
        }
        TaskCommand::Mv { id, column, index } => {
            let id = resolve_task(ctx, &id)?;
            let column = resolve_column(ctx, &column);
            let landed = ctx.api.move_task(&id, &column, index)?;
            print_success(&format!(
                "Moved task {} to {} at position {}",
                short_id(&id),
                column,
                landed
            ));
        }
        TaskCommand::Star { id } => {
            let id = resolve_task(ctx, &id)?;
            let starred = ctx.api.toggle_star(&id)?;
            let verb = if starred { "Starred" } else { "Unstarred" };
            print_success(&format!("{} task {}", verb, short_id(&id)));
        }
    }
    Ok(())
}

fn handle_label(ctx: &mut AppContext, action: LabelCommand) -> Result<()> {
    match action {
        LabelCommand::Add { name, color } => {
            let draft = sanitize_label_data(&json!({ "name": name, "color": color }));
            if draft.name.is_none() {
                return Err(empty_field("name"));
            }
            if draft.color.is_none() {
                return Err(bad_color(&color));
            }
            let id = ctx.api.add_label(&draft)?;
            print_success(&format!("Added label {} ({})", name.trim(), id));
        }
        LabelCommand::Edit { id, name, color } => {
            let mut raw = Map::new();
            if let Some(name) = &name {
                raw.insert("name".into(), json!(name));
            }
            if let Some(color) = &color {
                raw.insert("color".into(), json!(color));
            }
            let patch = sanitize_label_data(&Value::Object(raw));
            if name.is_some() && patch.name.is_none() {
                return Err(empty_field("name"));
            }
            if let (Some(color), None) = (&color, &patch.color) {
                return Err(bad_color(color));
            }
            if patch == Default::default() {
                return Err(nothing_to_change("label"));
            }
            let id = resolve_label(ctx, &id);
            let label = ctx.api.edit_label(&id, &patch)?;
            print_success(&format!("Updated label {} ({})", label.name, label.id));
        }
        LabelCommand::Rm { id } => {
            let id = resolve_label(ctx, &id);
            let count = ctx.api.delete_label(&id)?;
            print_success(&format!("Deleted label {} (removed from {} tasks)", id, count));
        }
        LabelCommand::Attach { task, label } => {
            let task = resolve_task(ctx, &task)?;
            let label = resolve_label(ctx, &label);
            if ctx.api.attach_label(&task, &label)? {
                print_success(&format!("Attached {} to task {}", label, short_id(&task)));
            } else {
                print_info(&format!("Task {} already has {}", short_id(&task), label));
            }
        }
        LabelCommand::Detach { task, label } => {
            let task = resolve_task(ctx, &task)?;
            let label = resolve_label(ctx, &label);
            if ctx.api.detach_label(&task, &label)? {
                print_success(&format!("Detached {} from task {}", label, short_id(&task)));
            } else {
                print_info(&format!("Task {} does not have {}", short_id(&task), label));
            }
        }
    }
    Ok(())
}

fn handle_export(ctx: &AppContext, output: Option<PathBuf>) -> Result<()> {
    let json = ctx.api.export_json()?;
    match output {
        Some(path) => {
            fs::write(&path, json)?;
            print_success(&format!("Exported board to {}", path.display()));
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn handle_import(ctx: &mut AppContext, file: PathBuf) -> Result<()> {
    let text = fs::read_to_string(&file)?;
    let count = ctx.api.import_json(&text)?;
    print_success(&format!("Imported {} tasks from {}", count, file.display()));
    Ok(())
}

fn handle_reset(ctx: &mut AppContext) -> Result<()> {
    ctx.api.reset()?;
    print_success("Board reset to default columns");
    Ok(())
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    match (key, value) {
        (None, _) => print_config(ctx.api.config()),
        (Some(key), None) => println!("{} = {}", key, ctx.api.config().get(&key)?),
        (Some(key), Some(value)) => {
            let mut config = ctx.api.config().clone();
            config.set(&key, &value)?;
            config.save(&ctx.data_dir)?;
            print_success(&format!("{} = {}", key, config.get(&key)?));
        }
    }
    Ok(())
}

/// Turns CLI flags into a raw record and runs it through the sanitizer. Values the
/// sanitizer had to drop are reported instead of silently ignored.
fn task_draft(ctx: &AppContext, title: Option<String>, fields: TaskFields) -> Result<TaskDraft> {
    let mut raw = Map::new();
    if let Some(title) = title {
        raw.insert("title".into(), json!(title));
    }
    if let Some(details) = fields.details {
        raw.insert("details".into(), json!(details));
    }
    if let Some(priority) = fields.priority {
        raw.insert("priority".into(), json!(priority.as_str()));
    }
    if let Some(rating) = fields.rating {
        raw.insert("rating".into(), json!(rating));
    }
    if !fields.labels.is_empty() {
        let labels: Vec<String> = fields.labels.iter().map(|l| resolve_label(ctx, l)).collect();
        raw.insert("labels".into(), json!(labels));
    }
    if let Some(status) = fields.status {
        raw.insert("status".into(), json!(status));
    }
    if let Some(due) = fields.due {
        raw.insert("dueDate".into(), json!(due));
    }

    let draft = sanitize_task_data(&Value::Object(raw.clone()));
    if raw.contains_key("title") && draft.title.is_none() {
        return Err(empty_field("title"));
    }
    if raw.contains_key("rating") && draft.rating.is_none() {
        return Err(BoardError::validation("rating", "must be a number"));
    }
    if raw.contains_key("dueDate") && draft.due_date.is_none() {
        return Err(BoardError::validation("due date", "must be YYYY-MM-DD"));
    }
    Ok(draft)
}

/// Accepts a full task id or a unique prefix of one.
fn resolve_task(ctx: &AppContext, raw: &str) -> Result<String> {
    let raw = raw.trim();
    let store = ctx.api.store();
    if store.task(raw).is_some() {
        return Ok(raw.to_string());
    }

    let mut matches = store
        .columns()
        .iter()
        .filter_map(|c| store.tasks_in(&c.id).ok())
        .flatten()
        .filter(|t| !raw.is_empty() && t.id.as_str().starts_with(raw))
        .map(|t| t.id.to_string());

    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => Err(BoardError::TaskNotFound(raw.to_string())),
        (Some(_), Some(_)) => Err(BoardError::validation(
            "task id",
            format!("'{}' matches more than one task", raw),
        )),
    }
}

/// Accepts a column id or title.
fn resolve_column(ctx: &AppContext, raw: &str) -> String {
    let raw = raw.trim();
    let store = ctx.api.store();
    if store.column(raw).is_some() {
        return raw.to_string();
    }
    store
        .columns()
        .iter()
        .find(|c| c.title.eq_ignore_ascii_case(raw))
        .map(|c| c.id.clone())
        .unwrap_or_else(|| raw.to_string())
}

/// Accepts a label id or name.
fn resolve_label(ctx: &AppContext, raw: &str) -> String {
    let raw = raw.trim();
    let store = ctx.api.store();
    if store.label(raw).is_some() {
        return raw.to_string();
    }
    store
        .labels()
        .iter()
        .find(|l| l.name.eq_ignore_ascii_case(raw))
        .map(|l| l.id.clone())
        .unwrap_or_else(|| raw.to_string())
}

fn empty_field(field: &str) -> BoardError {
    BoardError::validation(field, "must not be empty")
}

fn bad_color(color: &str) -> BoardError {
    BoardError::validation("color", format!("'{}' is not #RGB or #RRGGBB", color.trim()))
}

fn nothing_to_change(what: &str) -> BoardError {
    BoardError::validation(what, "nothing to change")
}
