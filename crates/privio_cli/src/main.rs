use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use privio_cli::cli::{Cli, Command, collect_config_overrides};
use privio_cli::render;
use privio_core::TaskController;
use privio_core::config::{self, Config};
use privio_core::error::AppError;
use privio_core::model::{Task, TaskDraft, TaskUpdate};
use privio_core::storage::{FileBackend, TaskStore};
use privio_core::task_utils::local_now;
use privio_core::validate::{parse_due_date, validate_draft, validate_fields};
use std::io::{self, BufRead};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    // Quiet by default; RUST_LOG=debug shows every mutation.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_base_config() -> Config {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "ignoring unreadable config");
    }
    loaded.config
}

fn resolve_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let overrides = collect_config_overrides(raw_overrides).map_err(AppError::invalid_input)?;
    Ok(config::merge_overrides(&load_base_config(), &overrides))
}

fn open_controller(config: &Config) -> Result<TaskController, AppError> {
    let store_dir = config.resolve_store_dir()?;
    tracing::debug!(store_dir = %store_dir.display(), "opening task store");
    let store = TaskStore::new(FileBackend::new(store_dir));
    Ok(TaskController::with_filter(store, config.initial_filter()))
}

fn parse_optional_due(raw: Option<&str>) -> Result<Option<OffsetDateTime>, AppError> {
    match raw {
        Some(value) if !value.trim().is_empty() => parse_due_date(value).map(Some),
        _ => Ok(None),
    }
}

fn print_task(verb: &str, task: &Task, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", render::to_json(task)?);
    } else {
        println!("{verb} task: {} ({})", task.title, task.id);
    }
    Ok(())
}

fn print_outcome(verb: &str, id: &str, task: Option<Task>, json: bool) -> Result<(), AppError> {
    match task {
        Some(task) => print_task(verb, &task, json),
        None if json => {
            println!("null");
            Ok(())
        }
        None => {
            println!("Task not found: {id}");
            Ok(())
        }
    }
}

fn print_visible(controller: &TaskController, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", render::to_json(controller.visible_tasks())?);
    } else {
        println!(
            "{}",
            render::render_task_table(controller.visible_tasks(), local_now())?
        );
    }
    Ok(())
}

fn run_command(
    controller: &mut TaskController,
    config: &Config,
    command: Command,
    json: bool,
) -> Result<(), AppError> {
    match command {
        Command::Add {
            title,
            description,
            due,
            priority,
        } => {
            let title = title.unwrap_or_default();
            validate_draft(&title, &description, due.as_deref()).into_result()?;
            let draft = TaskDraft::new(title)
                .description(description)
                .due_date(parse_optional_due(due.as_deref())?)
                .priority(priority.unwrap_or_else(|| config.priority_or_default()));

            let task = controller.create(draft);
            print_task("Added", &task, json)?;
        }
        Command::Edit {
            id,
            title,
            description,
            due,
            clear_due,
            priority,
        } => {
            validate_fields(title.as_deref(), description.as_deref(), due.as_deref())
                .into_result()?;
            let due_date = match due.as_deref() {
                _ if clear_due => Some(None),
                Some(raw) if raw.trim().is_empty() => {
                    return Err(AppError::invalid_input(
                        "--due cannot be blank, use --clear-due to remove the due date",
                    ));
                }
                Some(raw) => Some(Some(parse_due_date(raw)?)),
                None => None,
            };
            let update = TaskUpdate {
                title,
                description,
                due_date,
                priority,
                completed: None,
            };
            if update.is_empty() {
                return Err(AppError::invalid_input("nothing to update"));
            }

            let task = controller.update(&id, update);
            print_outcome("Updated", &id, task, json)?;
        }
        Command::Delete { id } => {
            let task = controller.delete(&id);
            print_outcome("Deleted", &id, task, json)?;
        }
        Command::Toggle { id } => {
            let task = controller.toggle_completion(&id);
            let verb = match task.as_ref() {
                Some(task) if task.completed => "Completed",
                _ => "Reopened",
            };
            print_outcome(verb, &id, task, json)?;
        }
        Command::List {
            priority,
            search,
            all,
        } => {
            if priority.is_some() {
                controller.set_priority_filter(priority);
            }
            if let Some(query) = search {
                controller.set_search_query(query);
            }
            if all {
                controller.set_show_completed(true);
            }
            print_visible(controller, json)?;
        }
        Command::Search { query } => {
            controller.set_search_query(query.unwrap_or_default());
            print_visible(controller, json)?;
        }
        Command::PriorityFilter { level } => {
            controller.set_priority_filter(level);
            print_visible(controller, json)?;
        }
        Command::ShowCompleted { show } => {
            controller.set_show_completed(show);
            print_visible(controller, json)?;
        }
        Command::Stats => {
            let stats = controller.stats();
            if json {
                println!("{}", render::to_json(&stats)?);
            } else {
                println!("{}", render::render_stats(&stats));
            }
        }
        Command::Clear => {
            let removed = controller.tasks().len();
            controller.clear_all();
            if json {
                println!("{}", serde_json::json!({ "cleared": removed }));
            } else {
                println!("Cleared {removed} task(s).");
            }
        }
    }

    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

/// One controller for the whole session, so filter commands accumulate.
fn run_interactive() -> Result<(), AppError> {
    let config = resolve_config(&[])?;
    let mut controller = open_controller(&config)?;

    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("privio".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if err.kind() == ErrorKind::DisplayHelp => {
                println!("{err}");
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input("config overrides are only accepted at startup")
            );
            continue;
        }

        if let Err(err) = run_command(&mut controller, &config, cli.command, cli.json) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn run_once(cli: Cli) -> Result<(), AppError> {
    let config = resolve_config(&cli.config_override)?;
    let mut controller = open_controller(&config)?;
    run_command(&mut controller, &config, cli.command, cli.json)
}

fn main() {
    init_logging();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_once(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
