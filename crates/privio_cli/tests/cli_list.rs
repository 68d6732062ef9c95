use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("privio-{nanos}-{name}"))
}

fn run(store_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_privio"))
        .args(args)
        .env("PRIVIO_STORE_DIR", store_dir)
        .env("PRIVIO_CONFIG_PATH", store_dir.join("config.json"))
        .output()
        .expect("failed to run privio")
}

fn task(id: &str, title: &str, priority: &str, completed: bool) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "description": "",
        "dueDate": null,
        "priority": priority,
        "completed": completed,
        "createdAt": "2025-12-20T00:00:00Z",
        "updatedAt": "2025-12-20T00:00:00Z"
    })
}

fn write_store(store_dir: &Path, tasks: serde_json::Value) {
    let content = serde_json::json!({
        "schema_version": 1,
        "tasks": tasks
    });
    std::fs::create_dir_all(store_dir).unwrap();
    std::fs::write(
        store_dir.join("privio_tasks.json"),
        serde_json::to_string_pretty(&content).unwrap(),
    )
    .unwrap();
}

fn seed(store_dir: &Path) {
    write_store(
        store_dir,
        serde_json::json!([
            task("task-1", "Buy groceries", "low", false),
            task("task-2", "Clean house", "high", false),
            task("task-3", "Pay rent", "medium", true),
            task("task-4", "Buy stamps", "high", false),
        ]),
    );
}

fn listed_ids(output: &Output) -> Vec<String> {
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    parsed
        .as_array()
        .expect("json array")
        .iter()
        .map(|task| task["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn list_plain_text_hides_completed_tasks() {
    let store_dir = temp_dir("cli-list-plain");
    seed(&store_dir);

    let output = run(&store_dir, &["list"]);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Buy groceries"));
    assert!(stdout.contains("Clean house"));
    assert!(!stdout.contains("Pay rent"));
}

#[test]
fn list_json_sorts_by_priority_keeping_ties_in_order() {
    let store_dir = temp_dir("cli-list-sorted");
    seed(&store_dir);

    let output = run(&store_dir, &["--json", "list"]);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    assert_eq!(listed_ids(&output), vec!["task-2", "task-4", "task-1"]);
}

#[test]
fn list_all_includes_completed() {
    let store_dir = temp_dir("cli-list-all");
    seed(&store_dir);

    let output = run(&store_dir, &["--json", "list", "--all"]);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    assert_eq!(
        listed_ids(&output),
        vec!["task-2", "task-4", "task-3", "task-1"]
    );
}

#[test]
fn list_combines_search_and_priority() {
    let store_dir = temp_dir("cli-list-filters");
    seed(&store_dir);

    let by_search = run(&store_dir, &["--json", "list", "--search", "BUY"]);
    let by_both = run(
        &store_dir,
        &["--json", "list", "--search", "buy", "--priority", "low"],
    );
    std::fs::remove_dir_all(&store_dir).ok();

    assert_eq!(listed_ids(&by_search), vec!["task-4", "task-1"]);
    assert_eq!(listed_ids(&by_both), vec!["task-1"]);
}

#[test]
fn list_does_not_rewrite_store() {
    let store_dir = temp_dir("cli-list-readonly");
    seed(&store_dir);
    let before = std::fs::read_to_string(store_dir.join("privio_tasks.json")).unwrap();

    let output = run(&store_dir, &["list", "--search", "rent", "--all"]);
    let after = std::fs::read_to_string(store_dir.join("privio_tasks.json")).unwrap();
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    assert_eq!(before, after);
}

#[test]
fn list_with_corrupt_store_shows_empty_list() {
    let store_dir = temp_dir("cli-list-corrupt");
    std::fs::create_dir_all(&store_dir).unwrap();
    std::fs::write(store_dir.join("privio_tasks.json"), "{ definitely not json").unwrap();

    let output = run(&store_dir, &["list"]);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No tasks."));
}

#[test]
fn list_reads_legacy_array_layout() {
    let store_dir = temp_dir("cli-list-legacy");
    std::fs::create_dir_all(&store_dir).unwrap();
    let legacy = serde_json::json!([task("legacy-1", "Old format", "high", false)]);
    std::fs::write(store_dir.join("privio_tasks.json"), legacy.to_string()).unwrap();

    let output = run(&store_dir, &["--json", "list"]);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    assert_eq!(listed_ids(&output), vec!["legacy-1"]);
}

#[test]
fn list_marks_overdue_tasks() {
    let store_dir = temp_dir("cli-list-overdue");
    let mut overdue = task("task-1", "Renew passport", "high", false);
    overdue["dueDate"] = serde_json::json!("2000-06-15T12:00:00Z");
    write_store(&store_dir, serde_json::json!([overdue]));

    let output = run(&store_dir, &["list"]);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Jun 15, 2000 (overdue)"));
}

#[test]
fn show_completed_from_config_file_is_initial_filter() {
    let store_dir = temp_dir("cli-list-config");
    seed(&store_dir);
    std::fs::write(
        store_dir.join("config.json"),
        r#"{ "show_completed": true }"#,
    )
    .unwrap();

    let output = run(&store_dir, &["--json", "list"]);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    assert!(listed_ids(&output).contains(&"task-3".to_string()));
}
