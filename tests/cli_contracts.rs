use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn gradebook(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gradebook"))
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .args(args)
        .output()
        .expect("failed to execute gradebook")
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = gradebook(dir, args);
    assert!(
        output.status.success(),
        "gradebook {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let mut full = args.to_vec();
    full.extend(["--format", "json"]);
    serde_json::from_str(&run_ok(dir, &full)).expect("valid json envelope")
}

#[test]
fn help_lists_every_command() {
    let tmp = tempdir().unwrap();
    let help = run_ok(tmp.path(), &["--help"]);
    for cmd in [
        "menu", "add", "list", "show", "search", "edit", "delete", "stats", "convert",
    ] {
        assert!(help.contains(cmd), "--help missing command: {}", cmd);
    }
}

#[test]
fn add_list_edit_delete_lifecycle() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();

    let added = run_json(dir, &["add", "Ada Lovelace", "Math", "95", "88", "91"]);
    assert_eq!(added["cmd"], "add");
    assert_eq!(added["status"], "ok");
    assert_eq!(added["record"]["id"], "S1000");
    assert_eq!(added["record"]["grade"], "A");

    run_ok(dir, &["add", "Bo", "Art", "50", "60", "70"]);
    let data = fs::read_to_string(dir.join("students.txt")).unwrap();
    assert_eq!(data.lines().count(), 2);
    assert!(data.starts_with("S1000|Ada Lovelace|Math|95|88|91|"));

    let listed = run_json(dir, &["list"]);
    let ids: Vec<&str> = listed["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["S1000", "S1001"]);

    let edited = run_json(dir, &["edit", "S1001", "--score1", "95"]);
    assert_eq!(edited["record"]["score1"], 95.0);
    assert_eq!(edited["record"]["score2"], 60.0);
    assert_eq!(edited["record"]["grade"], "C");

    let found = run_json(dir, &["search", "ada"]);
    assert_eq!(found["records"].as_array().unwrap().len(), 1);

    run_ok(dir, &["delete", "S1000"]);
    let listed = run_json(dir, &["list"]);
    assert_eq!(listed["records"].as_array().unwrap().len(), 1);

    let journal = fs::read_to_string(dir.join("students.txt.journal.jsonl")).unwrap();
    assert!(journal.lines().any(|l| l.contains("\"op\":\"delete\"")));
}

#[test]
fn out_of_range_score_fails_without_writing() {
    let tmp = tempdir().unwrap();
    let output = gradebook(tmp.path(), &["add", "Ada", "Math", "101", "90", "90"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Validation error"));
    assert!(!tmp.path().join("students.txt").exists());
}

#[test]
fn unknown_id_is_not_found() {
    let tmp = tempdir().unwrap();
    let output = gradebook(tmp.path(), &["delete", "S4242"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not found"));
}

#[test]
fn missing_data_file_is_not_an_error() {
    let tmp = tempdir().unwrap();
    let output = gradebook(tmp.path(), &["list"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("starting fresh"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("No student records found."));
}

#[test]
fn config_file_selects_data_file_and_recompute() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    fs::write(
        dir.join("gradebook.toml"),
        "data_file = \"class.txt\"\nrecompute_on_load = true\njournal = false\n",
    )
    .unwrap();
    fs::write(dir.join("class.txt"), "S7|Ada|Math|50|50|50|95|A\n").unwrap();

    let shown = run_json(dir, &["show", "S7"]);
    assert_eq!(shown["record"]["grade"], "F");
    assert!(!dir.join("class.txt.journal.jsonl").exists());
}

#[test]
fn explicit_missing_config_is_an_error() {
    let tmp = tempdir().unwrap();
    let output = gradebook(tmp.path(), &["--config", "nope.toml", "list"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config error"));
}

#[test]
fn convert_writes_jsonl_copy() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("students.txt"), "S1,Ann,Art,70,80,90,80,B\n").unwrap();

    run_ok(dir, &["convert", "--to", "jsonl", "--out", "students.jsonl"]);
    let listed = run_json(
        dir,
        &["--file", "students.jsonl", "--encoding", "jsonl", "list"],
    );
    assert_eq!(listed["records"][0]["name"], "Ann");
    assert_eq!(listed["records"][0]["score3"], 90.0);
}

#[test]
fn menu_runs_from_stdin() {
    use std::io::Write;
    use std::process::Stdio;

    let tmp = tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_gradebook"))
        .current_dir(tmp.path())
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn gradebook");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"1\nAda\nMath\n90\n80\n70\n6\n8\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Student added with ID S1000"));
    assert!(stdout.contains("Goodbye"));
    assert_eq!(
        fs::read_to_string(tmp.path().join("students.txt")).unwrap(),
        "S1000|Ada|Math|90|80|70|80|B\n"
    );
}

#[test]
fn mutating_commands_refuse_to_drop_unparsed_lines() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    let original = "S1|Ada|Math|90|90|90|90|A\nS2|Bo|Art|70|70\n";
    fs::write(dir.join("students.txt"), original).unwrap();

    let output = gradebook(dir, &["add", "Cy", "Art", "50", "50", "50", "--format", "json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "diagnostic not shown: {}", stderr);
    assert!(stderr.contains("--force"));
    assert_eq!(fs::read_to_string(dir.join("students.txt")).unwrap(), original);

    let output = gradebook(dir, &["delete", "S1"]);
    assert!(!output.status.success());
    assert_eq!(fs::read_to_string(dir.join("students.txt")).unwrap(), original);

    let added = run_json(dir, &["add", "Cy", "Art", "50", "50", "50", "--force"]);
    assert_eq!(added["record"]["id"], "S1000");
    assert_eq!(added["diagnostics"][0]["kind"], "malformed");
    assert_eq!(added["diagnostics"][0]["line"], 2);
    assert_eq!(
        fs::read_to_string(dir.join("students.txt")).unwrap(),
        "S1|Ada|Math|90|90|90|90|A\nS1000|Cy|Art|50|50|50|50|F\n"
    );
}
