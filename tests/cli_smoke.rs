use assert_cmd::Command;
use predicates::str::contains;

fn taskboard() -> Command {
    let mut cmd = Command::cargo_bin("taskboard").expect("binary");
    cmd.current_dir(env!("CARGO_TARGET_TMPDIR"))
        .env_remove("TASKBOARD_ROLE")
        .env_remove("TASKBOARD_USER_ID")
        .env_remove("TASKBOARD_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn taskboard_help_works() {
    taskboard()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Kanban client"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "board",
        "list",
        "move",
        "next",
        "prev",
        "edit",
        "delete",
        "transitions",
        "users",
        "requests",
    ];

    for cmd in subcommands {
        taskboard().arg(cmd).arg("--help").assert().success();
    }
}

#[test]
fn transitions_for_user_are_offline() {
    taskboard()
        .args(["transitions", "in-progress", "--role", "user", "--json"])
        .assert()
        .success()
        .stdout(contains("\"schema_version\": \"taskboard.v1\""))
        .stdout(contains("\"allowed\": [\n      \"todo\",\n      \"review\"\n    ]"));
}

#[test]
fn frozen_stage_is_reported() {
    taskboard()
        .args(["transitions", "accepted", "--role", "user"])
        .assert()
        .success()
        .stdout(contains("allowed: (none)"))
        .stdout(contains("this stage is manager-only"));
}

#[test]
fn unknown_status_is_user_error() {
    taskboard()
        .args(["transitions", "done", "--role", "admin"])
        .assert()
        .code(2)
        .stderr(contains("unknown task status"));
}

#[test]
fn user_role_without_id_is_rejected() {
    taskboard()
        .args(["list", "--role", "user", "--json"])
        .assert()
        .code(2)
        .stdout(contains("\"kind\": \"user_error\""));
}

#[test]
fn non_admin_delete_is_blocked_before_any_request() {
    taskboard()
        .args([
            "delete",
            "t1",
            "--role",
            "user",
            "--user-id",
            "u1",
            "--api-url",
            "http://127.0.0.1:9",
        ])
        .assert()
        .code(3)
        .stderr(contains("only admins can delete tasks"));
}
