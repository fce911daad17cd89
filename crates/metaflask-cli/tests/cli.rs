mod common;

use predicates::prelude::*;
use serde_json::Value;

use common::{metaflask, metaflask_in, sample_checkout};

fn stdout_json(output: std::process::Output) -> Value {
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_members_list() {
    let fixture = sample_checkout();
    metaflask(fixture.root())
        .args(["members", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mitsuhiko"))
        .stdout(predicate::str::contains("untitaker"));
}

#[test]
fn test_members_show_json() {
    let fixture = sample_checkout();
    let output = metaflask(fixture.root())
        .args(["--format", "json", "members", "show", "davidism"])
        .output()
        .unwrap();
    let member = stdout_json(output);
    assert_eq!(member["num"], 2);
    assert_eq!(member["sponsor"]["id"], "mitsuhiko");
}

#[test]
fn test_unknown_member_exits_with_not_found() {
    let fixture = sample_checkout();
    metaflask(fixture.root())
        .args(["members", "show", "nobody"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("member not found: nobody"));
}

#[test]
fn test_members_tree_indents_by_depth() {
    let fixture = sample_checkout();
    metaflask(fixture.root())
        .args(["members", "tree"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mitsuhiko\n  davidism\n    untitaker\n"));
}

#[test]
fn test_projects_listings() {
    let fixture = sample_checkout();
    metaflask(fixture.root())
        .args(["projects", "extensions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flask-sqlalchemy"))
        .stdout(predicate::str::contains("orphan").not());

    metaflask(fixture.root())
        .args(["projects", "needs-stewards"])
        .assert()
        .success()
        .stdout(predicate::str::contains("orphan"))
        .stdout(predicate::str::contains("flask-sqlalchemy").not());
}

#[test]
fn test_project_show() {
    let fixture = sample_checkout();
    metaflask(fixture.root())
        .args(["projects", "show", "flask-sqlalchemy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://pypi.python.org/pypi/Flask-SQLAlchemy/"))
        .stdout(predicate::str::contains("mitsuhiko"))
        .stdout(predicate::str::contains("Adds SQLAlchemy support."));
}

#[test]
fn test_dump() {
    let fixture = sample_checkout();
    let output = metaflask(fixture.root()).arg("dump").output().unwrap();
    let dump = stdout_json(output);
    assert_eq!(dump["members"].as_array().unwrap().len(), 3);
    let projects = dump["projects"].as_array().unwrap();
    assert_eq!(projects[0]["internal_name"], "flask-sqlalchemy");
    assert_eq!(projects[0]["stewards"][0]["id"], "mitsuhiko");
    assert_eq!(projects[1]["project_lead"], Value::Null);
}

#[test]
fn test_malformed_member_is_a_data_error() {
    let fixture = sample_checkout();
    fixture.write_member_raw(4, "broken", "this line has no colon\n");
    metaflask(fixture.root())
        .args(["members", "list"])
        .assert()
        .code(5);
}

#[test]
fn test_missing_config_file() {
    let fixture = sample_checkout();
    metaflask(fixture.root())
        .args(["--config", "does-not-exist.yaml", "dump"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_checkout_is_an_io_error() {
    let fixture = sample_checkout();
    let missing = fixture.root().join("nowhere");
    metaflask_in(fixture.root())
        .arg("--checkout")
        .arg(&missing)
        .arg("dump")
        .assert()
        .code(3);
}

#[test]
fn test_config_file_sets_checkout_path() {
    let fixture = sample_checkout();
    let work = tempfile::tempdir().unwrap();
    let config_dir = work.path().join(".metaflask");
    std::fs::create_dir(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.yaml"),
        format!("checkout:\n  path: {}\n", fixture.root().display()),
    )
    .unwrap();

    metaflask_in(work.path())
        .args(["members", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("davidism"));
}
