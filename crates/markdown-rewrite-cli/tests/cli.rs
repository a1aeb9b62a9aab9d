use std::fs;
use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn setup_file(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    let mut file = fs::File::create(&path).expect("create file");
    file.write_all(contents.as_bytes()).expect("write file");
}

fn setup_config(dir: &Path) {
    setup_file(
        dir,
        ".markdown-rewrite.toml",
        r#"
        [site]
        edit_uri = "https://host/edit/main/"
        "#,
    );
}

#[test]
fn tree_check_reports_pages_needing_rewrite() {
    let temp = TempDir::new().expect("tempdir");
    setup_config(temp.path());
    setup_file(temp.path(), "docs/setup.md", "> Warning: mind the gap\n");

    let mut cmd = Command::cargo_bin("markdown-rewrite").expect("binary");
    cmd.current_dir(temp.path())
        .arg("tree")
        .assert()
        .failure()
        .stdout(predicate::str::contains("needs rewrite: docs/setup.md"))
        .stdout(predicate::str::contains("1 of 1 pages need rewriting"));

    let untouched = fs::read_to_string(temp.path().join("docs/setup.md")).expect("read back");
    assert_eq!(untouched, "> Warning: mind the gap\n");
}

#[test]
fn tree_write_rewrites_in_place_and_is_stable() {
    let temp = TempDir::new().expect("tempdir");
    setup_config(temp.path());
    setup_file(
        temp.path(),
        "docs/setup.md",
        "see ../../src/app.py\n\n> Note: read this\n",
    );

    let mut cmd = Command::cargo_bin("markdown-rewrite").expect("binary");
    cmd.current_dir(temp.path())
        .args(["tree", "--write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rewrote docs/setup.md"));

    let rewritten = fs::read_to_string(temp.path().join("docs/setup.md")).expect("read back");
    assert_eq!(
        rewritten,
        "see https://host/edit/main/src/app.py\n\n!!! Note\n\n    read this\n"
    );

    let mut second = Command::cargo_bin("markdown-rewrite").expect("binary");
    second
        .current_dir(temp.path())
        .args(["tree", "--write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rewrote 0 of 1 pages"));
}

#[test]
fn tree_diff_prints_unified_diff() {
    let temp = TempDir::new().expect("tempdir");
    setup_config(temp.path());
    setup_file(temp.path(), "guide.md", "> Tip: stay hydrated\n");

    let mut cmd = Command::cargo_bin("markdown-rewrite").expect("binary");
    cmd.current_dir(temp.path())
        .args(["tree", "--diff"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("+!!! Tip"));
}

#[test]
fn tree_json_emits_machine_readable_summary() {
    let temp = TempDir::new().expect("tempdir");
    setup_config(temp.path());
    setup_file(temp.path(), "guide.md", "> Bug: known issue\n");

    let mut cmd = Command::cargo_bin("markdown-rewrite").expect("binary");
    let output = cmd
        .current_dir(temp.path())
        .args(["tree", "--json"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).expect("stdout utf8");
    assert!(stdout.contains("\"mode\": \"check\""), "stdout: {stdout}");
    assert!(stdout.contains("\"status\": \"changed\""), "stdout: {stdout}");
    assert!(stdout.contains("guide.md"), "stdout: {stdout}");
}

#[test]
fn missing_edit_uri_fails_fast() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "guide.md", "> Note: hi\n");

    let mut cmd = Command::cargo_bin("markdown-rewrite").expect("binary");
    cmd.current_dir(temp.path())
        .arg("tree")
        .assert()
        .failure()
        .stderr(predicate::str::contains("site.edit_uri"));
}

#[test]
fn page_rewrites_a_single_file() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "page.md", "link ../fixtures/sample.json\n");

    let mut cmd = Command::cargo_bin("markdown-rewrite").expect("binary");
    cmd.current_dir(temp.path())
        .args([
            "page",
            "page.md",
            "--edit-uri",
            "https://host/edit/main/",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "link https://host/edit/main/fixtures/sample.json",
        ));
}
