use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use markdown_rewrite_config::{Config, LoadOptions};
use markdown_rewrite_ops::{Operations, PageStatus, RewriteMode, TreeOptions};
use tempfile::TempDir;

fn setup_file(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    let mut file = fs::File::create(&path).expect("create file");
    file.write_all(contents.as_bytes()).expect("write file");
}

fn operations(working_dir: &Path) -> Operations {
    let config = Config::load(
        LoadOptions::default()
            .with_working_dir(working_dir)
            .with_edit_uri("https://host/edit/main/"),
    )
    .expect("load config");
    Operations::new(config).expect("assemble operations")
}

#[test]
fn write_mode_rewrites_pages_in_place() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(
        temp.path(),
        "docs/setup.md",
        "# Setup\n\n> Warning: copy ../../.env.example first\n",
    );
    setup_file(temp.path(), "docs/plain.md", "# Plain\n\nnothing to do\n");

    let ops = operations(temp.path());
    let outcome = ops
        .rewrite_tree(TreeOptions {
            paths: Vec::new(),
            mode: RewriteMode::Write,
        })
        .expect("tree run");

    assert_eq!(outcome.files_scanned, 2);
    assert_eq!(outcome.rewritten, 1);
    assert_eq!(outcome.exit_code, 0);

    let rewritten = fs::read_to_string(temp.path().join("docs/setup.md")).expect("read back");
    assert_eq!(
        rewritten,
        "# Setup\n\n!!! Warning\n\n    copy https://host/edit/main/.env.example/ first\n"
    );

    let untouched = fs::read_to_string(temp.path().join("docs/plain.md")).expect("read back");
    assert_eq!(untouched, "# Plain\n\nnothing to do\n");
}

#[test]
fn second_write_run_finds_nothing_to_do() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "page.md", "> Note: see ../src/app.py\n");

    let ops = operations(temp.path());
    let options = TreeOptions {
        paths: Vec::new(),
        mode: RewriteMode::Write,
    };
    let first = ops.rewrite_tree(options.clone()).expect("first run");
    assert_eq!(first.rewritten, 1);

    let second = ops.rewrite_tree(options).expect("second run");
    assert_eq!(second.rewritten, 0);
    assert!(second
        .changes
        .iter()
        .all(|change| change.status == PageStatus::Unchanged));
}

#[test]
fn check_mode_reports_without_writing() {
    let temp = TempDir::new().expect("tempdir");
    let original = "> Tip: run the linter\n";
    setup_file(temp.path(), "guide.md", original);

    let ops = operations(temp.path());
    let outcome = ops
        .rewrite_tree(TreeOptions {
            paths: Vec::new(),
            mode: RewriteMode::Check,
        })
        .expect("tree run");

    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.rewritten, 1);
    assert_eq!(outcome.changes[0].status, PageStatus::Changed);
    assert!(outcome.changes[0].diff.is_none());

    let untouched = fs::read_to_string(temp.path().join("guide.md")).expect("read back");
    assert_eq!(untouched, original);
}

#[test]
fn diff_mode_renders_unified_diffs() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "guide.md", "> Danger: hot surface\n");

    let ops = operations(temp.path());
    let outcome = ops
        .rewrite_tree(TreeOptions {
            paths: Vec::new(),
            mode: RewriteMode::Diff,
        })
        .expect("tree run");

    assert_eq!(outcome.exit_code, 1);
    let diff = outcome.changes[0].diff.as_deref().expect("diff rendered");
    assert!(diff.contains("a/guide.md"), "unexpected diff: {diff}");
    assert!(diff.contains("-> Danger: hot surface"), "unexpected diff: {diff}");
    assert!(diff.contains("+!!! Danger"), "unexpected diff: {diff}");
}

#[test]
fn excluded_directories_are_not_visited() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "docs/kept.md", "> Note: kept\n");
    setup_file(
        temp.path(),
        "node_modules/dep/README.md",
        "> Note: skipped\n",
    );

    let ops = operations(temp.path());
    let outcome = ops
        .rewrite_tree(TreeOptions {
            paths: Vec::new(),
            mode: RewriteMode::Check,
        })
        .expect("tree run");

    assert_eq!(outcome.files_scanned, 1);
    assert_eq!(outcome.changes[0].path, PathBuf::from("docs/kept.md"));
}

#[test]
fn restriction_paths_limit_the_run() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "docs/a.md", "> Note: a\n");
    setup_file(temp.path(), "notes/b.md", "> Note: b\n");

    let ops = operations(temp.path());
    let outcome = ops
        .rewrite_tree(TreeOptions {
            paths: vec![PathBuf::from("docs")],
            mode: RewriteMode::Check,
        })
        .expect("tree run");

    assert_eq!(outcome.files_scanned, 1);
    assert_eq!(outcome.changes[0].path, PathBuf::from("docs/a.md"));
}

#[test]
fn absolute_restriction_outside_root_is_invalid() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "docs/a.md", "plain\n");

    let ops = operations(temp.path());
    let err = ops
        .rewrite_tree(TreeOptions {
            paths: vec![PathBuf::from("/somewhere/else")],
            mode: RewriteMode::Check,
        })
        .expect_err("expected invalid input");

    assert!(err.to_string().contains("outside the pages root"));
}
