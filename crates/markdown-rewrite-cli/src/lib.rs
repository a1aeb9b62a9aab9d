use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use markdown_rewrite::PageContext;
use markdown_rewrite_config::{Config, LoadOptions};
use markdown_rewrite_ops::{Operations, PageStatus, RewriteMode, TreeOptions, TreeOutcome};
use serde_json::json;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Command::Page(args) => handle_page(args),
        Command::Tree(args) => handle_tree(args),
    }
}

fn handle_page(args: PageArgs) -> Result<i32> {
    let PageArgs {
        path,
        config,
        edit_uri,
    } = args;

    let config = load_config(config, edit_uri)?;
    let ops = Operations::new(config)?;

    let (markdown, page) = if path == PathBuf::from("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read markdown from stdin")?;
        (buffer, PageContext::default())
    } else {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read page {}", path.display()))?;
        let page = PageContext::for_path(path);
        (contents, page)
    };

    let rewritten = ops.rewrite_page(&markdown, &page);
    print_page(&rewritten)?;
    Ok(0)
}

fn handle_tree(args: TreeArgs) -> Result<i32> {
    let TreeArgs {
        path,
        check,
        diff,
        write,
        json: json_summary,
        quiet,
        config,
        edit_uri,
    } = args;

    let mode = if write {
        RewriteMode::Write
    } else if diff {
        RewriteMode::Diff
    } else {
        // Explicit --check maps to the same default mode.
        let _ = check;
        RewriteMode::Check
    };

    let config = load_config(config, edit_uri)?;
    let ops = Operations::new(config)?;
    let outcome = ops.rewrite_tree(TreeOptions { paths: path, mode })?;

    if json_summary {
        print_json_summary(&outcome, mode)?;
    } else {
        report_tree(&outcome, mode, quiet);
    }

    Ok(outcome.exit_code)
}

fn load_config(override_path: Option<PathBuf>, edit_uri: Option<String>) -> Result<Config> {
    let mut options = LoadOptions::default();
    if let Some(path) = override_path {
        options = options.with_override_path(path);
    }
    if let Some(uri) = edit_uri {
        options = options.with_edit_uri(uri);
    }
    Ok(Config::load(options)?)
}

fn print_json_summary(outcome: &TreeOutcome, mode: RewriteMode) -> Result<()> {
    let payload = json!({
        "mode": mode_label(mode),
        "files_scanned": outcome.files_scanned,
        "rewritten": outcome.rewritten,
        "pages": outcome
            .changes
            .iter()
            .map(|change| {
                json!({
                    "path": change.path,
                    "status": match change.status {
                        PageStatus::Changed => "changed",
                        PageStatus::Unchanged => "unchanged",
                    },
                    "diff": change.diff,
                })
            })
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn report_tree(outcome: &TreeOutcome, mode: RewriteMode, quiet: bool) {
    for change in &outcome.changes {
        if change.status == PageStatus::Changed {
            match mode {
                RewriteMode::Check => println!("needs rewrite: {}", change.path.display()),
                RewriteMode::Write => println!("rewrote {}", change.path.display()),
                RewriteMode::Diff => {}
            }
        }
        if let Some(diff) = &change.diff {
            print!("{diff}");
            if !diff.ends_with('\n') {
                println!();
            }
        }
    }

    if !quiet {
        match mode {
            RewriteMode::Write => println!(
                "rewrote {} of {} pages",
                outcome.rewritten, outcome.files_scanned
            ),
            RewriteMode::Check | RewriteMode::Diff => println!(
                "{} of {} pages need rewriting",
                outcome.rewritten, outcome.files_scanned
            ),
        }
    }
}

fn mode_label(mode: RewriteMode) -> &'static str {
    match mode {
        RewriteMode::Check => "check",
        RewriteMode::Diff => "diff",
        RewriteMode::Write => "write",
    }
}

fn print_page(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match handle.write_all(content.as_bytes()) {
        Ok(()) => {}
        Err(err) if should_ignore_pipe_error(&err) => return Ok(()),
        Err(err) => return Err(err).context("failed to print rewritten page"),
    }

    match handle.flush() {
        Ok(()) => Ok(()),
        Err(err) if should_ignore_pipe_error(&err) => Ok(()),
        Err(err) => Err(err).context("failed to flush stdout"),
    }
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Rewrite Markdown pages for publication",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite a single page and print the result
    Page(PageArgs),
    /// Rewrite every page under the configured root
    Tree(TreeArgs),
}

#[derive(Args)]
struct PageArgs {
    /// Path to the Markdown page, or `-` for stdin
    #[arg(value_name = "FILE", default_value = "-")]
    path: PathBuf,
    /// Load configuration from this file instead of the discovered one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the configured edit URI
    #[arg(long = "edit-uri", value_name = "URI")]
    edit_uri: Option<String>,
}

#[derive(Args)]
struct TreeArgs {
    /// Restrict the run to specific paths under the pages root
    #[arg(long = "path", value_name = "PATH", action = ArgAction::Append)]
    path: Vec<PathBuf>,
    /// Report pages that would change without modifying them (default)
    #[arg(long, conflicts_with_all = ["diff", "write"])]
    check: bool,
    /// Print unified diffs for pages that would change
    #[arg(long, conflicts_with_all = ["check", "write"])]
    diff: bool,
    /// Rewrite pages in place
    #[arg(long, conflicts_with_all = ["check", "diff"])]
    write: bool,
    /// Emit a machine-readable JSON summary
    #[arg(long)]
    json: bool,
    /// Suppress the summary line
    #[arg(long)]
    quiet: bool,
    /// Load configuration from this file instead of the discovered one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the configured edit URI
    #[arg(long = "edit-uri", value_name = "URI")]
    edit_uri: Option<String>,
}
