use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use markdown_rewrite::PageRewriter;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Benchmark harness for markdown-rewrite passes"
)]
struct Args {
    /// Number of synthetic pages per iteration
    #[arg(long, default_value_t = 200)]
    pages: usize,

    /// Number of warm-up iterations (not counted in results)
    #[arg(long, default_value_t = 1)]
    warmup: usize,

    /// Number of measured iterations
    #[arg(long, default_value_t = 5)]
    iterations: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let rewriter = PageRewriter::new("https://example.com/edit/main/")?;
    let corpus: Vec<String> = (0..args.pages).map(synthetic_page).collect();

    let matching = benchmark("page-rewrite", args.warmup, args.iterations, || {
        for page in &corpus {
            let _ = rewriter.rewrite(page);
        }
        Ok(())
    })?;

    let plain_corpus: Vec<String> = (0..args.pages).map(plain_page).collect();
    let pass_through = benchmark("pass-through", args.warmup, args.iterations, || {
        for page in &plain_corpus {
            let _ = rewriter.rewrite(page);
        }
        Ok(())
    })?;

    print_summary(&[matching, pass_through]);
    Ok(())
}

fn synthetic_page(seed: usize) -> String {
    let mut page = format!("# Page {seed}\n\n");
    for section in 0..16 {
        page.push_str(&format!(
            "see ../../src/module_{section}.py and ../tests/test_{section}.py\n\n"
        ));
        page.push_str(&format!("> Note: section {section} of page {seed}\n\n"));
        page.push_str("a plain paragraph that matches neither pass\n\n");
    }
    page
}

fn plain_page(seed: usize) -> String {
    let mut page = format!("# Page {seed}\n\n");
    for section in 0..16 {
        page.push_str(&format!(
            "section {section} prose without links or callouts\n\n"
        ));
    }
    page
}

struct BenchResult {
    name: String,
    iterations: usize,
    average: Duration,
    median: Duration,
}

fn benchmark<F>(name: &str, warmup: usize, iterations: usize, mut f: F) -> Result<BenchResult>
where
    F: FnMut() -> Result<()>,
{
    for _ in 0..warmup {
        f()?;
    }

    let mut samples = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let start = Instant::now();
        f()?;
        samples.push(start.elapsed());
    }

    samples.sort();
    let total = samples
        .iter()
        .copied()
        .fold(Duration::ZERO, |acc, sample| acc + sample);
    let average = total / (iterations as u32);
    let median = samples[samples.len() / 2];

    Ok(BenchResult {
        name: name.to_string(),
        iterations,
        average,
        median,
    })
}

fn print_summary(results: &[BenchResult]) {
    println!("markdown-rewrite benchmark results:\n");
    for result in results {
        println!(
            "- {}: avg {:?} (median {:?}) over {} iterations",
            result.name, result.average, result.median, result.iterations
        );
    }
}
