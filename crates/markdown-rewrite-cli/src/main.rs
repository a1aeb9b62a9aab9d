use std::process;

fn main() {
    match markdown_rewrite_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("markdown-rewrite error: {err}");
            process::exit(1);
        }
    }
}
