use colored::Colorize;
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    assetflow::cli::run()?;
    Ok(())
}
