use anyhow::{Context, Result};
use colored::Colorize;
use grits_core::{Diff, FileStatus};
use std::path::PathBuf;

pub fn run(repo: Option<PathBuf>, reference: String, context: usize) -> Result<()> {
    let (repository, _) = super::open_repo(repo)?;
    let show = repository
        .show(&reference)
        .with_context(|| format!("Cannot show '{}'", reference))?;
    let commit = &show.commit;

    println!("{} {}", "commit".yellow().bold(), commit.hash.yellow());
    if let Some(parent) = &commit.parent {
        println!("{}: {}", "Parent".bold(), super::short(parent));
    }
    println!(
        "{}: {}",
        "Date".bold(),
        commit.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    println!();
    println!("    {}", commit.message);
    println!();

    for file in show.changed_files() {
        println!("{}", "━".repeat(80).bright_black());

        let status = match file.status {
            FileStatus::Added => "NEW".green(),
            FileStatus::Modified => "MOD".yellow(),
            FileStatus::Deleted => "DEL".red(),
            FileStatus::Unchanged => "   ".normal(),
        };
        let summary = match &file.diff {
            Diff::BinaryDiffers { .. } => "binary".dimmed(),
            diff => format!("+{} -{}", diff.additions(), diff.deletions()).dimmed(),
        };
        println!("{} {} {}", status, file.path.white().bold(), summary);
        println!();

        for line in file.format_unified(context).lines() {
            let colored = if line.starts_with("+++") || line.starts_with("---") {
                line.bold()
            } else if line.starts_with('+') {
                line.green()
            } else if line.starts_with('-') {
                line.red()
            } else if line.starts_with("@@") {
                line.cyan()
            } else {
                line.normal()
            };
            println!("{}", colored);
        }
        println!();
    }

    Ok(())
}
