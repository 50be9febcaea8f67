use anyhow::Result;
use colored::Colorize;
use grits_core::ChangeKind;
use std::path::PathBuf;

pub fn run(repo: Option<PathBuf>) -> Result<()> {
    let (repository, _) = super::open_repo(repo)?;
    let status = repository.status()?;

    println!("{}", "Repository Status".bold().cyan());
    println!("  {}: {}", "Root".bold(), repository.root().display());
    match repository.head()? {
        Some(head) => println!("  {}: {} {}", "HEAD".bold(), head.short_hash(), head.message),
        None => println!("  {}: {}", "HEAD".bold(), "no commits yet".dimmed()),
    }
    println!();

    if status.is_clean() {
        println!("{}", "Nothing to commit, working tree clean".green());
        return Ok(());
    }

    if !status.staged.is_empty() {
        println!("{}", "Changes to be committed:".bold());
        for entry in &status.staged {
            println!("  {:>10}: {}", entry.kind.as_str().green(), entry.path);
        }
        println!();
    }

    if !status.unstaged.is_empty() {
        println!("{}", "Changes not staged for commit:".bold());
        for entry in &status.unstaged {
            let kind = match entry.kind {
                ChangeKind::Deleted => entry.kind.as_str().red(),
                _ => entry.kind.as_str().yellow(),
            };
            println!("  {:>10}: {}", kind, entry.path);
        }
        println!();
        println!(
            "Run {} to stage or {} to discard",
            "grits add <file>".cyan(),
            "grits restore <file>".cyan()
        );
    }

    Ok(())
}
