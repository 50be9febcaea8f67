use anyhow::Result;
use super::short;
use colored::Colorize;
use std::path::PathBuf;

pub fn run(repo: Option<PathBuf>, message: String) -> Result<()> {
    let (repository, _) = super::open_repo(repo)?;

    let commit = repository.commit(&message)?;

    println!("{}", "✓ Commit created successfully!".green().bold());
    println!("  {}: {}", "Commit".bold(), commit.hash.yellow());
    println!("  {}: {}", "Message".bold(), commit.message);
    println!("  {}: {}", "Files".bold(), commit.files.len());
    match &commit.parent {
        Some(parent) => println!("  {}: {}", "Parent".bold(), short(parent)),
        None => println!("  {}", "(root commit)".dimmed()),
    }

    Ok(())
}
