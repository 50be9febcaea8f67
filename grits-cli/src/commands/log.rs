use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

pub fn run(repo: Option<PathBuf>, limit: Option<usize>, oneline: bool) -> Result<()> {
    let (repository, _) = super::open_repo(repo)?;

    if repository.head_hash()?.is_none() {
        println!("{}", "No commits yet".yellow());
        return Ok(());
    }

    let mut shown = 0;
    let mut remaining = false;
    for commit in repository.log()? {
        if limit.is_some_and(|limit| shown >= limit) {
            remaining = true;
            break;
        }
        let commit = commit?;
        shown += 1;

        if oneline {
            println!("{} {}", commit.short_hash().yellow(), commit.message);
            continue;
        }

        println!("{} {}", "commit".yellow().bold(), commit.hash.yellow());
        println!(
            "{}: {}",
            "Date".bold(),
            commit.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
        println!();
        println!("    {}", commit.message);
        println!();
        println!(
            "    {} file(s) tracked",
            commit.files.len().to_string().cyan()
        );
        println!();
    }

    if remaining {
        println!("{}", "... more commits not shown".dimmed());
        println!("Use {} to see more", "--limit N".cyan());
    }

    Ok(())
}
