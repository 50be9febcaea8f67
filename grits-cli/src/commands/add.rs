use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

pub fn run(repo: Option<PathBuf>, paths: Vec<PathBuf>) -> Result<()> {
    let (repository, cwd) = super::open_repo(repo)?;

    let mut staged = Vec::new();
    for path in &paths {
        let added = repository
            .add(super::absolute(&cwd, path))
            .with_context(|| format!("Failed to add {}", path.display()))?;
        staged.extend(added);
    }

    if staged.is_empty() {
        println!("{}", "No files to add".yellow());
        return Ok(());
    }

    for path in &staged {
        println!("  {} {}", "+".green(), path);
    }
    println!();
    println!(
        "{}",
        format!("✓ Staged {} file(s)", staged.len()).green().bold()
    );

    Ok(())
}
