use anyhow::Result;
use colored::Colorize;
use grits_core::Repository;
use std::path::PathBuf;

pub fn run(repo: Option<PathBuf>, path: PathBuf) -> Result<()> {
    let cwd = super::working_dir(repo)?;
    let repository = Repository::init(super::absolute(&cwd, &path))?;

    println!(
        "{} {}",
        "✓ Initialized empty repository in".green().bold(),
        repository.meta_dir().display()
    );

    Ok(())
}
