use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::Confirm;
use grits_core::{Diff, RestoreSource, RestoredFile};
use std::path::PathBuf;

pub fn run(
    repo: Option<PathBuf>,
    paths: Vec<PathBuf>,
    source: Option<String>,
    staged: bool,
    hard: bool,
    yes: bool,
) -> Result<()> {
    let (repository, cwd) = super::open_repo(repo)?;

    if hard {
        if !paths.is_empty() {
            bail!("--hard restores every tracked file and does not take paths");
        }
        return run_hard(&repository, yes);
    }

    if paths.is_empty() {
        bail!("Either specify paths or use --hard");
    }

    let restore_source = match source {
        Some(reference) => RestoreSource::Commit(reference),
        None => RestoreSource::Staged,
    };

    for path in &paths {
        let restored = repository
            .restore(super::absolute(&cwd, path), &restore_source, staged)
            .with_context(|| format!("Failed to restore {}", path.display()))?;
        print_restored(&restored);
    }

    println!();
    println!(
        "{}",
        format!("✓ Restored {} file(s)", paths.len()).green().bold()
    );

    Ok(())
}

fn run_hard(repository: &grits_core::Repository, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("This will discard all local changes. Continue?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Aborted".yellow());
            return Ok(());
        }
    }

    let report = repository.restore_hard()?;

    for restored in &report.restored {
        print_restored(restored);
    }
    for failure in &report.failed {
        println!(
            "  {} {} - {}",
            "✗".red(),
            failure.path,
            failure.error.to_string().red()
        );
    }

    println!();
    if report.is_complete() {
        println!(
            "{}",
            format!(
                "✓ Restored working tree to {}",
                super::short(&report.commit)
            )
            .green()
            .bold()
        );
        Ok(())
    } else {
        bail!(
            "Restored {}/{} files; {} failed",
            report.restored.len(),
            report.restored.len() + report.failed.len(),
            report.failed.len()
        )
    }
}

fn print_restored(restored: &RestoredFile) {
    let detail = match &restored.changes {
        _ if restored.created => "recreated".green(),
        Diff::BinaryDiffers { .. } => "binary content replaced".yellow(),
        changes if changes.is_empty() => "unchanged".dimmed(),
        changes => format!("+{} -{}", changes.additions(), changes.deletions()).yellow(),
    };
    println!("  {} {} {}", "✓".green(), restored.path, detail);
}
