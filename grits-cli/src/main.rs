use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{add, commit, init, log, restore, show, status};

#[derive(Parser)]
#[command(name = "grits")]
#[command(version, about = "A small local version control system", long_about = None)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long = "repo", global = true)]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty repository
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Add file contents to the staging area
    Add {
        /// Files or directories to stage
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Record the staged files as a new commit
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show commit history
    Log {
        /// Number of commits to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// One line per commit
        #[arg(long)]
        oneline: bool,
    },

    /// Show a commit and the changes it introduced
    Show {
        /// Commit hash, unique hash prefix, or HEAD
        #[arg(default_value = "HEAD")]
        reference: String,

        /// Lines of context around each change
        #[arg(short = 'U', long, default_value = "3")]
        context: usize,
    },

    /// Show staged and unstaged changes
    Status,

    /// Restore working tree files
    Restore {
        /// Files to restore
        paths: Vec<PathBuf>,

        /// Commit to restore from (defaults to the staging area)
        #[arg(short, long)]
        source: Option<String>,

        /// Also stage the restored content (requires --source)
        #[arg(long, requires = "source")]
        staged: bool,

        /// Reset every tracked file and the staging area to HEAD
        #[arg(long, conflicts_with_all = ["source", "staged"])]
        hard: bool,

        /// Skip the confirmation prompt for --hard
        #[arg(short, long)]
        yes: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let repo = cli.repo;

    match cli.command {
        Commands::Init { path } => {
            init::run(repo, path)?;
        }
        Commands::Add { paths } => {
            add::run(repo, paths)?;
        }
        Commands::Commit { message } => {
            commit::run(repo, message)?;
        }
        Commands::Log { limit, oneline } => {
            log::run(repo, limit, oneline)?;
        }
        Commands::Show { reference, context } => {
            show::run(repo, reference, context)?;
        }
        Commands::Status => {
            status::run(repo)?;
        }
        Commands::Restore {
            paths,
            source,
            staged,
            hard,
            yes,
        } => {
            restore::run(repo, paths, source, staged, hard, yes)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_staged_requires_source() {
        assert!(Cli::try_parse_from(["grits", "restore", "--staged", "f.txt"]).is_err());

        let cli =
            Cli::try_parse_from(["grits", "restore", "--source", "abc123", "--staged", "f.txt"])
                .unwrap();
        match cli.command {
            Commands::Restore {
                source, staged, ..
            } => {
                assert_eq!(source.as_deref(), Some("abc123"));
                assert!(staged);
            }
            _ => panic!("expected restore"),
        }
    }

    #[test]
    fn test_restore_hard_conflicts_with_source() {
        assert!(Cli::try_parse_from(["grits", "restore", "--hard", "--source", "abc"]).is_err());
    }
}
