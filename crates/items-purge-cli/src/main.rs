use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use items_purge::limits::{DEFAULT_MAX_BACKUPS, DELETED_PILE};
use items_purge::{clean_file, render_listing, CleanError, CleanOptions, FsStorage, Grammar};

#[derive(Parser)]
#[command(
    name = "items-purge",
    version,
    about = "Remove permanently deleted items from a save file, keeping rotating backups"
)]
struct Cli {
    /// Save file to clean
    #[arg(default_value = "items.txt")]
    path: PathBuf,

    /// Pile whose members are deleted (repeatable)
    #[arg(long = "deleted-pile", value_name = "PILE", default_value = DELETED_PILE)]
    deleted_piles: Vec<String>,

    /// Number of backups to keep
    #[arg(long, default_value_t = DEFAULT_MAX_BACKUPS)]
    max_backups: usize,

    /// Item id that is never removed (repeatable)
    #[arg(long = "protect", value_name = "ID")]
    protect: Vec<String>,

    /// Id prefix whose items are never removed (repeatable)
    #[arg(long = "protect-prefix", value_name = "PREFIX")]
    protect_prefix: Vec<String>,

    /// Report what would be removed without touching any file
    #[arg(long)]
    dry_run: bool,

    /// Write the remaining items to FILE
    #[arg(long, value_name = "FILE")]
    list: Option<PathBuf>,

    /// Log each removal and backup move
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), CleanError> {
    let options = CleanOptions::new()
        .with_deleted_piles(cli.deleted_piles.iter().map(String::as_str))
        .with_max_backups(cli.max_backups)
        .with_protected_ids(cli.protect.iter().map(String::as_str))
        .with_protected_prefixes(cli.protect_prefix.iter().cloned())
        .dry_run(cli.dry_run);

    let cleaned = clean_file(&FsStorage, &cli.path, &Grammar::default(), &options)?;
    let report = &cleaned.report;

    if let Some(list) = &cli.list {
        fs::write(list, render_listing(&cleaned.document))
            .map_err(|e| CleanError::io("write", list, e))?;
        log::info!("wrote item listing to {}", list.display());
    }

    match &report.backup {
        Some(backup) => println!(
            "{}: removed {} of {} items, previous version saved as {}",
            cli.path.display(),
            report.removed.len(),
            report.items_before,
            backup.display()
        ),
        None => println!(
            "{}: would remove {} of {} items",
            cli.path.display(),
            report.removed.len(),
            report.items_before
        ),
    }

    Ok(())
}

/// Maps a run's result to the process exit status.
fn exit_status(result: Result<(), CleanError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{e}");
            e.code().exit_code() as u8
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    ExitCode::from(exit_status(run(&cli)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["items-purge"]);
        assert_eq!(cli.path, PathBuf::from("items.txt"));
        assert_eq!(cli.deleted_piles, vec![DELETED_PILE.to_string()]);
        assert_eq!(cli.max_backups, DEFAULT_MAX_BACKUPS);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_repeated_flags() {
        let cli = Cli::parse_from([
            "items-purge",
            "save/items.txt",
            "--deleted-pile",
            "Landfill",
            "--deleted-pile",
            "Trash",
            "--protect",
            "milkx",
            "--protect-prefix",
            "quest_",
            "--dry-run",
            "-v",
        ]);
        assert_eq!(cli.deleted_piles, vec!["Landfill", "Trash"]);
        assert_eq!(cli.protect, vec!["milkx"]);
        assert_eq!(cli.protect_prefix, vec!["quest_"]);
        assert!(cli.dry_run && cli.verbose);
    }

    fn run_on(content: Option<&str>, extra: &[&str]) -> (u8, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.txt");
        if let Some(content) = content {
            fs::write(&path, content).unwrap();
        }
        let mut args = vec!["items-purge".to_string(), path.display().to_string()];
        args.extend(extra.iter().map(|a| a.to_string()));
        let cli = Cli::parse_from(args);
        (exit_status(run(&cli)), dir)
    }

    #[test]
    fn test_exit_status_success() {
        let (status, dir) = run_on(
            Some("items { count = 2\n  item { id = 1001 pile = Garage }\n  item { id = 2002 pile = PermanentlyDeletedItems }\n}\n"),
            &[],
        );
        assert_eq!(status, 0);
        assert!(dir.path().join("items00.txt").is_file());

        // Already clean is still success.
        let (status, _dir) = run_on(Some("items { count = 0\n}\n"), &["--dry-run"]);
        assert_eq!(status, 0);
    }

    #[test]
    fn test_exit_status_by_error_class() {
        let (status, dir) = run_on(Some("items { item { id = 1 }"), &[]);
        assert_eq!(status, 3);
        assert!(!dir.path().join("items00.txt").exists());

        let (status, _dir) = run_on(Some("a { id = 1 }\nb { id = 1 }\n"), &[]);
        assert_eq!(status, 4);

        let (status, _dir) = run_on(None, &[]);
        assert_eq!(status, 5);
    }

    #[test]
    fn test_list_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.txt");
        let list = dir.path().join("items.list");
        fs::write(&path, "item { id = 1 pile = Garage }\nitem { id = 2 pile = PermanentlyDeletedItems }\n").unwrap();

        let cli = Cli::parse_from([
            "items-purge".to_string(),
            path.display().to_string(),
            "--list".to_string(),
            list.display().to_string(),
        ]);
        assert_eq!(exit_status(run(&cli)), 0);
        assert_eq!(fs::read_to_string(&list).unwrap(), "1\tGarage\titem\n");
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["items-purge", "-v", "-q"]).is_err());
    }
}
