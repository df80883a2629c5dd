//! cmt-admin
//!
//! Batch and maintenance commands run by operators or cron, straight
//! against the database.

use clap::{Parser, Subcommand};
use cmt_common::{try_init_tracing_with_config, TracingConfig};
use tracing::Level;

mod commands;
mod context;

use commands::{accounts, maintenance, scoring};

#[derive(Parser)]
#[command(name = "cmt-admin")]
#[command(about = "Chapter management maintenance commands", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending SQL migrations
    Migrate(maintenance::MigrateArgs),

    /// Recompute every member's cached current status and roles
    SyncCurrent(maintenance::SyncCurrentArgs),

    /// Repair overlapping status history
    DedupeStatus(maintenance::DedupeStatusArgs),

    /// Rescore one score type since the start of the biennium
    Recalculate(scoring::RecalculateArgs),

    /// Compute the batch-scored types (pledge ratio, membership, report, pledge program) for a term
    SpecialScores(scoring::SpecialScoresArgs),

    /// List stale pledges and chapters that stopped pledging
    PledgeCheck(maintenance::PledgeCheckArgs),

    /// Set a member's password, read from stdin
    SetPassword(accounts::SetPasswordArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut tracing_config = TracingConfig::cli();
    if cli.verbose {
        tracing_config.level = Level::DEBUG;
    }
    try_init_tracing_with_config(tracing_config)?;

    match cli.command {
        Commands::Migrate(args) => maintenance::migrate(args).await,
        Commands::SyncCurrent(args) => maintenance::sync_current(args).await,
        Commands::DedupeStatus(args) => maintenance::dedupe_status(args).await,
        Commands::Recalculate(args) => scoring::recalculate(args).await,
        Commands::SpecialScores(args) => scoring::special_scores(args).await,
        Commands::PledgeCheck(args) => maintenance::pledge_check(args).await,
        Commands::SetPassword(args) => accounts::set_password(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_sync_override() {
        let cli = Cli::try_parse_from(["cmt-admin", "sync-current", "--override", "--today", "2024-03-05"])
            .unwrap();
        match cli.command {
            Commands::SyncCurrent(args) => {
                assert!(args.force);
                assert_eq!(args.today.map(|d| d.to_string()).as_deref(), Some("2024-03-05"));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_parses_special_scores_term() {
        let cli = Cli::try_parse_from(["cmt-admin", "special-scores", "--year", "2024", "--term", "fa"])
            .unwrap();
        assert!(matches!(cli.command, Commands::SpecialScores(_)));

        assert!(Cli::try_parse_from(["cmt-admin", "special-scores", "--year", "2024", "--term", "winter"]).is_err());
    }

    #[test]
    fn test_pledge_check_takes_many_chapters() {
        let cli = Cli::try_parse_from([
            "cmt-admin", "pledge-check", "--chapter", "alpha", "--chapter", "beta",
        ])
        .unwrap();
        match cli.command {
            Commands::PledgeCheck(args) => assert_eq!(args.chapters, vec!["alpha", "beta"]),
            _ => panic!("wrong command"),
        }
    }
}
