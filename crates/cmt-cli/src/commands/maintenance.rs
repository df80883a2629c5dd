//! Schema and membership maintenance

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use cmt_db::{default_migrations_dir, run_migrations};
use cmt_service::MaintenanceService;
use tracing::info;

use crate::context::{connect, service_context};

#[derive(Args)]
pub struct MigrateArgs {
    /// Directory of SQL migrations, defaults to the one bundled at build time
    #[arg(long, env = "MIGRATIONS_DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct SyncCurrentArgs {
    /// Run even when today is not Tuesday
    #[arg(long = "override")]
    pub force: bool,

    /// Day to sync as of (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

#[derive(Args)]
pub struct DedupeStatusArgs {
    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct PledgeCheckArgs {
    /// Limit to these chapter slugs
    #[arg(long = "chapter")]
    pub chapters: Vec<String>,
}

pub async fn migrate(args: MigrateArgs) -> anyhow::Result<()> {
    let pool = connect().await?;
    let dir = args.dir.unwrap_or_else(default_migrations_dir);
    let applied = run_migrations(&pool, &dir)
        .await
        .with_context(|| format!("running migrations from {}", dir.display()))?;
    info!(applied, "Migrations complete");
    println!("Applied {applied} migration(s)");
    Ok(())
}

pub async fn sync_current(args: SyncCurrentArgs) -> anyhow::Result<()> {
    let ctx = service_context().await?;
    let today = args.today.unwrap_or_else(|| ctx.today());

    let report = MaintenanceService::new(&ctx).sync_current(today, args.force).await?;
    if !report.ran {
        println!("{today} is not a Tuesday; pass --override to sync anyway");
        return Ok(());
    }
    println!(
        "Scanned {} members, updated {}, {} conflict(s), {} failure(s)",
        report.scanned, report.updated, report.conflicts, report.failures
    );
    Ok(())
}

pub async fn dedupe_status(args: DedupeStatusArgs) -> anyhow::Result<()> {
    let ctx = service_context().await?;
    let report = MaintenanceService::new(&ctx).dedupe_status(args.dry_run).await?;

    let verb = if args.dry_run { "Would repair" } else { "Repaired" };
    println!(
        "{verb} {} member(s): {} interval(s) removed, {} adjusted, {} failure(s)",
        report.members, report.removed, report.adjusted, report.failures
    );
    Ok(())
}

pub async fn pledge_check(args: PledgeCheckArgs) -> anyhow::Result<()> {
    let ctx = service_context().await?;
    let report = MaintenanceService::new(&ctx)
        .pledge_check(&args.chapters, ctx.today())
        .await?;

    println!("Stale pledges: {}", report.stale.len());
    for pledge in &report.stale {
        println!(
            "  {}  {} <{}>  chapter {}",
            pledge.pledged_on, pledge.name, pledge.email, pledge.chapter_id
        );
    }

    println!("Chapters with no new pledges: {}", report.quiet_chapters.len());
    for chapter in &report.quiet_chapters {
        println!("  {} ({})", chapter.name, chapter.slug);
    }
    Ok(())
}
