//! Score recalculation runs

use clap::Args;
use cmt_core::{Term, YearTerm};
use cmt_service::ScoreService;

use crate::context::service_context;

#[derive(Args)]
pub struct RecalculateArgs {
    /// Score type slug
    pub slug: String,

    /// Only this chapter
    #[arg(long)]
    pub chapter: Option<String>,
}

#[derive(Args)]
pub struct SpecialScoresArgs {
    #[arg(long)]
    pub year: i32,

    /// `sp` or `fa`
    #[arg(long)]
    pub term: Term,
}

pub async fn recalculate(args: RecalculateArgs) -> anyhow::Result<()> {
    let ctx = service_context().await?;
    let report = ScoreService::new(&ctx)
        .recalculate(&args.slug, args.chapter.as_deref())
        .await?;

    println!(
        "{}: {} chapter(s), {} activities rescored, {} term total(s), {} failure(s)",
        args.slug, report.chapters, report.activities, report.terms, report.failures
    );
    Ok(())
}

pub async fn special_scores(args: SpecialScoresArgs) -> anyhow::Result<()> {
    let ctx = service_context().await?;
    let term = YearTerm::new(args.year, args.term);
    let report = ScoreService::new(&ctx).special_scores(term).await?;

    println!(
        "{term}: {} chapter(s), {} score(s) written, {} failure(s)",
        report.chapters, report.scores, report.failures
    );
    Ok(())
}
