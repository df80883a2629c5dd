//! Maintenance jobs run by `cmt-admin`
//!
//! None of these act on behalf of a member, so they skip permission checks.
//! Per-member failures are logged and counted instead of aborting the run.

use chrono::{Datelike, Months, NaiveDate, Utc, Weekday};
use cmt_common::validate_password_strength;
use cmt_core::entities::Chapter;
use cmt_core::events::{DomainEvent, MemberEvent, TimelineRepairedEvent};
use cmt_core::traits::{StalePledge, TimelineWrite};
use cmt_core::Snowflake;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::chapter::ChapterService;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::member::MemberService;

/// Members loaded per page while scanning the whole membership
const SYNC_PAGE_SIZE: i64 = 500;

/// Months without a new pledge before a chapter is reported as quiet
const QUIET_CHAPTER_MONTHS: u32 = 8;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// False when skipped because it is not Tuesday
    pub ran: bool,
    pub scanned: usize,
    pub updated: usize,
    /// Cache rows left alone because a timeline write landed meanwhile
    pub conflicts: usize,
    pub failures: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DedupeReport {
    /// Members whose history was repaired
    pub members: usize,
    pub removed: usize,
    pub adjusted: usize,
    pub failures: usize,
}

#[derive(Debug, Default, Clone)]
pub struct PledgeCheckReport {
    pub stale: Vec<StalePledge>,
    pub quiet_chapters: Vec<Chapter>,
}

/// Maintenance service
pub struct MaintenanceService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MaintenanceService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Refresh every member's cached current status and roles.
    ///
    /// Runs weekly on Tuesday unless `force` is set.
    #[instrument(skip(self))]
    pub async fn sync_current(&self, today: NaiveDate, force: bool) -> ServiceResult<SyncReport> {
        let mut report = SyncReport::default();
        if !force && today.weekday() != Weekday::Tue {
            info!(%today, "Not Tuesday, skipping current status sync");
            return Ok(report);
        }
        report.ran = true;

        let mut after = None;
        loop {
            let page = self
                .ctx
                .member_repo()
                .list_page(after, SYNC_PAGE_SIZE)
                .await?;
            let Some(last) = page.last() else { break };
            after = Some(last.id);

            for member in &page {
                report.scanned += 1;
                let timeline = match self.ctx.timeline_repo().load(member.id).await {
                    Ok(Some(timeline)) => timeline,
                    Ok(None) => continue,
                    Err(err) => {
                        warn!(member_id = %member.id, error = %err, "Could not load timeline");
                        report.failures += 1;
                        continue;
                    }
                };

                let status = timeline.current_status(today);
                let roles = timeline.current_roles(today);
                if status == member.current_status && roles == member.current_roles {
                    continue;
                }

                match self
                    .ctx
                    .member_repo()
                    .update_current(member.id, timeline.version, status, &roles)
                    .await
                {
                    Ok(true) => {
                        debug!(member_id = %member.id, %status, "Current status refreshed");
                        report.updated += 1;
                    }
                    Ok(false) => report.conflicts += 1,
                    Err(err) => {
                        warn!(member_id = %member.id, error = %err, "Could not refresh current status");
                        report.failures += 1;
                    }
                }
            }

            if page.len() < SYNC_PAGE_SIZE as usize {
                break;
            }
        }

        info!(?report, "Current status sync finished");
        Ok(report)
    }

    /// Repair members whose status intervals overlap
    #[instrument(skip(self))]
    pub async fn dedupe_status(&self, dry_run: bool) -> ServiceResult<DedupeReport> {
        let mut report = DedupeReport::default();
        for member_id in self.ctx.timeline_repo().members_with_overlaps().await? {
            match self.repair(member_id, dry_run).await {
                Ok((removed, adjusted)) => {
                    if removed + adjusted > 0 {
                        report.members += 1;
                        report.removed += removed;
                        report.adjusted += adjusted;
                    }
                }
                Err(err) => {
                    warn!(member_id = %member_id, error = %err, "Could not repair status history");
                    report.failures += 1;
                }
            }
        }

        info!(dry_run, ?report, "Status dedupe finished");
        Ok(report)
    }

    /// Pledges that have not been initiated within the stale window, and
    /// chapters with no new pledge in eight months
    #[instrument(skip(self))]
    pub async fn pledge_check(
        &self,
        chapter_slugs: &[String],
        today: NaiveDate,
    ) -> ServiceResult<PledgeCheckReport> {
        let cutoff = today - chrono::Duration::days(self.ctx.domain().pledge_stale_days);
        let quiet_since = today
            .checked_sub_months(Months::new(QUIET_CHAPTER_MONTHS))
            .unwrap_or(NaiveDate::MIN);

        let mut chapters = Vec::with_capacity(chapter_slugs.len());
        for slug in chapter_slugs {
            chapters.push(ChapterService::new(self.ctx).get_by_slug(slug).await?.id);
        }

        let timeline = self.ctx.timeline_repo();
        let mut report = PledgeCheckReport::default();
        if chapters.is_empty() {
            report.stale = timeline.stale_pledges(None, cutoff, today).await?;
        } else {
            for chapter_id in &chapters {
                report
                    .stale
                    .extend(timeline.stale_pledges(Some(*chapter_id), cutoff, today).await?);
            }
        }
        report.stale.sort_by_key(|p| (p.pledged_on, p.member_id));

        report.quiet_chapters = timeline
            .chapters_without_pledges_since(quiet_since)
            .await?
            .into_iter()
            .filter(|c| chapters.is_empty() || chapters.contains(&c.id))
            .collect();
        report.quiet_chapters.sort_by(|a, b| a.slug.cmp(&b.slug));

        info!(
            stale = report.stale.len(),
            quiet = report.quiet_chapters.len(),
            "Pledge check finished"
        );
        Ok(report)
    }

    /// Store a new password for the member with `email`
    #[instrument(skip(self, password))]
    pub async fn set_password(&self, email: &str, password: &str) -> ServiceResult<Snowflake> {
        validate_password_strength(password)?;
        let member = self
            .ctx
            .member_repo()
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member", email))?;

        let hash = self.ctx.password_service().hash(password)?;
        self.ctx.member_repo().update_password(member.id, &hash).await?;
        self.ctx
            .audit_repo()
            .append(&DomainEvent::PasswordChanged(MemberEvent::new(
                member.id,
                member.chapter_id,
                None,
            )))
            .await?;

        info!(member_id = %member.id, "Password changed");
        Ok(member.id)
    }

    /// Returns the removed and adjusted interval counts
    async fn repair(&self, member_id: Snowflake, dry_run: bool) -> ServiceResult<(usize, usize)> {
        let Some(timeline) = self.ctx.timeline_repo().load(member_id).await? else {
            return Ok((0, 0));
        };
        let plan = timeline.plan_repair();
        let counts = (plan.deletes.len(), plan.updates.len());
        if plan.is_empty() || dry_run {
            return Ok(counts);
        }

        let chapter_id = MemberService::new(self.ctx).get_entity(member_id).await?.chapter_id;

        let mut after = timeline.clone();
        after.apply_status_plan(&plan);
        after.ensure_disjoint()?;

        let mut write = TimelineWrite::new(&after, self.ctx.today());
        write.expected_version = timeline.version;
        write.statuses = plan;
        write.events.push(DomainEvent::TimelineRepaired(TimelineRepairedEvent {
            member_id,
            chapter_id,
            removed: counts.0,
            adjusted: counts.1,
            timestamp: Utc::now(),
        }));
        self.ctx.timeline_repo().apply(&[write]).await?;

        info!(member_id = %member_id, removed = counts.0, adjusted = counts.1, "Status history repaired");
        Ok(counts)
    }
}
