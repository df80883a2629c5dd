//! Scoring service
//!
//! Activities are scored when reported. Term totals are re-derived from the
//! stored activity scores every time, then capped per term and per school
//! year before both rows of the school year are written back.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, Utc};
use cmt_core::entities::{Activity, ActivityCounts, ChapterScore, ScoreKind, ScoreType};
use cmt_core::events::{ActivityRecordedEvent, DomainEvent, ScoreRecalculatedEvent};
use cmt_core::scoring::{cap_school_year, compute_special, score_activity, ChapterTermStats, Formula};
use cmt_core::{DateSpan, DomainError, MemberStatus, Permissions, Snowflake, YearTerm};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::{
    ActivityResponse, ChapterScoresResponse, CreateScoreTypeRequest, RecalculateResponse,
    RecordActivityRequest, ScoreEntryResponse, ScoreTypeResponse,
};

use super::chapter::ChapterService;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

/// Outcome of a special-score run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SpecialScoresReport {
    pub chapters: usize,
    /// Term totals written
    pub scores: usize,
    pub failures: usize,
}

/// Scoring service
pub struct ScoreService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ScoreService<'a> {
    /// Create a new ScoreService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// List every score type
    #[instrument(skip(self))]
    pub async fn list_types(&self) -> ServiceResult<Vec<ScoreTypeResponse>> {
        let mut types = self.ctx.score_repo().list_types().await?;
        types.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(types.iter().map(ScoreTypeResponse::from).collect())
    }

    /// Define a score type (national officers)
    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create_type(
        &self,
        actor_id: Snowflake,
        request: CreateScoreTypeRequest,
    ) -> ServiceResult<ScoreTypeResponse> {
        request.validate()?;
        PermissionService::new(self.ctx)
            .require_global(actor_id, Permissions::MANAGE_SCORING)
            .await?;

        match (request.kind, request.special) {
            (ScoreKind::Special, None) => {
                return Err(ServiceError::validation("Special score types must name their family"))
            }
            (ScoreKind::Event | ScoreKind::Submission, Some(_)) => {
                return Err(ServiceError::validation("Only special score types take a family"))
            }
            _ => {}
        }
        if request.term_points > request.points {
            return Err(ServiceError::validation("term_points cannot exceed the yearly points"));
        }
        // Reject bad formulas now instead of at the first report
        Formula::parse(&request.formula)?;

        if self.ctx.score_repo().find_type_by_slug(&request.slug).await?.is_some() {
            return Err(DomainError::ScoreTypeSlugExists(request.slug).into());
        }

        let mut score_type = ScoreType::new(
            self.ctx.generate_id(),
            request.slug,
            request.name,
            request.section,
            request.kind,
            request.points,
            request.term_points,
        );
        score_type.description = request.description;
        score_type.formula = request.formula;
        score_type.base_points = request.base_points;
        score_type.attendance_multiplier = request.attendance_multiplier;
        score_type.member_add = request.member_add;
        score_type.stem_add = request.stem_add;
        score_type.alumni_add = request.alumni_add;
        score_type.guest_add = request.guest_add;
        score_type.special = request.special;

        self.ctx.score_repo().create_type(&score_type).await?;
        info!(score_type_id = %score_type.id, slug = %score_type.slug, "Score type created");
        Ok(ScoreTypeResponse::from(&score_type))
    }

    /// Report an event or submission and refresh the chapter's term total
    #[instrument(skip(self, request), fields(score_type = %request.score_type))]
    pub async fn record(
        &self,
        actor_id: Snowflake,
        chapter_id: Snowflake,
        kind: ScoreKind,
        request: RecordActivityRequest,
    ) -> ServiceResult<ActivityResponse> {
        request.validate()?;
        ChapterService::new(self.ctx).get_entity(chapter_id).await?;
        PermissionService::new(self.ctx)
            .require(actor_id, chapter_id, Permissions::RECORD_ACTIVITY)
            .await?;

        let score_type = self.type_by_slug(&request.score_type).await?;
        if score_type.kind != kind {
            return Err(ServiceError::validation(format!(
                "{} is a {} score type, not {}",
                score_type.slug, score_type.kind, kind
            )));
        }

        let counts = ActivityCounts {
            members: request.members,
            alumni: request.alumni,
            guests: request.guests,
            stem: request.stem,
            hours: request.hours,
            miles: request.miles,
        };
        let actives = self
            .ctx
            .timeline_repo()
            .count_status_on(chapter_id, &MemberStatus::COUNTS_AS_ACTIVE, request.date)
            .await?;
        let score = score_activity(&score_type, &counts, actives)?;

        let activity = Activity {
            id: self.ctx.generate_id(),
            chapter_id,
            score_type_id: score_type.id,
            kind,
            name: request.name,
            date: request.date,
            counts,
            score,
            created_by: Some(actor_id),
            created_at: Utc::now(),
        };
        self.ctx.score_repo().create_activity(&activity).await?;
        self.ctx
            .audit_repo()
            .append(&DomainEvent::ActivityRecorded(ActivityRecordedEvent {
                activity_id: activity.id,
                chapter_id,
                score_type_id: score_type.id,
                score,
                actor_id: Some(actor_id),
                timestamp: Utc::now(),
            }))
            .await?;

        let term_total = self
            .recalculate_term(chapter_id, &score_type, activity.term())
            .await?;

        info!(
            activity_id = %activity.id,
            chapter_id = %chapter_id,
            score,
            term_total,
            "Activity recorded"
        );
        Ok(ActivityResponse::new(&activity, term_total))
    }

    /// Scores of both terms of a school year, current one by default
    #[instrument(skip(self))]
    pub async fn scores(
        &self,
        actor_id: Snowflake,
        chapter_id: Snowflake,
        school_year: Option<i32>,
    ) -> ServiceResult<ChapterScoresResponse> {
        ChapterService::new(self.ctx).get_entity(chapter_id).await?;
        PermissionService::new(self.ctx)
            .require(actor_id, chapter_id, Permissions::VIEW_ROSTER)
            .await?;

        let school_year =
            school_year.unwrap_or_else(|| YearTerm::containing(self.ctx.today()).school_year());
        let terms = YearTerm::school_year_terms(school_year);

        let types: HashMap<Snowflake, ScoreType> = self
            .ctx
            .score_repo()
            .list_types()
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        let rows = self.ctx.score_repo().list_scores(chapter_id, &terms).await?;

        let mut scores: Vec<ScoreEntryResponse> = rows
            .iter()
            .filter_map(|row| types.get(&row.score_type_id).map(|t| (row, t)))
            .map(|(row, t)| ScoreEntryResponse::new(row, t))
            .collect();
        scores.sort_by(|a, b| (&a.section, &a.slug, &a.term).cmp(&(&b.section, &b.slug, &b.term)));
        let total = scores.iter().map(|s| s.score).sum::<f64>();

        Ok(ChapterScoresResponse {
            chapter_id: chapter_id.to_string(),
            school_year,
            scores,
            total: (total * 100.0).round() / 100.0,
        })
    }

    /// Rescore every reported type for one chapter (national officers)
    #[instrument(skip(self))]
    pub async fn recalculate_chapter(
        &self,
        actor_id: Snowflake,
        chapter_id: Snowflake,
    ) -> ServiceResult<RecalculateResponse> {
        PermissionService::new(self.ctx)
            .require_global(actor_id, Permissions::MANAGE_SCORING)
            .await?;
        ChapterService::new(self.ctx).get_entity(chapter_id).await?;

        let since = self.ctx.biennium().start_date();
        let mut report = RecalculateResponse::default();
        let types = self.ctx.score_repo().list_types().await?;
        for score_type in types.iter().filter(|t| t.special.is_none()) {
            self.rescore_into(&mut report, chapter_id, score_type, since).await;
        }
        report.chapters = 1;

        info!(chapter_id = %chapter_id, ?report, "Chapter scores recalculated");
        Ok(report)
    }

    /// Rescore one type since the biennium start, across every chapter that
    /// reported it or a single chapter
    #[instrument(skip(self))]
    pub async fn recalculate(
        &self,
        slug: &str,
        chapter_slug: Option<&str>,
    ) -> ServiceResult<RecalculateResponse> {
        let score_type = self.type_by_slug(slug).await?;
        if score_type.special.is_some() {
            return Err(ServiceError::validation(format!(
                "{slug} is computed by the special-score run"
            )));
        }

        let since = self.ctx.biennium().start_date();
        let chapters = match chapter_slug {
            Some(chapter_slug) => vec![ChapterService::new(self.ctx).get_by_slug(chapter_slug).await?.id],
            None => {
                self.ctx
                    .score_repo()
                    .chapters_with_activities(score_type.id, since)
                    .await?
            }
        };

        let mut report = RecalculateResponse::default();
        for chapter_id in chapters {
            if self.rescore_into(&mut report, chapter_id, &score_type, since).await {
                report.chapters += 1;
            }
        }

        info!(slug, ?report, "Score type recalculated");
        Ok(report)
    }

    /// Compute the special score families for every active chapter
    #[instrument(skip(self), fields(term = %term))]
    pub async fn special_scores(&self, term: YearTerm) -> ServiceResult<SpecialScoresReport> {
        let families: Vec<_> = self
            .ctx
            .score_repo()
            .list_types()
            .await?
            .into_iter()
            .filter_map(|t| {
                let family = t.special?;
                Some((t, family))
            })
            .collect();
        let mut report = SpecialScoresReport::default();
        if families.is_empty() {
            warn!("No special score types are defined");
            return Ok(report);
        }

        for chapter in self.ctx.chapter_repo().list(false).await? {
            let stats = match self.term_stats(chapter.id, term).await {
                Ok(stats) => stats,
                Err(err) => {
                    warn!(chapter = %chapter.slug, error = %err, "Could not gather term figures");
                    report.failures += 1;
                    continue;
                }
            };

            for (score_type, family) in &families {
                let points = compute_special(*family, &stats);
                match self.store_capped(chapter.id, score_type, term, points).await {
                    Ok(_) => report.scores += 1,
                    Err(err) => {
                        warn!(chapter = %chapter.slug, slug = %score_type.slug, error = %err, "Special score failed");
                        report.failures += 1;
                    }
                }
            }
            report.chapters += 1;
        }

        info!(?report, "Special scores computed");
        Ok(report)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn type_by_slug(&self, slug: &str) -> ServiceResult<ScoreType> {
        self.ctx
            .score_repo()
            .find_type_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::ScoreTypeNotFound(slug.to_string()).into())
    }

    /// Rescore one chapter, folding the outcome into `report`. Returns
    /// false when the chapter failed.
    async fn rescore_into(
        &self,
        report: &mut RecalculateResponse,
        chapter_id: Snowflake,
        score_type: &ScoreType,
        since: NaiveDate,
    ) -> bool {
        match self.rescore(chapter_id, score_type, since).await {
            Ok((activities, terms)) => {
                report.activities += activities;
                report.terms += terms;
                true
            }
            Err(err) => {
                warn!(chapter_id = %chapter_id, slug = %score_type.slug, error = %err, "Recalculation failed");
                report.failures += 1;
                false
            }
        }
    }

    /// Rescore a chapter's activities of one type and rebuild the affected
    /// term totals. Returns the changed activity and term counts.
    async fn rescore(
        &self,
        chapter_id: Snowflake,
        score_type: &ScoreType,
        since: NaiveDate,
    ) -> ServiceResult<(usize, usize)> {
        let activities = self
            .ctx
            .score_repo()
            .list_activities(chapter_id, Some(score_type.id), DateSpan::open(since))
            .await?;

        let mut actives: HashMap<NaiveDate, i64> = HashMap::new();
        let mut changed = Vec::new();
        let mut terms = BTreeSet::new();
        for activity in &activities {
            let count = match actives.get(&activity.date) {
                Some(count) => *count,
                None => {
                    let count = self
                        .ctx
                        .timeline_repo()
                        .count_status_on(chapter_id, &MemberStatus::COUNTS_AS_ACTIVE, activity.date)
                        .await?;
                    actives.insert(activity.date, count);
                    count
                }
            };
            let score = score_activity(score_type, &activity.counts, count)?;
            if (score - activity.score).abs() > f64::EPSILON {
                changed.push((activity.id, score));
            }
            terms.insert(activity.term());
        }

        if !changed.is_empty() {
            self.ctx.score_repo().update_activity_scores(&changed).await?;
        }
        for term in &terms {
            self.recalculate_term(chapter_id, score_type, *term).await?;
        }
        Ok((changed.len(), terms.len()))
    }

    /// Re-derive one term total from the stored activity scores
    async fn recalculate_term(
        &self,
        chapter_id: Snowflake,
        score_type: &ScoreType,
        term: YearTerm,
    ) -> ServiceResult<f64> {
        let raw: f64 = self
            .ctx
            .score_repo()
            .list_activities(chapter_id, Some(score_type.id), term.span())
            .await?
            .iter()
            .map(|a| a.score)
            .sum();
        self.store_capped(chapter_id, score_type, term, raw).await
    }

    /// Cap a raw term total against its school-year partner and persist
    /// both. Returns the stored total for `term`.
    async fn store_capped(
        &self,
        chapter_id: Snowflake,
        score_type: &ScoreType,
        term: YearTerm,
        raw: f64,
    ) -> ServiceResult<f64> {
        let partner_term = term.counterpart();
        let partner = self
            .ctx
            .score_repo()
            .find_score(chapter_id, score_type.id, partner_term)
            .await?;

        let capped = cap_school_year(
            term.term,
            raw,
            partner.as_ref().map_or(0.0, |p| p.score),
            score_type.term_points,
            score_type.points,
        );

        let mut rows = vec![ChapterScore::new(chapter_id, score_type.id, term, capped.current)];
        if partner.is_some_and(|p| (p.score - capped.other).abs() > f64::EPSILON) {
            rows.push(ChapterScore::new(chapter_id, score_type.id, partner_term, capped.other));
        }
        self.ctx.score_repo().upsert_scores(&rows).await?;
        self.ctx
            .audit_repo()
            .append(&DomainEvent::ScoreRecalculated(ScoreRecalculatedEvent::new(
                chapter_id,
                score_type.id,
                term,
                capped.current,
            )))
            .await?;

        Ok(capped.current)
    }

    async fn term_stats(
        &self,
        chapter_id: Snowflake,
        term: YearTerm,
    ) -> ServiceResult<ChapterTermStats> {
        let span = term.span();
        let timeline = self.ctx.timeline_repo();
        Ok(ChapterTermStats {
            pledged: timeline
                .count_status_starts(chapter_id, MemberStatus::Pnm, span)
                .await?,
            initiated: timeline.count_initiated_pledges(chapter_id, span).await?,
            graduated: timeline
                .count_status_starts(chapter_id, MemberStatus::Alumnipend, span)
                .await?,
            actives: timeline
                .count_status_on(chapter_id, &MemberStatus::COUNTS_AS_ACTIVE, span.end)
                .await?,
            events: self
                .ctx
                .score_repo()
                .count_activities(chapter_id, ScoreKind::Event, span)
                .await?,
        })
    }
}
