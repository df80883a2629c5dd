//! In-memory repositories for service tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use cmt_core::entities::{
    Activity, Chapter, ChapterScore, Member, RoleInterval, ScoreKind, ScoreType, StatusInterval,
    TransitionRecord,
};
use cmt_core::events::DomainEvent;
use cmt_core::traits::{
    AuditRepository, ChapterRepository, MemberRepository, RepoResult, RoleHolder,
    ScoreRepository, StalePledge, TimelineRepository, TimelineWrite,
};
use cmt_core::{DateSpan, DomainError, MemberStatus, MemberTimeline, Snowflake, YearTerm};

use crate::services::{ServiceContext, ServiceContextBuilder};

#[derive(Default)]
struct State {
    chapters: BTreeMap<Snowflake, Chapter>,
    members: BTreeMap<Snowflake, Member>,
    passwords: BTreeMap<Snowflake, String>,
    statuses: Vec<StatusInterval>,
    roles: Vec<RoleInterval>,
    transitions: Vec<TransitionRecord>,
    score_types: Vec<ScoreType>,
    activities: Vec<Activity>,
    scores: Vec<ChapterScore>,
    events: Vec<DomainEvent>,
}

impl State {
    fn members_of(&self, chapter_id: Snowflake) -> impl Iterator<Item = &Member> {
        self.members.values().filter(move |m| m.chapter_id == chapter_id)
    }

    fn in_chapter(&self, member_id: Snowflake, chapter_id: Snowflake) -> bool {
        self.members
            .get(&member_id)
            .is_some_and(|m| m.chapter_id == chapter_id)
    }
}

/// Shared in-memory store implementing every repository trait
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    /// Number of upcoming `apply` calls to fail with a version conflict
    conflicts: Arc<AtomicU32>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn context(&self) -> ServiceContext {
        ServiceContextBuilder::new()
            .chapter_repo(Arc::new(self.clone()))
            .member_repo(Arc::new(self.clone()))
            .timeline_repo(Arc::new(self.clone()))
            .score_repo(Arc::new(self.clone()))
            .audit_repo(Arc::new(self.clone()))
            .build()
            .unwrap()
    }

    pub fn fail_next_applies(&self, count: u32) {
        self.conflicts.store(count, Ordering::SeqCst);
    }

    pub fn add_chapter(&self, id: i64, slug: &str) -> Chapter {
        let chapter = Chapter::new(Snowflake::new(id), slug.to_uppercase(), slug.to_string());
        self.lock().chapters.insert(chapter.id, chapter.clone());
        chapter
    }

    /// Insert a member whose history is `(status, start, end)` rows
    pub fn add_member(
        &self,
        id: i64,
        chapter: &Chapter,
        history: &[(MemberStatus, NaiveDate, Option<NaiveDate>)],
    ) -> Member {
        let member_id = Snowflake::new(id);
        let mut member = Member::new(
            member_id,
            chapter.id,
            format!("m{id}@example.edu"),
            "Test".to_string(),
            format!("Member{id}"),
        );
        let mut state = self.lock();
        for (i, (status, start, end)) in history.iter().enumerate() {
            let span = DateSpan::until(*start, *end).unwrap();
            state.statuses.push(StatusInterval::new(
                Snowflake::new(id * 100 + i as i64),
                member_id,
                *status,
                span,
            ));
        }
        if let Some((status, _, _)) = history.last() {
            member.current_status = *status;
        }
        state.members.insert(member_id, member.clone());
        member
    }

    pub fn add_role(&self, id: i64, member: &Member, role: &str, span: DateSpan) {
        let interval = RoleInterval::new(Snowflake::new(id), member.id, role.to_string(), span);
        let mut state = self.lock();
        state.roles.push(interval);
        let today = chrono::Utc::now().date_naive();
        if span.contains(today) {
            if let Some(m) = state.members.get_mut(&member.id) {
                m.current_roles.push(role.to_string());
            }
        }
    }

    pub fn set_password_hash(&self, member: &Member, hash: &str) {
        self.lock().passwords.insert(member.id, hash.to_string());
    }

    pub fn member(&self, id: Snowflake) -> Member {
        self.lock().members[&id].clone()
    }

    pub fn statuses_of(&self, member_id: Snowflake) -> Vec<StatusInterval> {
        let mut rows: Vec<_> = self
            .lock()
            .statuses
            .iter()
            .filter(|s| s.member_id == member_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.span.start);
        rows
    }

    pub fn transitions_of(&self, member_id: Snowflake) -> usize {
        self.lock()
            .transitions
            .iter()
            .filter(|t| t.member_id == member_id)
            .count()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.lock().events.clone()
    }

    pub fn score(&self, chapter_id: Snowflake, score_type_id: Snowflake, term: YearTerm) -> Option<f64> {
        self.lock()
            .scores
            .iter()
            .find(|s| s.chapter_id == chapter_id && s.score_type_id == score_type_id && s.term == term)
            .map(|s| s.score)
    }

    /// Add a raw status row without touching the version
    pub fn push_status(&self, interval: StatusInterval) {
        self.lock().statuses.push(interval);
    }
}

#[async_trait]
impl ChapterRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Chapter>> {
        Ok(self.lock().chapters.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Chapter>> {
        Ok(self.lock().chapters.values().find(|c| c.slug == slug).cloned())
    }

    async fn list(&self, include_inactive: bool) -> RepoResult<Vec<Chapter>> {
        Ok(self
            .lock()
            .chapters
            .values()
            .filter(|c| c.active || include_inactive)
            .cloned()
            .collect())
    }

    async fn create(&self, chapter: &Chapter) -> RepoResult<()> {
        let mut state = self.lock();
        if state.chapters.values().any(|c| c.slug == chapter.slug) {
            return Err(DomainError::ChapterSlugExists(chapter.slug.clone()));
        }
        state.chapters.insert(chapter.id, chapter.clone());
        Ok(())
    }

    async fn update(&self, chapter: &Chapter) -> RepoResult<()> {
        let mut state = self.lock();
        match state.chapters.get_mut(&chapter.id) {
            Some(existing) => {
                *existing = chapter.clone();
                Ok(())
            }
            None => Err(DomainError::ChapterNotFound(chapter.id.to_string())),
        }
    }
}

#[async_trait]
impl MemberRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Member>> {
        Ok(self.lock().members.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Member>> {
        Ok(self
            .lock()
            .members
            .values()
            .find(|m| m.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        Ok(MemberRepository::find_by_email(self, email).await?.is_some())
    }

    async fn list_by_chapter(
        &self,
        chapter_id: Snowflake,
        status: Option<MemberStatus>,
        limit: i64,
        after: Option<Snowflake>,
    ) -> RepoResult<Vec<Member>> {
        let state = self.lock();
        Ok(state
            .members_of(chapter_id)
            .filter(|m| status.is_none_or(|s| m.current_status == s))
            .filter(|m| after.is_none_or(|a| m.id > a))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn list_page(&self, after: Option<Snowflake>, limit: i64) -> RepoResult<Vec<Member>> {
        Ok(self
            .lock()
            .members
            .values()
            .filter(|m| after.is_none_or(|a| m.id > a))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn count_by_status(
        &self,
        chapter_id: Snowflake,
        statuses: &[MemberStatus],
    ) -> RepoResult<i64> {
        let state = self.lock();
        Ok(state
            .members_of(chapter_id)
            .filter(|m| statuses.contains(&m.current_status))
            .count() as i64)
    }

    async fn create(
        &self,
        member: &Member,
        password_hash: Option<&str>,
        initial: &[StatusInterval],
        event: &DomainEvent,
    ) -> RepoResult<()> {
        let mut state = self.lock();
        if !state.chapters.contains_key(&member.chapter_id) {
            return Err(DomainError::ChapterNotFound(member.chapter_id.to_string()));
        }
        if state.members.values().any(|m| m.email.eq_ignore_ascii_case(&member.email)) {
            return Err(DomainError::EmailAlreadyExists);
        }
        state.members.insert(member.id, member.clone());
        if let Some(hash) = password_hash {
            state.passwords.insert(member.id, hash.to_string());
        }
        state.statuses.extend(initial.iter().cloned());
        state.events.push(event.clone());
        Ok(())
    }

    async fn update_profile(&self, member: &Member) -> RepoResult<()> {
        let mut state = self.lock();
        let taken = state
            .members
            .values()
            .any(|m| m.id != member.id && m.email.eq_ignore_ascii_case(&member.email));
        if taken {
            return Err(DomainError::EmailAlreadyExists);
        }
        let existing = state
            .members
            .get_mut(&member.id)
            .ok_or(DomainError::MemberNotFound(member.id))?;
        existing.email.clone_from(&member.email);
        existing.first_name.clone_from(&member.first_name);
        existing.last_name.clone_from(&member.last_name);
        existing.badge_number = member.badge_number;
        existing.graduation_year = member.graduation_year;
        existing.phone.clone_from(&member.phone);
        Ok(())
    }

    async fn get_password_hash(&self, id: Snowflake) -> RepoResult<Option<String>> {
        Ok(self.lock().passwords.get(&id).cloned())
    }

    async fn update_password(&self, id: Snowflake, password_hash: &str) -> RepoResult<()> {
        let mut state = self.lock();
        if !state.members.contains_key(&id) {
            return Err(DomainError::MemberNotFound(id));
        }
        state.passwords.insert(id, password_hash.to_string());
        Ok(())
    }

    async fn update_current(
        &self,
        id: Snowflake,
        expected_version: i64,
        status: MemberStatus,
        roles: &[String],
    ) -> RepoResult<bool> {
        let mut state = self.lock();
        match state.members.get_mut(&id) {
            Some(m) if m.timeline_version == expected_version => {
                m.current_status = status;
                m.current_roles = roles.to_vec();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TimelineRepository for MemoryStore {
    async fn load(&self, member_id: Snowflake) -> RepoResult<Option<MemberTimeline>> {
        let state = self.lock();
        let Some(member) = state.members.get(&member_id) else {
            return Ok(None);
        };
        Ok(Some(MemberTimeline::new(
            member_id,
            member.timeline_version,
            state.statuses.iter().filter(|s| s.member_id == member_id).cloned().collect(),
            state.roles.iter().filter(|r| r.member_id == member_id).cloned().collect(),
        )))
    }

    async fn apply(&self, writes: &[TimelineWrite]) -> RepoResult<()> {
        let pending = self.conflicts.load(Ordering::SeqCst);
        if pending > 0 {
            self.conflicts.store(pending - 1, Ordering::SeqCst);
            return Err(DomainError::TimelineConflict(writes[0].member_id));
        }

        let mut state = self.lock();
        for write in writes {
            let member = state
                .members
                .get(&write.member_id)
                .ok_or(DomainError::MemberNotFound(write.member_id))?;
            if member.timeline_version != write.expected_version {
                return Err(DomainError::TimelineConflict(write.member_id));
            }
            if let Some(chapter_id) = write.chapter_id {
                if !state.chapters.contains_key(&chapter_id) {
                    return Err(DomainError::ChapterNotFound(chapter_id.to_string()));
                }
            }
        }

        for write in writes {
            write.statuses.apply_to(&mut state.statuses);
            write.roles.apply_to(&mut state.roles);
            if let Some(member) = state.members.get_mut(&write.member_id) {
                member.current_status = write.current_status;
                member.current_roles.clone_from(&write.current_roles);
                member.chapter_id = write.chapter_id.unwrap_or(member.chapter_id);
                member.timeline_version += 1;
            }
            if let Some(record) = &write.transition {
                state.transitions.push(record.clone());
            }
            state.events.extend(write.events.iter().cloned());
        }
        Ok(())
    }

    async fn list_transitions(&self, member_id: Snowflake) -> RepoResult<Vec<TransitionRecord>> {
        Ok(self
            .lock()
            .transitions
            .iter()
            .filter(|t| t.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn members_with_overlaps(&self) -> RepoResult<Vec<Snowflake>> {
        let ids: Vec<Snowflake> = self.lock().members.keys().copied().collect();
        let mut out = Vec::new();
        for id in ids {
            if let Some(timeline) = self.load(id).await? {
                if timeline.first_overlap().is_some() {
                    out.push(id);
                }
            }
        }
        Ok(out)
    }

    async fn count_status_starts(
        &self,
        chapter_id: Snowflake,
        status: MemberStatus,
        span: DateSpan,
    ) -> RepoResult<i64> {
        let state = self.lock();
        let mut members: Vec<Snowflake> = state
            .statuses
            .iter()
            .filter(|s| s.status == status && span.contains(s.span.start))
            .filter(|s| state.in_chapter(s.member_id, chapter_id))
            .map(|s| s.member_id)
            .collect();
        members.sort();
        members.dedup();
        Ok(members.len() as i64)
    }

    async fn count_initiated_pledges(&self, chapter_id: Snowflake, span: DateSpan) -> RepoResult<i64> {
        let state = self.lock();
        let mut members: Vec<Snowflake> = state
            .statuses
            .iter()
            .filter(|p| p.status == MemberStatus::Pnm && span.contains(p.span.start))
            .filter(|p| state.in_chapter(p.member_id, chapter_id))
            .filter(|p| {
                state.statuses.iter().any(|a| {
                    a.member_id == p.member_id
                        && a.status == MemberStatus::Active
                        && a.span.start > p.span.start
                })
            })
            .map(|p| p.member_id)
            .collect();
        members.sort();
        members.dedup();
        Ok(members.len() as i64)
    }

    async fn count_status_on(
        &self,
        chapter_id: Snowflake,
        statuses: &[MemberStatus],
        day: NaiveDate,
    ) -> RepoResult<i64> {
        let state = self.lock();
        let mut members: Vec<Snowflake> = state
            .statuses
            .iter()
            .filter(|s| statuses.contains(&s.status) && s.span.contains(day))
            .filter(|s| state.in_chapter(s.member_id, chapter_id))
            .map(|s| s.member_id)
            .collect();
        members.sort();
        members.dedup();
        Ok(members.len() as i64)
    }

    async fn stale_pledges(
        &self,
        chapter_id: Option<Snowflake>,
        cutoff: NaiveDate,
        today: NaiveDate,
    ) -> RepoResult<Vec<StalePledge>> {
        let state = self.lock();
        Ok(state
            .statuses
            .iter()
            .filter(|s| s.status == MemberStatus::Pnm && s.span.start < cutoff && s.span.contains(today))
            .filter_map(|s| state.members.get(&s.member_id).map(|m| (s, m)))
            .filter(|(_, m)| chapter_id.is_none_or(|c| m.chapter_id == c))
            .map(|(s, m)| StalePledge {
                member_id: m.id,
                chapter_id: m.chapter_id,
                name: m.full_name(),
                email: m.email.clone(),
                pledged_on: s.span.start,
            })
            .collect())
    }

    async fn chapters_without_pledges_since(&self, since: NaiveDate) -> RepoResult<Vec<Chapter>> {
        let state = self.lock();
        Ok(state
            .chapters
            .values()
            .filter(|c| c.active)
            .filter(|c| {
                !state.statuses.iter().any(|s| {
                    s.status == MemberStatus::Pnm
                        && s.span.start >= since
                        && state.in_chapter(s.member_id, c.id)
                })
            })
            .cloned()
            .collect())
    }

    async fn roles_on(&self, chapter_id: Snowflake, day: NaiveDate) -> RepoResult<Vec<RoleHolder>> {
        let state = self.lock();
        Ok(state
            .roles
            .iter()
            .filter(|r| r.span.contains(day))
            .filter_map(|r| state.members.get(&r.member_id).map(|m| (r, m)))
            .filter(|(_, m)| m.chapter_id == chapter_id)
            .map(|(r, m)| RoleHolder {
                interval: r.clone(),
                chapter_id: m.chapter_id,
                name: m.full_name(),
            })
            .collect())
    }
}

#[async_trait]
impl ScoreRepository for MemoryStore {
    async fn list_types(&self) -> RepoResult<Vec<ScoreType>> {
        Ok(self.lock().score_types.clone())
    }

    async fn find_type_by_id(&self, id: Snowflake) -> RepoResult<Option<ScoreType>> {
        Ok(self.lock().score_types.iter().find(|t| t.id == id).cloned())
    }

    async fn find_type_by_slug(&self, slug: &str) -> RepoResult<Option<ScoreType>> {
        Ok(self.lock().score_types.iter().find(|t| t.slug == slug).cloned())
    }

    async fn create_type(&self, score_type: &ScoreType) -> RepoResult<()> {
        let mut state = self.lock();
        if state.score_types.iter().any(|t| t.slug == score_type.slug) {
            return Err(DomainError::ScoreTypeSlugExists(score_type.slug.clone()));
        }
        state.score_types.push(score_type.clone());
        Ok(())
    }

    async fn create_activity(&self, activity: &Activity) -> RepoResult<()> {
        self.lock().activities.push(activity.clone());
        Ok(())
    }

    async fn list_activities(
        &self,
        chapter_id: Snowflake,
        score_type_id: Option<Snowflake>,
        span: DateSpan,
    ) -> RepoResult<Vec<Activity>> {
        let mut rows: Vec<Activity> = self
            .lock()
            .activities
            .iter()
            .filter(|a| a.chapter_id == chapter_id && span.contains(a.date))
            .filter(|a| score_type_id.is_none_or(|t| a.score_type_id == t))
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.date, a.id));
        Ok(rows)
    }

    async fn chapters_with_activities(
        &self,
        score_type_id: Snowflake,
        since: NaiveDate,
    ) -> RepoResult<Vec<Snowflake>> {
        let mut ids: Vec<Snowflake> = self
            .lock()
            .activities
            .iter()
            .filter(|a| a.score_type_id == score_type_id && a.date >= since)
            .map(|a| a.chapter_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn update_activity_scores(&self, scores: &[(Snowflake, f64)]) -> RepoResult<()> {
        let mut state = self.lock();
        for (id, score) in scores {
            if let Some(a) = state.activities.iter_mut().find(|a| a.id == *id) {
                a.score = *score;
            }
        }
        Ok(())
    }

    async fn count_activities(
        &self,
        chapter_id: Snowflake,
        kind: ScoreKind,
        span: DateSpan,
    ) -> RepoResult<i64> {
        Ok(self
            .lock()
            .activities
            .iter()
            .filter(|a| a.chapter_id == chapter_id && a.kind == kind && span.contains(a.date))
            .count() as i64)
    }

    async fn find_score(
        &self,
        chapter_id: Snowflake,
        score_type_id: Snowflake,
        term: YearTerm,
    ) -> RepoResult<Option<ChapterScore>> {
        Ok(self
            .lock()
            .scores
            .iter()
            .find(|s| s.chapter_id == chapter_id && s.score_type_id == score_type_id && s.term == term)
            .cloned())
    }

    async fn upsert_scores(&self, scores: &[ChapterScore]) -> RepoResult<()> {
        let mut state = self.lock();
        for score in scores {
            state.scores.retain(|s| {
                !(s.chapter_id == score.chapter_id
                    && s.score_type_id == score.score_type_id
                    && s.term == score.term)
            });
            state.scores.push(score.clone());
        }
        Ok(())
    }

    async fn list_scores(
        &self,
        chapter_id: Snowflake,
        terms: &[YearTerm],
    ) -> RepoResult<Vec<ChapterScore>> {
        Ok(self
            .lock()
            .scores
            .iter()
            .filter(|s| s.chapter_id == chapter_id && terms.contains(&s.term))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn append(&self, event: &DomainEvent) -> RepoResult<()> {
        self.lock().events.push(event.clone());
        Ok(())
    }

    async fn list_for_member(
        &self,
        member_id: Snowflake,
        limit: i64,
    ) -> RepoResult<Vec<DomainEvent>> {
        Ok(self
            .lock()
            .events
            .iter()
            .rev()
            .filter(|e| e.member_id() == Some(member_id))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
