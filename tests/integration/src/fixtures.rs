//! Seed data written straight through the repositories
//!
//! The API has no self-registration, so every test starts from accounts
//! created here.

use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use cmt_common::hash_password;
use cmt_core::entities::{Chapter, Member, RoleInterval, StatusInterval};
use cmt_core::events::{DomainEvent, MemberCreatedEvent};
use cmt_core::traits::{ChapterRepository, MemberRepository, TimelineRepository, TimelineWrite};
use cmt_core::value_objects::{DateSpan, MemberStatus, Snowflake};
use cmt_db::{PgChapterRepository, PgMemberRepository, PgPool, PgTimelineRepository};

pub const TEST_PASSWORD: &str = "Chapter123";

/// Unique ids across tests sharing one database
pub fn unique_id() -> Snowflake {
    static COUNTER: AtomicI64 = AtomicI64::new(0);
    let base = Utc::now().timestamp_micros() << 8;
    Snowflake::new(base + COUNTER.fetch_add(1, Ordering::SeqCst))
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A member who can log in
#[derive(Debug, Clone)]
pub struct Seeded {
    pub id: Snowflake,
    pub chapter_id: Snowflake,
    pub email: String,
}

pub async fn seed_chapter(pool: &PgPool) -> Result<Chapter> {
    let id = unique_id();
    let chapter = Chapter::new(id, format!("Chapter {id}"), format!("chapter-{id}"));
    PgChapterRepository::new(pool.clone()).create(&chapter).await?;
    Ok(chapter)
}

/// An active member since 2020 holding `role` from 2023, if given
pub async fn seed_member(pool: &PgPool, chapter: &Chapter, role: Option<&str>) -> Result<Seeded> {
    let id = unique_id();
    let email = format!("member{id}@example.edu");
    let mut member = Member::new(id, chapter.id, email.clone(), "Test".to_string(), format!("Member{id}"));
    member.current_status = MemberStatus::Active;

    let interval = StatusInterval::new(unique_id(), id, MemberStatus::Active, DateSpan::open(day(2020, 9, 1)));
    let event = DomainEvent::MemberCreated(MemberCreatedEvent {
        member_id: id,
        chapter_id: chapter.id,
        status: MemberStatus::Active,
        actor_id: None,
        timestamp: Utc::now(),
    });
    let hash = hash_password(TEST_PASSWORD)?;
    PgMemberRepository::new(pool.clone())
        .create(&member, Some(&hash), &[interval], &event)
        .await?;

    if let Some(role) = role {
        let timelines = PgTimelineRepository::new(pool.clone());
        let timeline = timelines.load(id).await?.context("seeded member has no timeline")?;
        let mut write = TimelineWrite::new(&timeline, Utc::now().date_naive());
        write
            .roles
            .inserts
            .push(RoleInterval::new(unique_id(), id, role.to_string(), DateSpan::open(day(2023, 1, 1))));
        write.current_roles = vec![role.to_string()];
        timelines.apply(&[write]).await?;
    }

    Ok(Seeded {
        id,
        chapter_id: chapter.id,
        email,
    })
}
