//! Domain events

mod domain_event;

pub use domain_event::{
    ActivityRecordedEvent, ChapterEvent, DomainEvent, MemberCreatedEvent, MemberEvent,
    MemberTransferredEvent, RoleEvent, ScoreRecalculatedEvent, StatusChangedEvent,
    TimelineRepairedEvent,
};
