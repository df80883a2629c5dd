//! Form-driven transitions and the status rules behind them

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{DateSpan, MemberStatus, Snowflake};

use super::member_timeline::{MemberTimeline, StatusChange, TimelinePolicy};

use crate::value_objects::MemberStatus as S;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwayReason {
    Coop,
    Military,
    StudyAbroad,
    Other,
}

/// A submitted form that changes a member's status or chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    Pledge,
    InitiationSubmitted,
    Initiation,
    Depledge {
        #[serde(default)]
        reason: Option<String>,
    },
    Graduation,
    AlumniConfirmed,
    PrematureAlumnus {
        #[serde(default)]
        reason: Option<String>,
    },
    Away {
        reason: AwayReason,
        until: NaiveDate,
    },
    ReturnStudent,
    Resignation {
        #[serde(default)]
        reason: Option<String>,
    },
    Suspension {
        #[serde(default)]
        until: Option<NaiveDate>,
        #[serde(default)]
        reason: Option<String>,
    },
    Probation {
        until: NaiveDate,
        #[serde(default)]
        reason: Option<String>,
    },
    Expulsion {
        #[serde(default)]
        reason: Option<String>,
    },
    Deceased,
    Transfer {
        chapter_id: Snowflake,
    },
    AdminSet {
        status: MemberStatus,
        #[serde(default)]
        end: Option<NaiveDate>,
    },
}

impl Transition {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pledge => "pledge",
            Self::InitiationSubmitted => "initiation_submitted",
            Self::Initiation => "initiation",
            Self::Depledge { .. } => "depledge",
            Self::Graduation => "graduation",
            Self::AlumniConfirmed => "alumni_confirmed",
            Self::PrematureAlumnus { .. } => "premature_alumnus",
            Self::Away { .. } => "away",
            Self::ReturnStudent => "return_student",
            Self::Resignation { .. } => "resignation",
            Self::Suspension { .. } => "suspension",
            Self::Probation { .. } => "probation",
            Self::Expulsion { .. } => "expulsion",
            Self::Deceased => "deceased",
            Self::Transfer { .. } => "transfer",
            Self::AdminSet { .. } => "admin_set",
        }
    }

    /// Status the member holds from the effective date, if the transition
    /// changes status at all
    pub fn target_status(&self) -> Option<MemberStatus> {
        Some(match self {
            Self::Pledge => S::Pnm,
            Self::InitiationSubmitted => S::Activepend,
            Self::Initiation | Self::ReturnStudent => S::Active,
            Self::Depledge { .. } => S::Depledge,
            Self::Graduation => S::Alumnipend,
            Self::AlumniConfirmed | Self::PrematureAlumnus { .. } => S::Alumni,
            Self::Away { .. } => S::Away,
            Self::Resignation { .. } => S::Resigned,
            Self::Suspension { .. } => S::Suspended,
            Self::Probation { .. } => S::Probation,
            Self::Expulsion { .. } => S::Expelled,
            Self::Deceased => S::Deceased,
            Self::AdminSet { status, .. } => *status,
            Self::Transfer { .. } => return None,
        })
    }

    /// Whether a member holding `from` on the effective date may submit this
    /// transition. `None` means no status covers that day.
    pub fn allowed_from(&self, from: Option<MemberStatus>) -> bool {
        let non_terminal = from.is_some_and(|s| !s.is_terminal());
        match self {
            Self::Pledge => matches!(from, None | Some(S::Nonmember | S::Friend | S::Depledge)),
            Self::InitiationSubmitted => from == Some(S::Pnm),
            Self::Initiation => matches!(from, None | Some(S::Pnm | S::Activepend)),
            Self::Depledge { .. } => matches!(from, Some(S::Pnm | S::Activepend)),
            Self::Graduation => matches!(from, Some(S::Active | S::Away | S::Probation)),
            Self::AlumniConfirmed => from == Some(S::Alumnipend),
            Self::PrematureAlumnus { .. } => matches!(from, Some(S::Active | S::Away)),
            Self::Away { .. } => from == Some(S::Active),
            Self::ReturnStudent => matches!(from, Some(S::Away | S::Alumni | S::Alumnipend)),
            Self::Resignation { .. } => matches!(
                from,
                Some(S::Active | S::Away | S::Alumnipend | S::Alumni | S::Probation | S::Pnm)
            ),
            Self::Suspension { .. } | Self::Expulsion { .. } => non_terminal,
            Self::Probation { .. } => matches!(from, Some(S::Active | S::Away)),
            Self::Transfer { .. } => matches!(from, Some(S::Active | S::Pnm)),
            Self::Deceased | Self::AdminSet { .. } => true,
        }
    }

    /// Span the target status covers when effective on `start`
    pub fn span(&self, start: NaiveDate) -> Result<DateSpan, DomainError> {
        match self {
            Self::Away { until, .. } | Self::Probation { until, .. } => DateSpan::new(start, *until),
            Self::Suspension { until, .. } => DateSpan::until(start, *until),
            Self::AdminSet { end, .. } => DateSpan::until(start, *end),
            _ => Ok(DateSpan::open(start)),
        }
    }

    /// Validate against the timeline and resolve the status effect.
    ///
    /// Returns `Ok(None)` for transitions that do not touch status. A
    /// transition whose exact interval is already recorded resolves to that
    /// interval, so painting it is a no-op.
    pub fn resolve(
        &self,
        timeline: &MemberTimeline,
        start: NaiveDate,
        policy: &TimelinePolicy,
    ) -> Result<Option<StatusChange>, DomainError> {
        let from = timeline.status_on(start);
        let Some(status) = self.target_status() else {
            return self.check_from(from).map(|()| None);
        };

        let span = self.span(start)?;
        if timeline.has_exact_status(status, span) {
            return Ok(Some(StatusChange::new(status, span)));
        }
        self.check_from(from)?;

        let mut change = StatusChange::new(status, span);
        if matches!(self, Self::Initiation) && timeline.statuses.is_empty() {
            change.synthetic_pledge = Some(policy.synthetic_pledge_span(start));
        }
        Ok(Some(change))
    }

    fn check_from(&self, from: Option<MemberStatus>) -> Result<(), DomainError> {
        if self.allowed_from(from) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                transition: self.kind(),
                from,
            })
        }
    }
}
