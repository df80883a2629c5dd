//! Academic terms and the biennium calendar
//!
//! January through July is spring, August through December is fall. A
//! biennium year pairs fall of year Y with spring of Y+1.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::DateSpan;

/// First month of the fall term
const FALL_START_MONTH: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    #[serde(rename = "sp")]
    Spring,
    #[serde(rename = "fa")]
    Fall,
}

impl Term {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spring => "sp",
            Self::Fall => "fa",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Term {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sp" | "spring" => Ok(Self::Spring),
            "fa" | "fall" => Ok(Self::Fall),
            _ => Err(DomainError::ValidationError(format!("unknown term: {s}"))),
        }
    }
}

/// A calendar year plus term, e.g. fall 2024
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearTerm {
    pub year: i32,
    pub term: Term,
}

impl YearTerm {
    pub const fn new(year: i32, term: Term) -> Self {
        Self { year, term }
    }

    pub fn containing(day: NaiveDate) -> Self {
        let term = if day.month() >= FALL_START_MONTH {
            Term::Fall
        } else {
            Term::Spring
        };
        Self {
            year: day.year(),
            term,
        }
    }

    /// Days covered by the term
    pub fn span(&self) -> DateSpan {
        let (start, end) = match self.term {
            Term::Spring => ((1, 1), (FALL_START_MONTH - 1, 31)),
            Term::Fall => ((FALL_START_MONTH, 1), (12, 31)),
        };
        let make = |(m, d): (u32, u32)| {
            NaiveDate::from_ymd_opt(self.year, m, d).unwrap_or(NaiveDate::MIN)
        };
        DateSpan {
            start: make(start),
            end: make(end),
        }
    }

    /// Fall year that opens the biennium year this term belongs to
    pub fn school_year(&self) -> i32 {
        match self.term {
            Term::Fall => self.year,
            Term::Spring => self.year - 1,
        }
    }

    /// The other term of the same school year
    pub fn counterpart(&self) -> Self {
        match self.term {
            Term::Fall => Self::new(self.year + 1, Term::Spring),
            Term::Spring => Self::new(self.year - 1, Term::Fall),
        }
    }

    pub fn next(&self) -> Self {
        match self.term {
            Term::Spring => Self::new(self.year, Term::Fall),
            Term::Fall => Self::new(self.year + 1, Term::Spring),
        }
    }

    /// Terms of one school year, fall first
    pub fn school_year_terms(school_year: i32) -> [YearTerm; 2] {
        [
            Self::new(school_year, Term::Fall),
            Self::new(school_year + 1, Term::Spring),
        ]
    }
}

impl fmt::Display for YearTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.term, self.year)
    }
}

/// Two school years of scoring starting August 1 of `start_year`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Biennium {
    pub start_year: i32,
}

impl Biennium {
    pub const fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, FALL_START_MONTH, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The four terms in chronological order
    pub fn terms(&self) -> [YearTerm; 4] {
        let first = Self::first_term(self.start_year);
        let second = first.next();
        let third = second.next();
        [first, second, third, third.next()]
    }

    pub fn contains(&self, term: YearTerm) -> bool {
        self.terms().contains(&term)
    }

    fn first_term(year: i32) -> YearTerm {
        YearTerm::new(year, Term::Fall)
    }
}
