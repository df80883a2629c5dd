//! Snowflake identifiers for every CMT row
//!
//! Layout (64 bits, sign bit always zero):
//! - Bits 62-22: milliseconds since [`Snowflake::EPOCH`]
//! - Bits 21-12: worker id (one per API process or CLI run)
//! - Bits 11-0:  per-millisecond sequence

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// 64-bit time-ordered identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(i64);

impl Snowflake {
    /// 2020-01-01 00:00:00 UTC in unix milliseconds
    pub const EPOCH: i64 = 1_577_836_800_000;

    const WORKER_BITS: u32 = 10;
    const SEQUENCE_BITS: u32 = 12;
    pub const MAX_WORKER: u16 = (1 << Self::WORKER_BITS) - 1;

    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Unix milliseconds at which the id was minted
    pub fn timestamp_millis(&self) -> i64 {
        (self.0 >> (Self::WORKER_BITS + Self::SEQUENCE_BITS)) + Self::EPOCH
    }

    pub fn worker_id(&self) -> u16 {
        ((self.0 >> Self::SEQUENCE_BITS) & i64::from(Self::MAX_WORKER)) as u16
    }

    pub fn parse(s: &str) -> Result<Self, SnowflakeParseError> {
        match s.trim().parse::<i64>() {
            Ok(v) if v >= 0 => Ok(Self(v)),
            _ => Err(SnowflakeParseError::InvalidFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("invalid id: {0:?}")]
    InvalidFormat(String),
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for Snowflake {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<Snowflake> for i64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl std::str::FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Ids travel as JSON strings so browser clients never lose precision.
impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_millis: i64,
    sequence: i64,
}

/// Thread-safe id source
///
/// Up to 4096 ids per millisecond per worker. When the sequence is exhausted
/// the generator waits for the next millisecond.
#[derive(Debug)]
pub struct SnowflakeGenerator {
    worker_id: u16,
    state: Mutex<GeneratorState>,
}

impl SnowflakeGenerator {
    /// # Panics
    /// Panics if `worker_id` does not fit in 10 bits.
    pub fn new(worker_id: u16) -> Self {
        assert!(
            worker_id <= Snowflake::MAX_WORKER,
            "worker id must be at most {}",
            Snowflake::MAX_WORKER
        );
        Self {
            worker_id,
            state: Mutex::new(GeneratorState::default()),
        }
    }

    pub fn generate(&self) -> Snowflake {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut now = Self::now_millis().max(state.last_millis);
        if now == state.last_millis {
            state.sequence = (state.sequence + 1) & ((1 << Snowflake::SEQUENCE_BITS) - 1);
            if state.sequence == 0 {
                while now <= state.last_millis {
                    std::hint::spin_loop();
                    now = Self::now_millis();
                }
            }
        } else {
            state.sequence = 0;
        }
        state.last_millis = now;

        let id = ((now - Snowflake::EPOCH) << (Snowflake::WORKER_BITS + Snowflake::SEQUENCE_BITS))
            | (i64::from(self.worker_id) << Snowflake::SEQUENCE_BITS)
            | state.sequence;
        Snowflake(id)
    }

    pub fn worker_id(&self) -> u16 {
        self.worker_id
    }

    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(Snowflake::EPOCH)
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_parse_rejects_garbage_and_negatives() {
        assert_eq!(Snowflake::parse("42").unwrap(), Snowflake::new(42));
        assert!(Snowflake::parse("abc").is_err());
        assert!(Snowflake::parse("-5").is_err());
    }

    #[test]
    fn test_json_uses_strings_but_accepts_numbers() {
        let id = Snowflake::new(9_007_199_254_740_993);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"9007199254740993\"");

        let from_str: Snowflake = serde_json::from_str("\"77\"").unwrap();
        let from_num: Snowflake = serde_json::from_str("77").unwrap();
        assert_eq!(from_str, from_num);
    }

    #[test]
    fn test_generated_ids_are_unique_and_increasing() {
        let gen = SnowflakeGenerator::new(3);
        let mut last = Snowflake::default();
        for _ in 0..5000 {
            let id = gen.generate();
            assert!(id > last);
            assert_eq!(id.worker_id(), 3);
            last = id;
        }
    }

    #[test]
    fn test_generator_is_shareable_across_threads() {
        let gen = Arc::new(SnowflakeGenerator::new(1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gen = Arc::clone(&gen);
                std::thread::spawn(move || (0..500).map(|_| gen.generate()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 2000);
    }

    #[test]
    fn test_timestamp_round_trips_through_epoch() {
        let gen = SnowflakeGenerator::new(0);
        let before = SnowflakeGenerator::now_millis();
        let id = gen.generate();
        assert!(id.timestamp_millis() >= before);
    }

    #[test]
    #[should_panic(expected = "worker id must be at most")]
    fn test_worker_id_out_of_range() {
        SnowflakeGenerator::new(1024);
    }
}
