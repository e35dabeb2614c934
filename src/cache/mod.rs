//! Local cache for incident feed responses
//!
//! Provides SQLite-backed caching with content-addressed blob files for large
//! payloads, plus the cache-fronted [`IncidentSource`] that falls back to the
//! last known good payload when the status page cannot be reached.

pub mod key;
pub mod source;
pub mod storage;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Maximum age for which a cached payload is served without refetching.
///
/// Zero or negative seconds means every entry is stale, `Infinite` means
/// entries never expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TtlRepr", into = "TtlRepr")]
pub enum Ttl {
    Seconds(i64),
    Infinite,
}

impl Ttl {
    /// One hour, matching the default refresh cadence of the report job
    pub const DEFAULT: Ttl = Ttl::Seconds(60 * 60);
}

impl Default for Ttl {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Seconds(secs) => write!(f, "{}s", secs),
            Ttl::Infinite => write!(f, "infinite"),
        }
    }
}

impl FromStr for Ttl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "infinite" | "never" | "inf" => Ok(Ttl::Infinite),
            other => other
                .parse::<i64>()
                .map(Ttl::Seconds)
                .map_err(|_| format!("invalid TTL '{}': expected seconds or 'infinite'", trimmed)),
        }
    }
}

/// YAML/JSON representation: a signed integer or a keyword
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TtlRepr {
    Seconds(i64),
    Word(String),
}

impl TryFrom<TtlRepr> for Ttl {
    type Error = String;

    fn try_from(repr: TtlRepr) -> Result<Self, Self::Error> {
        match repr {
            TtlRepr::Seconds(secs) => Ok(Ttl::Seconds(secs)),
            TtlRepr::Word(word) => word.parse(),
        }
    }
}

impl From<Ttl> for TtlRepr {
    fn from(ttl: Ttl) -> Self {
        match ttl {
            Ttl::Seconds(secs) => TtlRepr::Seconds(secs),
            Ttl::Infinite => TtlRepr::Word("infinite".to_string()),
        }
    }
}

/// Whether an entry stored at `stored_at` is still fresh at `now`.
///
/// Fresh means `now - stored_at < ttl`.
pub fn is_fresh(stored_at: DateTime<Utc>, ttl: Ttl, now: DateTime<Utc>) -> bool {
    match ttl {
        Ttl::Infinite => true,
        Ttl::Seconds(secs) if secs <= 0 => false,
        // A TTL too large to represent never expires in practice
        Ttl::Seconds(secs) => TimeDelta::try_seconds(secs)
            .is_none_or(|ttl| now.signed_duration_since(stored_at) < ttl),
    }
}

// Re-export main types
pub use key::cache_key;
pub use source::{IncidentSource, Origin, SourceOptions};
pub use storage::{CacheEntry, CacheStore};

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_fresh_just_inside_ttl() {
        let stored = at(1_700_000_000);
        assert!(is_fresh(stored, Ttl::Seconds(3600), at(1_700_000_000 + 3599)));
    }

    #[test]
    fn test_stale_just_past_ttl() {
        let stored = at(1_700_000_000);
        assert!(!is_fresh(stored, Ttl::Seconds(3600), at(1_700_000_000 + 3601)));
    }

    #[test]
    fn test_stale_exactly_at_ttl() {
        let stored = at(1_700_000_000);
        assert!(!is_fresh(stored, Ttl::Seconds(60), at(1_700_000_060)));
    }

    #[test]
    fn test_freshness_boundary_for_many_ttls() {
        let stored = at(1_600_000_000);
        for ttl in [1, 2, 59, 3600, 86_400] {
            let now_fresh = at(1_600_000_000 + ttl - 1);
            let now_stale = at(1_600_000_000 + ttl + 1);
            assert!(is_fresh(stored, Ttl::Seconds(ttl), now_fresh), "ttl {}", ttl);
            assert!(!is_fresh(stored, Ttl::Seconds(ttl), now_stale), "ttl {}", ttl);
        }
    }

    #[test]
    fn test_zero_and_negative_ttl_always_stale() {
        let stored = at(1_700_000_000);
        assert!(!is_fresh(stored, Ttl::Seconds(0), stored));
        assert!(!is_fresh(stored, Ttl::Seconds(-5), stored));
    }

    #[test]
    fn test_infinite_ttl_never_expires() {
        let stored = at(0);
        assert!(is_fresh(stored, Ttl::Infinite, at(4_000_000_000)));
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let stored = at(1_700_000_000);
        assert!(is_fresh(stored, Ttl::Seconds(i64::MAX), at(1_800_000_000)));
    }

    #[test]
    fn test_ttl_from_str() {
        assert_eq!("3600".parse::<Ttl>().unwrap(), Ttl::Seconds(3600));
        assert_eq!("-1".parse::<Ttl>().unwrap(), Ttl::Seconds(-1));
        assert_eq!("infinite".parse::<Ttl>().unwrap(), Ttl::Infinite);
        assert_eq!("Never".parse::<Ttl>().unwrap(), Ttl::Infinite);
        assert!("soon".parse::<Ttl>().is_err());
    }

    #[test]
    fn test_ttl_yaml_round_trip_forms() {
        let ttl: Ttl = serde_yaml::from_str("900").unwrap();
        assert_eq!(ttl, Ttl::Seconds(900));

        let ttl: Ttl = serde_yaml::from_str("infinite").unwrap();
        assert_eq!(ttl, Ttl::Infinite);

        assert!(serde_yaml::from_str::<Ttl>("later").is_err());
        assert_eq!(serde_yaml::to_string(&Ttl::Infinite).unwrap().trim(), "infinite");
    }
}
