//! Stored entries and expiration policy.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

use super::value::Value;

/// How long a written entry lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the engine's default TTL.
    #[default]
    Default,
    /// Never expire.
    Never,
    /// Expire after the given duration. A zero duration expires immediately;
    /// one too large to represent as a point in time never expires.
    After(Duration),
}

impl From<Duration> for Ttl {
    fn from(d: Duration) -> Self {
        Ttl::After(d)
    }
}

impl Ttl {
    /// Absolute expiration for an entry written at `now`. `None` when the
    /// entry never expires, including when the deadline overflows.
    pub(crate) fn deadline(self, default_ttl: Option<Duration>, now: SystemTime) -> Option<SystemTime> {
        match self {
            Ttl::Default => default_ttl.and_then(|d| now.checked_add(d)),
            Ttl::Never => None,
            Ttl::After(d) => now.checked_add(d),
        }
    }
}

/// A cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub value: Value,
    /// `None` never expires.
    pub expiration: Option<SystemTime>,
}

impl Item {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }

    pub(crate) fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expiration.is_some_and(|e| now > e)
    }
}
