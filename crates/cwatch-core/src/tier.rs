use serde::{Deserialize, Serialize};

/// Crawl frequency class for a creator.
///
/// Tiers trade freshness for quota: hotter tiers fire more often and fetch
/// deeper into the upload list. The numeric value is what `creators.tier`
/// stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Every 2 hours, 20 most recent items.
    T0,
    /// Every 6 hours, 10 most recent items.
    T1,
    /// Daily, 5 most recent items.
    T2,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::T0, Tier::T1, Tier::T2];

    /// How many recent content items a crawl at this tier requests.
    #[must_use]
    pub fn fetch_depth(self) -> u32 {
        match self {
            Tier::T0 => 20,
            Tier::T1 => 10,
            Tier::T2 => 5,
        }
    }

    /// Dispatch priority recorded on the crawl run; higher runs first when
    /// the dispatch collaborator supports priorities.
    #[must_use]
    pub fn priority(self) -> i16 {
        match self {
            Tier::T0 => 10,
            Tier::T1 => 5,
            Tier::T2 => 1,
        }
    }

    /// Six-field cron expression (seconds first) for this tier's cadence.
    #[must_use]
    pub fn cron_schedule(self) -> &'static str {
        match self {
            Tier::T0 => "0 0 */2 * * *",
            Tier::T1 => "0 0 */6 * * *",
            Tier::T2 => "0 0 4 * * *",
        }
    }

    /// The value stored in `creators.tier`.
    #[must_use]
    pub fn as_i16(self) -> i16 {
        match self {
            Tier::T0 => 0,
            Tier::T1 => 1,
            Tier::T2 => 2,
        }
    }

    /// Maps a stored tier value back to a `Tier`, or `None` if out of range.
    #[must_use]
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Tier::T0),
            1 => Some(Tier::T1),
            2 => Some(Tier::T2),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::T0 => write!(f, "T0"),
            Tier::T1 => write!(f, "T1"),
            Tier::T2 => write!(f, "T2"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "T0" | "0" => Ok(Tier::T0),
            "T1" | "1" => Ok(Tier::T1),
            "T2" | "2" => Ok(Tier::T2),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}
