//! Download-window tier selection.
//!
//! A tier names the bounded history range the provider can serve in one
//! call. Given how stale a company's stored day series is, the selector
//! picks the smallest tier that covers the gap; the downloader performs the
//! actual fetch for the chosen tier.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::ValidationError;

/// Bounded download-window sizes supported by the provider, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DownloadTier {
    #[serde(rename = "previous")]
    PreviousDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "5m")]
    FiveMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
}

impl DownloadTier {
    /// Tiers ordered from smallest to largest window.
    pub const LADDER: [Self; 7] = [
        Self::PreviousDay,
        Self::FiveDays,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::FiveMonths,
        Self::OneYear,
        Self::TwoYears,
    ];

    pub const fn span_days(self) -> i64 {
        match self {
            Self::PreviousDay => 1,
            Self::FiveDays => 5,
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::FiveMonths => 150,
            Self::OneYear => 365,
            Self::TwoYears => 730,
        }
    }

    pub const fn span(self) -> Duration {
        Duration::days(self.span_days())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreviousDay => "previous",
            Self::FiveDays => "5d",
            Self::OneMonth => "1m",
            Self::ThreeMonths => "3m",
            Self::FiveMonths => "5m",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
        }
    }
}

impl Display for DownloadTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadTier {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "previous" => Ok(Self::PreviousDay),
            "5d" => Ok(Self::FiveDays),
            "1m" => Ok(Self::OneMonth),
            "3m" => Ok(Self::ThreeMonths),
            "5m" => Ok(Self::FiveMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            other => Err(ValidationError::InvalidTier {
                value: other.to_owned(),
            }),
        }
    }
}

/// Window-selection policy.
#[derive(Debug, Clone, Copy)]
pub struct TierPolicy {
    /// Stand-in staleness for a company with no stored history. The
    /// selector treats such a company as last synced this long ago.
    pub default_lookback: Duration,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            default_lookback: DownloadTier::OneMonth.span(),
        }
    }
}

impl TierPolicy {
    /// Pick the smallest tier whose span covers the gap between the last
    /// stored day date and today.
    ///
    /// The comparison is inclusive: a gap of exactly one span is satisfied
    /// by that tier. A gap no tier covers falls back to [`DownloadTier::TwoYears`];
    /// the caller re-evaluates on its next pass until the gap closes.
    pub fn select_window(&self, last_known: Option<Date>, today: Date) -> DownloadTier {
        let last = last_known.unwrap_or(today - self.default_lookback);

        for tier in DownloadTier::LADDER {
            if last + tier.span() >= today {
                return tier;
            }
        }

        DownloadTier::TwoYears
    }
}
