use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

use crate::domain::CompanyId;
use crate::ValidationError;

/// Identity of a stored quote point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(Uuid);

impl QuoteId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Display for QuoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Whether a point covers one trading day or one minute of intraday trading.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Minute,
}

impl Granularity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Minute => "minute",
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dedup key for one company's quote series: no two stored points may share
/// a `(granularity, stamp)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuoteKey {
    pub granularity: Granularity,
    pub stamp: PrimitiveDateTime,
}

/// A freshly downloaded OHLCV reading, not yet attached to a company.
///
/// The provider does not know company identities; reconciliation stamps the
/// owning company onto every reading it decides to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSample {
    pub stamp: PrimitiveDateTime,
    pub granularity: Granularity,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
    pub is_valid: bool,
}

impl QuoteSample {
    /// Build a day-granularity reading stamped at midnight of `date`.
    pub fn day(
        date: Date,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: f64,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        Self::new(day_stamp(date), Granularity::Day, open, high, low, close, volume)
    }

    /// Build a minute-granularity reading.
    pub fn minute(
        stamp: PrimitiveDateTime,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: f64,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        Self::new(stamp, Granularity::Minute, open, high, low, close, volume)
    }

    fn new(
        stamp: PrimitiveDateTime,
        granularity: Granularity,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: f64,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_price("close", close)?;
        validate_optional_price("open", open)?;
        validate_optional_price("high", high)?;
        validate_optional_price("low", low)?;
        if let (Some(high), Some(low)) = (high, low) {
            if high < low {
                return Err(ValidationError::InvalidPriceRange { high, low });
            }
        }

        Ok(Self {
            stamp,
            granularity,
            open,
            high,
            low,
            close,
            volume,
            is_valid: true,
        })
    }

    /// Mark the reading as a partial/unsettled observation.
    pub fn invalid(mut self) -> Self {
        self.is_valid = false;
        self
    }

    pub const fn key(&self) -> QuoteKey {
        QuoteKey {
            granularity: self.granularity,
            stamp: self.stamp,
        }
    }
}

/// One stored OHLCV point owned by a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotePoint {
    pub id: QuoteId,
    pub company_id: CompanyId,
    pub stamp: PrimitiveDateTime,
    pub granularity: Granularity,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
    pub is_valid: bool,
}

impl QuotePoint {
    /// Stamp a downloaded reading with its owning company, minting a fresh
    /// point identity.
    pub fn from_sample(company_id: CompanyId, sample: QuoteSample) -> Self {
        Self {
            id: QuoteId::generate(),
            company_id,
            stamp: sample.stamp,
            granularity: sample.granularity,
            open: sample.open,
            high: sample.high,
            low: sample.low,
            close: sample.close,
            volume: sample.volume,
            is_valid: sample.is_valid,
        }
    }

    pub const fn key(&self) -> QuoteKey {
        QuoteKey {
            granularity: self.granularity,
            stamp: self.stamp,
        }
    }
}

/// Canonical stamp for a day-granularity point.
pub fn day_stamp(date: Date) -> PrimitiveDateTime {
    PrimitiveDateTime::new(date, Time::MIDNIGHT)
}

fn validate_price(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinitePrice { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativePrice { field });
    }
    Ok(())
}

fn validate_optional_price(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => validate_price(field, value),
        None => Ok(()),
    }
}
