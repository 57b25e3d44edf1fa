use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Source of "now" in exchange-local wall-clock time.
///
/// Every component that needs the current instant takes a `Clock` rather
/// than reading process-wide time, so sync decisions are reproducible under
/// test.
pub trait Clock: Send + Sync {
    fn now(&self) -> PrimitiveDateTime;

    fn today(&self) -> Date {
        self.now().date()
    }
}

/// Wall clock projected into a fixed exchange offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub const fn utc() -> Self {
        Self {
            offset: UtcOffset::UTC,
        }
    }

    /// Clock for an exchange at a fixed UTC offset (e.g. `-5` hours).
    pub const fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> PrimitiveDateTime {
        let now = OffsetDateTime::now_utc().to_offset(self.offset);
        PrimitiveDateTime::new(now.date(), now.time())
    }
}

/// Deterministic clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: PrimitiveDateTime,
}

impl FixedClock {
    pub const fn at(now: PrimitiveDateTime) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> PrimitiveDateTime {
        self.now
    }
}
