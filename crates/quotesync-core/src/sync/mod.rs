//! Synchronization orchestrators and their shared reporting types.
//!
//! Both orchestrators follow the same shape: fan one independent unit of
//! work out per (company, action), drain completions as they arrive, apply
//! each successful result immediately, and surface every captured failure
//! once at the end. One company's failure never blocks or rolls back
//! another's progress.

mod details;
mod quotes;

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::domain::{CompanyId, Symbol};
use crate::downloader::DownloadError;
use crate::store::StoreError;
use crate::ValidationError;

pub use details::DetailSyncOrchestrator;
pub use quotes::SyncOrchestrator;

/// What a single sync unit was doing when it succeeded or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkKind {
    DayQuotes,
    MinuteQuotes,
    Details,
}

impl WorkKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DayQuotes => "day-quotes",
            Self::MinuteQuotes => "minute-quotes",
            Self::Details => "details",
        }
    }
}

impl Display for WorkKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cause of one captured unit failure.
#[derive(Debug, Error, Clone)]
pub enum UnitError {
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("sync task aborted: {0}")]
    Task(String),
}

/// One failed unit, recorded during draining and reported in aggregate.
#[derive(Debug, Clone)]
pub struct UnitFailure {
    pub symbol: Symbol,
    pub kind: WorkKind,
    pub error: UnitError,
}

impl Display for UnitFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} for {}: {}", self.kind, self.symbol, self.error)
    }
}

/// Summary of one quote synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Companies considered by the pass.
    pub companies: usize,
    /// Units of work started.
    pub units: usize,
    pub points_added: usize,
    pub points_updated: usize,
}

/// Summary of one detail refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailSyncReport {
    pub companies: usize,
    pub refreshed: usize,
}

/// Failures surfaced by the orchestrators.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Symbol(#[from] ValidationError),

    #[error("company '{0}' does not exist")]
    UnknownCompany(CompanyId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("download failed for '{symbol}': {error}")]
    Download { symbol: Symbol, error: DownloadError },

    /// Some quote units failed; everything else is already persisted.
    #[error("{} of {} sync units failed", .failures.len(), .report.units)]
    Partial {
        report: SyncReport,
        failures: Vec<UnitFailure>,
    },

    /// Some detail refreshes failed; the rest are already persisted.
    #[error("{} of {} detail refreshes failed", .failures.len(), .report.companies)]
    PartialDetails {
        report: DetailSyncReport,
        failures: Vec<UnitFailure>,
    },
}
