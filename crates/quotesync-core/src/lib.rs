//! # quotesync-core
//!
//! Incremental synchronization engine for per-symbol market quotes. The
//! engine keeps a local store of day- and minute-granularity OHLCV points
//! up to date against an external provider without re-downloading history
//! it already holds and without ever regressing a validated point.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (IEX-style REST) |
//! | [`clock`] | Injected time capability |
//! | [`domain`] | Companies, quote points, symbols |
//! | [`downloader`] | Provider contract and structured errors |
//! | [`error`] | Validation errors |
//! | [`http`] | Transport abstraction used by adapters |
//! | [`market_hours`] | Business-hours gate |
//! | [`reconcile`] | Dedup and invalid-to-valid promotion |
//! | [`retry`] | Jittered backoff policy |
//! | [`store`] | Persistence contract |
//! | [`sync`] | Fan-out orchestrators |
//! | [`throttle`] | Provider request budget |
//! | [`tier`] | Download-window tier selection |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quotesync_core::{IexDownloader, SyncOrchestrator, SystemClock};
//! use quotesync_store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Arc::new(IexDownloader::offline());
//!     let store = Arc::new(MemoryStore::new());
//!     let clock = Arc::new(SystemClock::utc());
//!
//!     let orchestrator = SyncOrchestrator::new(downloader, store, clock);
//!     let report = orchestrator.sync_all().await?;
//!     println!("added {} points", report.points_added);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! A batch pass never aborts on one symbol's failure: each unit's error is
//! captured while its siblings keep running, successful results are
//! persisted as they arrive, and the pass ends with a single aggregate
//! error describing everything that went wrong.

pub mod adapters;
pub mod clock;
pub mod domain;
pub mod downloader;
pub mod error;
pub mod http;
pub mod market_hours;
pub mod reconcile;
pub mod retry;
pub mod store;
pub mod sync;
pub mod throttle;
pub mod tier;

// Re-export commonly used types at crate root for convenience

pub use adapters::IexDownloader;
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    day_stamp, Company, CompanyDetails, CompanyId, Granularity, QuoteId, QuoteKey, QuotePoint,
    QuoteSample, Symbol,
};
pub use downloader::{DownloadError, DownloadErrorKind, MarketDownloader};
pub use error::ValidationError;
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient};
pub use market_hours::{MarketHours, SyncActions};
pub use reconcile::{reconcile, ReconcileOutcome};
pub use retry::RetryPolicy;
pub use store::{CompanyFilter, CompanyStore, StoreError};
pub use sync::{
    DetailSyncOrchestrator, DetailSyncReport, SyncError, SyncOrchestrator, SyncReport, UnitError,
    UnitFailure, WorkKind,
};
pub use throttle::RequestBudget;
pub use tier::{DownloadTier, TierPolicy};
