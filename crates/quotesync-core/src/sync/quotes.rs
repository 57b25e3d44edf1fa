use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::domain::{Company, CompanyDetails, CompanyId, Granularity, QuotePoint, Symbol};
use crate::downloader::{DownloadError, MarketDownloader};
use crate::market_hours::MarketHours;
use crate::reconcile::{reconcile, ReconcileOutcome};
use crate::store::{CompanyFilter, CompanyStore, StoreError};
use crate::tier::{DownloadTier, TierPolicy};

use super::{SyncError, SyncReport, UnitError, UnitFailure, WorkKind};

type UnitResult = Result<ReconcileOutcome, DownloadError>;

/// Incremental quote synchronization over every opted-in company.
///
/// Construct one orchestrator per pass; dropping the `run` future aborts
/// any units still in flight while leaving already-applied writes in place.
pub struct SyncOrchestrator {
    downloader: Arc<dyn MarketDownloader>,
    store: Arc<dyn CompanyStore>,
    clock: Arc<dyn Clock>,
    hours: MarketHours,
    tiers: TierPolicy,
}

impl SyncOrchestrator {
    pub fn new(
        downloader: Arc<dyn MarketDownloader>,
        store: Arc<dyn CompanyStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            downloader,
            store,
            clock,
            hours: MarketHours::default(),
            tiers: TierPolicy::default(),
        }
    }

    pub fn with_market_hours(mut self, hours: MarketHours) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_tier_policy(mut self, tiers: TierPolicy) -> Self {
        self.tiers = tiers;
        self
    }

    /// Download the descriptive fields for a ticker without persisting
    /// anything; used when onboarding a company that is not yet stored.
    pub async fn download_company(&self, ticker: &str) -> Result<CompanyDetails, SyncError> {
        let symbol = Symbol::parse(ticker)?;
        self.downloader
            .fetch_details(&symbol)
            .await
            .map_err(|error| SyncError::Download { symbol, error })
    }

    /// Synchronize every company opted in via `retrieve_quotes`.
    pub async fn sync_all(&self) -> Result<SyncReport, SyncError> {
        let companies = self.store.list_companies(CompanyFilter::quote_sync())?;
        self.run(companies).await
    }

    /// Synchronize a single company regardless of its opt-in flag.
    pub async fn sync_company(&self, id: CompanyId) -> Result<SyncReport, SyncError> {
        let company = self
            .store
            .find_company(id)?
            .ok_or(SyncError::UnknownCompany(id))?;
        self.run(vec![company]).await
    }

    async fn run(&self, companies: Vec<Company>) -> Result<SyncReport, SyncError> {
        let now = self.clock.now();
        let today = now.date();

        let mut units: JoinSet<UnitResult> = JoinSet::new();
        let mut meta: HashMap<tokio::task::Id, (Symbol, WorkKind)> = HashMap::new();
        let mut report = SyncReport {
            companies: companies.len(),
            ..SyncReport::default()
        };

        // Collecting: snapshot each company's series once, gate it, and
        // start one independent unit per requested action. Units never
        // touch the store; they only download and reconcile.
        for company in companies {
            let points = self.store.quotes_for(company.id)?;
            let last_day = points
                .iter()
                .filter(|p| p.granularity == Granularity::Day)
                .map(|p| p.stamp.date())
                .max();
            let last_minute = points
                .iter()
                .filter(|p| p.granularity == Granularity::Minute)
                .map(|p| p.stamp)
                .max();
            let actions = self.hours.required_actions(now, last_minute, last_day);

            if actions.fetch_day {
                let tier = self.tiers.select_window(last_day, today);
                let existing: Vec<QuotePoint> = points
                    .iter()
                    .filter(|p| p.granularity == Granularity::Day)
                    .cloned()
                    .collect();
                let downloader = Arc::clone(&self.downloader);
                let symbol = company.symbol.clone();
                let company_id = company.id;

                let handle = units.spawn(async move {
                    let samples = match tier {
                        DownloadTier::PreviousDay => downloader
                            .fetch_previous_day(&symbol)
                            .await
                            .map(|sample| vec![sample]),
                        _ => downloader.fetch_window(&symbol, tier).await,
                    }?;
                    Ok(reconcile(company_id, &existing, samples))
                });
                meta.insert(handle.id(), (company.symbol.clone(), WorkKind::DayQuotes));
            }

            if actions.fetch_minute {
                let existing: Vec<QuotePoint> = points
                    .into_iter()
                    .filter(|p| p.granularity == Granularity::Minute)
                    .collect();
                let downloader = Arc::clone(&self.downloader);
                let symbol = company.symbol.clone();
                let company_id = company.id;

                let handle = units.spawn(async move {
                    let samples = downloader.fetch_intraday_minutes(&symbol).await?;
                    Ok(reconcile(company_id, &existing, samples))
                });
                meta.insert(handle.id(), (company.symbol, WorkKind::MinuteQuotes));
            }
        }

        report.units = meta.len();
        let mut failures: Vec<UnitFailure> = Vec::new();

        // Draining: take whichever unit finishes next and persist its
        // outcome right away, so a slow symbol never delays a fast one.
        while let Some(joined) = units.join_next_with_id().await {
            match joined {
                Ok((task_id, unit_result)) => {
                    let (symbol, kind) = meta
                        .remove(&task_id)
                        .expect("every unit is registered at spawn");
                    match unit_result {
                        Ok(outcome) => {
                            self.apply(symbol, kind, outcome, &mut report, &mut failures);
                        }
                        Err(error) => {
                            warn!(symbol = %symbol, kind = %kind, error = %error, "sync unit failed");
                            failures.push(UnitFailure {
                                symbol,
                                kind,
                                error: UnitError::Download(error),
                            });
                        }
                    }
                }
                Err(join_error) => {
                    if let Some((symbol, kind)) = meta.remove(&join_error.id()) {
                        warn!(symbol = %symbol, kind = %kind, "sync unit aborted");
                        failures.push(UnitFailure {
                            symbol,
                            kind,
                            error: UnitError::Task(join_error.to_string()),
                        });
                    }
                }
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(SyncError::Partial { report, failures })
        }
    }

    fn apply(
        &self,
        symbol: Symbol,
        kind: WorkKind,
        outcome: ReconcileOutcome,
        report: &mut SyncReport,
        failures: &mut Vec<UnitFailure>,
    ) {
        let added = outcome.to_add.len();
        let updated = outcome.to_update.len();

        let written = (|| -> Result<(), StoreError> {
            if !outcome.to_add.is_empty() {
                self.store.add_quotes(outcome.to_add)?;
            }
            if !outcome.to_update.is_empty() {
                self.store.update_quotes(outcome.to_update)?;
            }
            Ok(())
        })();

        match written {
            Ok(()) => {
                report.points_added += added;
                report.points_updated += updated;
                info!(symbol = %symbol, kind = %kind, added, updated, "sync unit applied");
            }
            Err(error) => {
                warn!(symbol = %symbol, kind = %kind, error = %error, "sync unit write failed");
                failures.push(UnitFailure {
                    symbol,
                    kind,
                    error: UnitError::Store(error),
                });
            }
        }
    }
}
