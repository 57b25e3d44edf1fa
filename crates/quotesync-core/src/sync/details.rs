use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::domain::Company;
use crate::downloader::MarketDownloader;
use crate::store::{CompanyFilter, CompanyStore};

use super::{DetailSyncReport, SyncError, UnitError, UnitFailure, WorkKind};

/// Refreshes descriptive fields for every company flagged
/// `download_details`, clearing the flag as each refresh lands.
pub struct DetailSyncOrchestrator {
    downloader: Arc<dyn MarketDownloader>,
    store: Arc<dyn CompanyStore>,
}

impl DetailSyncOrchestrator {
    pub fn new(downloader: Arc<dyn MarketDownloader>, store: Arc<dyn CompanyStore>) -> Self {
        Self { downloader, store }
    }

    pub async fn refresh_all(&self) -> Result<DetailSyncReport, SyncError> {
        let companies = self.store.list_companies(CompanyFilter::detail_sync())?;

        let mut units = JoinSet::new();
        let mut meta: HashMap<tokio::task::Id, Company> = HashMap::new();
        let mut report = DetailSyncReport {
            companies: companies.len(),
            refreshed: 0,
        };

        for company in companies {
            let downloader = Arc::clone(&self.downloader);
            let symbol = company.symbol.clone();
            let handle = units.spawn(async move { downloader.fetch_details(&symbol).await });
            meta.insert(handle.id(), company);
        }

        let mut failures: Vec<UnitFailure> = Vec::new();

        while let Some(joined) = units.join_next_with_id().await {
            match joined {
                Ok((task_id, fetched)) => {
                    let mut company = meta
                        .remove(&task_id)
                        .expect("every refresh is registered at spawn");
                    let symbol = company.symbol.clone();

                    match fetched {
                        Ok(details) => {
                            company.apply_details(details);
                            match self.store.update_company(company) {
                                Ok(()) => {
                                    report.refreshed += 1;
                                    info!(symbol = %symbol, "company details refreshed");
                                }
                                Err(error) => {
                                    warn!(symbol = %symbol, error = %error, "detail write failed");
                                    failures.push(UnitFailure {
                                        symbol,
                                        kind: WorkKind::Details,
                                        error: UnitError::Store(error),
                                    });
                                }
                            }
                        }
                        Err(error) => {
                            warn!(symbol = %symbol, error = %error, "detail fetch failed");
                            failures.push(UnitFailure {
                                symbol,
                                kind: WorkKind::Details,
                                error: UnitError::Download(error),
                            });
                        }
                    }
                }
                Err(join_error) => {
                    if let Some(company) = meta.remove(&join_error.id()) {
                        failures.push(UnitFailure {
                            symbol: company.symbol,
                            kind: WorkKind::Details,
                            error: UnitError::Task(join_error.to_string()),
                        });
                    }
                }
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(SyncError::PartialDetails { report, failures })
        }
    }
}
